//! Stratus operator binary

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kube::Client;
use tracing::info;

use stratus_common::telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use stratus_resolver::{build_controllers, ResolverConfig};

mod crds;
mod offline;

/// Stratus - Azure managed resources with cross-resource references
#[derive(Parser, Debug)]
#[command(name = "stratus", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Log line format; JSON for the controller, text for offline commands
    #[arg(long, env = "STRATUS_LOG_FORMAT", global = true)]
    log_format: Option<LogFormatArg>,

    #[command(flatten)]
    resolver: ResolverConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the reference resolution controllers (default mode)
    ///
    /// Installs the Stratus CRDs, then watches every kind that carries
    /// referencers and writes resolved values into their specs.
    Controller,

    /// Resolve the references in a manifest without a cluster
    ///
    /// Prints the resolved resources as YAML on stdout and a report on
    /// stderr. Exits non-zero when a resource fails to resolve or validate.
    Resolve {
        /// Multi-document YAML file of managed resources
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Json,
    Text,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Text => LogFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        print!("{}", crds::crds_yaml()?);
        return Ok(());
    }

    let default_format = match cli.command {
        Some(Commands::Resolve { .. }) => LogFormat::Text,
        Some(Commands::Controller) | None => LogFormat::Json,
    };
    init_telemetry(TelemetryConfig {
        service_name: "stratus-operator".to_string(),
        format: cli.log_format.map(Into::into).unwrap_or(default_format),
    })?;

    match cli.command {
        Some(Commands::Resolve { file }) => run_offline(file).await,
        Some(Commands::Controller) | None => run_controller(cli.resolver).await,
    }
}

async fn run_controller(config: ResolverConfig) -> anyhow::Result<()> {
    config.validate()?;

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    crds::ensure_crds_installed(&client, &config.field_manager).await?;

    let controllers = build_controllers(client, config);
    info!(count = controllers.len(), "starting reference controllers");
    futures::future::join_all(controllers).await;

    info!("controllers stopped");
    Ok(())
}

async fn run_offline(file: PathBuf) -> anyhow::Result<()> {
    let yaml = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let run = offline::resolve_manifest(&yaml).await?;
    print!("{}", run.to_yaml()?);
    eprint!("{}", run.report());

    let failures = run.failures();
    if failures > 0 {
        anyhow::bail!("{failures} resource(s) failed to resolve or validate");
    }
    Ok(())
}
