//! Resolver controller configuration
//!
//! Values come from command-line flags with environment variable fallbacks,
//! so the same binary can be configured from a Deployment's `env` block.

use std::time::Duration;

use clap::Args;

use stratus_common::Error;

/// Default field manager for spec and status patches
pub const DEFAULT_FIELD_MANAGER: &str = "stratus-resolver";

/// Client read timeout the watch timeout has to stay below
pub const CLIENT_READ_TIMEOUT_SECS: u32 = 30;

/// Timing and identity of the reference resolution controllers
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Field manager recorded on patches
    #[arg(long, env = "STRATUS_FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    pub field_manager: String,

    /// Requeue interval after every reference resolved
    #[arg(long, env = "STRATUS_RESOLVED_REQUEUE_SECS", default_value_t = 300)]
    pub resolved_requeue_secs: u64,

    /// Requeue interval while a referenced resource is missing or not ready
    #[arg(long, env = "STRATUS_BLOCKED_REQUEUE_SECS", default_value_t = 15)]
    pub blocked_requeue_secs: u64,

    /// Requeue interval after a transient error
    #[arg(long, env = "STRATUS_ERROR_REQUEUE_SECS", default_value_t = 5)]
    pub error_requeue_secs: u64,

    /// Requeue interval after a configuration error such as a type mismatch
    #[arg(long, env = "STRATUS_PERMANENT_ERROR_REQUEUE_SECS", default_value_t = 300)]
    pub permanent_error_requeue_secs: u64,

    /// Server-side watch timeout
    #[arg(long, env = "STRATUS_WATCH_TIMEOUT_SECS", default_value_t = 25)]
    pub watch_timeout_secs: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            resolved_requeue_secs: 300,
            blocked_requeue_secs: 15,
            error_requeue_secs: 5,
            permanent_error_requeue_secs: 300,
            watch_timeout_secs: 25,
        }
    }
}

impl ResolverConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.field_manager.is_empty() {
            return Err(Error::validation_for_field(
                "resolver-config",
                "fieldManager",
                "field manager cannot be empty",
            ));
        }
        if self.watch_timeout_secs == 0 || self.watch_timeout_secs >= CLIENT_READ_TIMEOUT_SECS {
            return Err(Error::validation_for_field(
                "resolver-config",
                "watchTimeoutSecs",
                format!(
                    "watch timeout must be between 1 and {} seconds",
                    CLIENT_READ_TIMEOUT_SECS - 1
                ),
            ));
        }
        let intervals = [
            ("resolvedRequeueSecs", self.resolved_requeue_secs),
            ("blockedRequeueSecs", self.blocked_requeue_secs),
            ("errorRequeueSecs", self.error_requeue_secs),
            ("permanentErrorRequeueSecs", self.permanent_error_requeue_secs),
        ];
        for (field, secs) in intervals {
            if secs == 0 {
                return Err(Error::validation_for_field(
                    "resolver-config",
                    field,
                    "requeue interval must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Requeue interval after every reference resolved
    pub fn resolved_requeue(&self) -> Duration {
        Duration::from_secs(self.resolved_requeue_secs)
    }

    /// Requeue interval while references are blocked
    pub fn blocked_requeue(&self) -> Duration {
        Duration::from_secs(self.blocked_requeue_secs)
    }

    /// Requeue interval after a transient error
    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    /// Requeue interval after a configuration error
    pub fn permanent_error_requeue(&self) -> Duration {
        Duration::from_secs(self.permanent_error_requeue_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ResolverConfig,
    }

    #[test]
    fn flags_default_to_config_default() {
        let cli = TestCli::try_parse_from(["stratus"]).unwrap();
        assert_eq!(cli.config, ResolverConfig::default());
        assert!(cli.config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "stratus",
            "--blocked-requeue-secs",
            "30",
            "--field-manager",
            "ops",
        ])
        .unwrap();
        assert_eq!(cli.config.blocked_requeue(), Duration::from_secs(30));
        assert_eq!(cli.config.field_manager, "ops");
    }

    #[test]
    fn watch_timeout_must_stay_below_read_timeout() {
        let config = ResolverConfig {
            watch_timeout_secs: 30,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch timeout"));
    }

    #[test]
    fn zero_requeue_is_rejected() {
        let config = ResolverConfig {
            error_requeue_secs: 0,
            ..Default::default()
        };
        match config.validate().unwrap_err() {
            Error::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("errorRequeueSecs"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
