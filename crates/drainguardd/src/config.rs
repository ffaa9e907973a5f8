//! Environment configuration.
//!
//! The sidecar takes no command-line flags; everything comes from the
//! container environment. Only the metadata endpoint is required, and
//! the agent injects that one itself.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;

use drainguard_controller::{ConfirmPolicy, ControllerSettings, LifecycleSettings};
use drainguard_core::{parse_duration, GuardResult};

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "ECS_CONTAINER_METADATA_URI_V4")]
    pub metadata_endpoint: String,

    #[envconfig(from = "DRAINGUARD_WARMUP_DELAY", default = "60s")]
    pub warmup_delay: DurationSetting,

    #[envconfig(from = "DRAINGUARD_POLL_INTERVAL", default = "5s")]
    pub poll_interval: DurationSetting,

    #[envconfig(from = "DRAINGUARD_CONFIRM_ATTEMPTS", default = "5")]
    pub confirm_attempts: u32,

    #[envconfig(from = "DRAINGUARD_CONFIRM_INTERVAL", default = "2s")]
    pub confirm_interval: DurationSetting,

    // 0 disables the bound
    #[envconfig(from = "DRAINGUARD_CALL_TIMEOUT", default = "30s")]
    pub call_timeout: DurationSetting,

    #[envconfig(from = "DRAINGUARD_LOG_FORMAT", default = "text")]
    pub log_format: LogFormat,
}

impl Config {
    /// Build the lifecycle settings, rejecting values the loop cannot run with.
    pub fn lifecycle_settings(&self) -> GuardResult<LifecycleSettings> {
        let call_timeout = Some(self.call_timeout.0).filter(|d| !d.is_zero());

        let settings = LifecycleSettings {
            warmup: self.warmup_delay.0,
            controller: ControllerSettings {
                poll_interval: self.poll_interval.0,
                confirm: ConfirmPolicy {
                    max_attempts: self.confirm_attempts,
                    interval: self.confirm_interval.0,
                },
                call_timeout,
            },
        };
        settings.controller.validate()?;
        Ok(settings)
    }
}

/// A duration given as "5s", "500ms", "2m" or plain seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSetting(pub Duration);

impl FromStr for DurationSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
            .map(Self)
            .ok_or_else(|| format!("invalid duration: {s:?}"))
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}
