use crate::errors::RecorderError;
use crate::logging::{DEFAULT_DISK_BUDGET_BYTES, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::runtime::FileSystem;
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound for `ledger.initial_capacity`; larger sessions still grow.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub event_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecorderConfig {
    pub ledger: LedgerConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    pub initial_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayConfig {
    pub log_failures: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub level: LogLevel,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig {
                initial_capacity: 16,
            },
            replay: ReplayConfig { log_failures: true },
            logging: LoggingConfig {
                enabled: false,
                path: PathBuf::from(".cache/recorder/events.jsonl"),
                level: LogLevel::Info,
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialRecorderConfig {
    ledger: Option<PartialLedgerConfig>,
    replay: Option<PartialReplayConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLedgerConfig {
    initial_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialReplayConfig {
    log_failures: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLoggingConfig {
    enabled: Option<bool>,
    path: Option<PathBuf>,
    level: Option<LogLevel>,
    max_payload_bytes: Option<usize>,
    budget_bytes: Option<u64>,
}

pub fn load_config(
    overrides: &CliOverrides,
    fs: &dyn FileSystem,
) -> Result<RecorderConfig, RecorderError> {
    let mut cfg = RecorderConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialRecorderConfig = toml::from_str(&file_contents)
            .map_err(|e| RecorderError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut RecorderConfig, partial: PartialRecorderConfig) {
    if let Some(ledger) = partial.ledger {
        if let Some(value) = ledger.initial_capacity {
            cfg.ledger.initial_capacity = value;
        }
    }

    if let Some(replay) = partial.replay {
        if let Some(value) = replay.log_failures {
            cfg.replay.log_failures = value;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.enabled {
            cfg.logging.enabled = value;
        }
        if let Some(value) = logging.path {
            cfg.logging.path = value;
        }
        if let Some(value) = logging.level {
            cfg.logging.level = value;
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
        if let Some(value) = logging.budget_bytes {
            cfg.logging.budget_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut RecorderConfig, overrides: &CliOverrides) {
    if let Some(path) = &overrides.event_log {
        cfg.logging.enabled = true;
        cfg.logging.path = path.clone();
    }
}

pub fn validate_config(cfg: &RecorderConfig) -> Result<(), RecorderError> {
    if cfg.ledger.initial_capacity > MAX_INITIAL_CAPACITY {
        return Err(RecorderError::InvalidConfig(format!(
            "ledger.initial_capacity must be at most {MAX_INITIAL_CAPACITY}"
        )));
    }
    if cfg.logging.max_payload_bytes == 0 {
        return Err(RecorderError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }
    if cfg.logging.budget_bytes == 0 {
        return Err(RecorderError::InvalidConfig(
            "logging.budget_bytes must be greater than zero".to_string(),
        ));
    }
    if cfg.logging.path.as_os_str().is_empty() {
        return Err(RecorderError::InvalidConfig(
            "logging.path must not be empty".to_string(),
        ));
    }
    Ok(())
}
