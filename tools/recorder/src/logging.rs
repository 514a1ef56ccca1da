//! JSONL event log.
//!
//! One [`LogEvent`] per line. The process-wide slot follows the
//! `OnceLock<Mutex<Option<..>>>` pattern: emitting before [`init_event_log`]
//! (or after [`clear_event_log`]) is a no-op, and emission never fails the
//! caller.

use crate::config::LoggingConfig;
use crate::errors::RecorderError;
use crate::types::LogLevel;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

pub const DEFAULT_DISK_BUDGET_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub min_level: LogLevel,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub seq: u64,
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            min_level: LogLevel::Info,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
        }
    }

    /// `cwd` anchors a relative `cfg.path`.
    pub fn from_config(cfg: &LoggingConfig, cwd: &Path) -> Self {
        let path = if cfg.path.is_absolute() {
            cfg.path.clone()
        } else {
            cwd.join(&cfg.path)
        };
        Self {
            path,
            min_level: cfg.level,
            max_payload_bytes: cfg.max_payload_bytes,
            budget_bytes: cfg.budget_bytes,
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), RecorderError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| RecorderError::Io(e.to_string()))?;
        }
        let line = serde_json::to_string(&LogEvent {
            seq: event.seq,
            level: event.level,
            event_type: event.event_type,
            payload: summarize_payload(event.payload.clone(), self.max_payload_bytes),
        })
        .map_err(|e| RecorderError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RecorderError::Io(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| RecorderError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            let _ = enforce_total_budget(parent, &self.path, self.budget_bytes)?;
        }
        Ok(())
    }
}

/// Replace a payload that renders larger than `max_bytes` with its size and
/// a short sha256 prefix.
fn summarize_payload(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let hash = Sha256::digest(rendered.as_bytes());
    json!({
        "truncated": true,
        "bytes": rendered.len(),
        "sha256": hex_bytes(&hash[..8]),
    })
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Delete the oldest log files in `dir` until they fit in `budget_bytes`.
///
/// Only files that belong to `keep` count: same extension, with a name that
/// starts with its stem (`events.jsonl` owns `events.1.jsonl`). `keep` (the
/// live log) is never deleted.
pub fn enforce_total_budget(
    dir: &Path,
    keep: &Path,
    budget_bytes: u64,
) -> Result<Vec<PathBuf>, RecorderError> {
    let mut files = fs::read_dir(dir)
        .map_err(|e| RecorderError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && owned_by(path, keep))
        .collect::<Vec<_>>();

    files.sort_by_key(|path| fs::metadata(path).ok().and_then(|m| m.modified().ok()));

    let mut total = files
        .iter()
        .filter_map(|path| fs::metadata(path).ok().map(|meta| meta.len()))
        .sum::<u64>();

    let mut deleted = Vec::new();
    for path in files {
        if total <= budget_bytes {
            break;
        }
        if path == keep {
            continue;
        }
        let len = fs::metadata(&path)
            .map_err(|e| RecorderError::Io(e.to_string()))?
            .len();
        fs::remove_file(&path).map_err(|e| RecorderError::Io(e.to_string()))?;
        total = total.saturating_sub(len);
        deleted.push(path);
    }

    Ok(deleted)
}

fn owned_by(path: &Path, keep: &Path) -> bool {
    if path == keep {
        return true;
    }
    let (Some(stem), Some(name)) = (
        keep.file_stem().and_then(|s| s.to_str()),
        path.file_name().and_then(|s| s.to_str()),
    ) else {
        return false;
    };
    path.extension() == keep.extension() && name.starts_with(stem)
}

// ── Process-wide event log ────────────────────────────────────────────────────

static EVENT_LOG: OnceLock<Mutex<Option<Arc<JsonlLogger>>>> = OnceLock::new();
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

fn event_slot() -> MutexGuard<'static, Option<Arc<JsonlLogger>>> {
    let slot = EVENT_LOG.get_or_init(|| Mutex::new(None));
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub fn init_event_log(logger: JsonlLogger) {
    *event_slot() = Some(Arc::new(logger));
}

pub fn clear_event_log() {
    *event_slot() = None;
    EVENT_SEQ.store(1, Ordering::Relaxed);
}

pub fn event_log_active() -> bool {
    event_slot().is_some()
}

pub fn emit_event(level: LogLevel, event_type: &str, payload: Value) {
    let logger = {
        let guard = event_slot();
        match guard.as_ref() {
            Some(logger) if logger.enabled(level) => Arc::clone(logger),
            _ => return,
        }
    };
    let _ = logger.append(&LogEvent {
        seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
        level: level.as_str(),
        event_type,
        payload,
    });
}

pub fn structured_line(step: usize, action: &str, message: &str) -> String {
    format!(
        "step={step} action={action} message={}",
        message.replace('\n', "\\n")
    )
}
