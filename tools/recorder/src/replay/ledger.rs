//! Ordered record store plus the current target, with best-effort replay.

use crate::config::{RecorderConfig, MAX_INITIAL_CAPACITY};
use crate::errors::RecorderError;
use crate::logging::emit_event;
use crate::receiver::{Callback, Outcome, SharedTarget};
use crate::replay::record::Record;
use crate::types::LogLevel;
use serde_json::{json, Value};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    pub initial_capacity: usize,
    pub log_failures: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self::from(&RecorderConfig::default())
    }
}

impl From<&RecorderConfig> for LedgerOptions {
    fn from(cfg: &RecorderConfig) -> Self {
        Self {
            initial_capacity: cfg.ledger.initial_capacity,
            log_failures: cfg.replay.log_failures,
        }
    }
}

pub struct Ledger {
    target: SharedTarget,
    records: Vec<Record>,
    options: LedgerOptions,
}

impl Ledger {
    pub fn new(target: SharedTarget) -> Self {
        Self::with_options(target, LedgerOptions::default())
    }

    pub fn with_options(target: SharedTarget, options: LedgerOptions) -> Self {
        Self {
            target,
            records: Vec::with_capacity(options.initial_capacity.min(MAX_INITIAL_CAPACITY)),
            options,
        }
    }

    pub fn record(&mut self, name: impl Into<String>, args: Vec<Value>, callback: Option<Callback>) {
        let record = Record::new(name, args, callback);
        emit_event(
            LogLevel::Debug,
            "ledger.record",
            json!({ "position": self.records.len(), "record": record.summary() }),
        );
        self.records.push(record);
    }

    pub fn target(&self) -> &SharedTarget {
        &self.target
    }

    /// A fresh handle to the current target; the ledger keeps its own.
    pub fn unwrap(&self) -> SharedTarget {
        Rc::clone(&self.target)
    }

    /// Swap the target. Records are kept so they can be replayed against it.
    pub fn wrap(&mut self, target: SharedTarget) {
        self.target = target;
        emit_event(
            LogLevel::Info,
            "ledger.wrap",
            json!({ "records": self.records.len() }),
        );
    }

    /// Apply every record, in order, to the current target.
    ///
    /// A failing record is captured in its slot and replay moves on, so the
    /// output always has one entry per record. The only error is the target
    /// being borrowed elsewhere, which happens when replay is started from
    /// inside a call on that same target.
    pub fn replay(&self) -> Result<Vec<Outcome>, RecorderError> {
        let mut target = self
            .target
            .try_borrow_mut()
            .map_err(|_| RecorderError::TargetBusy)?;

        let mut outcomes = Vec::with_capacity(self.records.len());
        let mut failures = 0usize;
        for (position, record) in self.records.iter().enumerate() {
            let outcome = record.apply(&mut *target);
            if let Err(error) = &outcome {
                failures += 1;
                if self.options.log_failures {
                    emit_event(
                        LogLevel::Warn,
                        "ledger.replay_failure",
                        json!({
                            "position": position,
                            "name": record.name(),
                            "error": error.to_string(),
                        }),
                    );
                }
            }
            outcomes.push(outcome);
        }

        emit_event(
            LogLevel::Info,
            "ledger.replay",
            json!({ "records": self.records.len(), "failures": failures }),
        );
        Ok(outcomes)
    }

    pub fn reset(&mut self) {
        let discarded = self.records.len();
        self.records.clear();
        emit_event(
            LogLevel::Info,
            "ledger.reset",
            json!({ "discarded": discarded }),
        );
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn messages(&self) -> &[Record] {
        self.records()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn options(&self) -> LedgerOptions {
        self.options
    }
}
