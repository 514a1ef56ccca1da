//! Transparent recording wrapper around a shared target.

use crate::errors::CallError;
use crate::logging::emit_event;
use crate::receiver::{Callback, Outcome, Receiver, SharedTarget};
use crate::replay::ledger::{Ledger, LedgerOptions};
use crate::types::LogLevel;
use serde_json::{json, Value};

/// Records every operation sent to it, then forwards it to the current
/// target. It implements [`Receiver`] itself, so callers cannot tell it from
/// the target it stands in for.
pub struct Facade {
    ledger: Ledger,
}

impl Facade {
    /// `None` when `target` is already a recording facade.
    pub fn wrap(target: SharedTarget) -> Option<Self> {
        Self::wrap_with(target, LedgerOptions::default())
    }

    /// Also `None` when `target` is mutably borrowed: it is in the middle of
    /// handling a call and cannot be probed. The `facade.wrap_refused` event
    /// names which of the two applied.
    pub fn wrap_with(target: SharedTarget, options: LedgerOptions) -> Option<Self> {
        let refusal = match target.try_borrow() {
            Ok(t) if t.is_proxy() => Some("proxy"),
            Ok(_) => None,
            Err(_) => Some("busy"),
        };
        if let Some(reason) = refusal {
            emit_event(
                LogLevel::Info,
                "facade.wrap_refused",
                json!({ "reason": reason }),
            );
            return None;
        }
        emit_event(LogLevel::Debug, "facade.wrap", json!({}));
        Some(Self {
            ledger: Ledger::with_options(target, options),
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}

impl Receiver for Facade {
    fn send(&mut self, name: &str, args: &[Value], callback: Option<&Callback>) -> Outcome {
        self.ledger.record(name, args.to_vec(), callback.cloned());
        let mut target = self
            .ledger
            .target()
            .try_borrow_mut()
            .map_err(|_| CallError::TargetBusy)?;
        target.send(name, args, callback)
    }

    fn is_proxy(&self) -> bool {
        true
    }
}

/// Module-level shorthand for [`Facade::wrap`].
pub fn wrap(target: SharedTarget) -> Option<Facade> {
    Facade::wrap(target)
}
