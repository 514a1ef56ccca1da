//! Immutable capture of one intercepted operation.

use crate::receiver::{Callback, Outcome, Receiver};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct Record {
    name: String,
    args: Vec<Value>,
    callback: Option<Callback>,
}

impl Record {
    pub fn new(name: impl Into<String>, args: Vec<Value>, callback: Option<Callback>) -> Self {
        Self {
            name: name.into(),
            args,
            callback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn callback(&self) -> Option<&Callback> {
        self.callback.as_ref()
    }

    /// Send this operation to `receiver`, which need not be the target it was
    /// recorded against.
    pub fn apply(&self, receiver: &mut dyn Receiver) -> Outcome {
        receiver.send(&self.name, &self.args, self.callback.as_ref())
    }

    /// Log-friendly view; callbacks are opaque so only their presence shows.
    pub fn summary(&self) -> Value {
        json!({
            "name": self.name,
            "args": self.args,
            "has_callback": self.callback.is_some(),
        })
    }
}

/// Names and arguments compare structurally, callbacks by identity.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args && self.callback == other.callback
    }
}
