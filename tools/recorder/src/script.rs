//! Session scripts: a stock target plus a list of steps driven through a
//! recording facade.
//!
//! Output follows the interactive check used for the rest of the CLI: when
//! stdin is a terminal each step prints as a padded `action  message` line,
//! otherwise as a `step=N action=.. message=..` line for tools reading it.
//!
//! ```toml
//! target = "null"
//!
//! [[step]]
//! action = "call"
//! name = "step3"
//! args = ["arg"]
//! callback = "step3_blk"
//!
//! [[step]]
//! action = "swap"
//! target = "checklist"
//!
//! [[step]]
//! action = "replay"
//! ```

use crate::config::RecorderConfig;
use crate::errors::RecorderError;
use crate::logging::structured_line;
use crate::receiver::{Callback, Outcome, Receiver};
use crate::replay::{Facade, LedgerOptions};
use crate::runtime::{FileSystem, Terminal};
use crate::targets;
use crate::types::TargetKind;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub target: TargetKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Send through the facade; recorded.
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
        /// Operation the trailing callback sends back to its receiver.
        #[serde(default)]
        callback: Option<String>,
    },
    /// Send to the raw target, bypassing the ledger.
    Direct {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Swap {
        target: TargetKind,
        #[serde(default)]
        text: Option<String>,
    },
    Replay,
    Reset,
    Records,
}

impl Script {
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, RecorderError> {
        let raw = fs.read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| RecorderError::Script(format!("{}: {e}", path.display())))
    }

    /// Record the three-step checklist against a null object, swap in a real
    /// checklist and replay onto it.
    pub fn demo() -> Self {
        Self {
            target: TargetKind::Null,
            text: None,
            steps: vec![
                Step::Call {
                    name: "step1".to_string(),
                    args: vec![],
                    callback: None,
                },
                Step::Call {
                    name: "step2".to_string(),
                    args: vec![json!("called")],
                    callback: None,
                },
                Step::Call {
                    name: "step3".to_string(),
                    args: vec![json!("arg")],
                    callback: Some("step3_blk".to_string()),
                },
                Step::Records,
                Step::Swap {
                    target: TargetKind::Checklist,
                    text: None,
                },
                Step::Replay,
                Step::Direct {
                    name: "completed".to_string(),
                    args: vec![],
                },
            ],
        }
    }

    pub fn with_target(mut self, target: TargetKind) -> Self {
        self.target = target;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub calls: usize,
    pub call_failures: usize,
    pub replays: usize,
    pub replay_failures: usize,
}

pub fn run_script(
    script: &Script,
    cfg: &RecorderConfig,
    terminal: &dyn Terminal,
) -> Result<ScriptReport, RecorderError> {
    let target = targets::build(script.target, script.text.as_deref());
    let mut facade = Facade::wrap_with(target, LedgerOptions::from(cfg)).ok_or_else(|| {
        RecorderError::Script(format!("target {} refused wrapping", script.target.as_str()))
    })?;
    let out = StepWriter {
        terminal,
        structured: !terminal.stdin_is_tty(),
    };
    let mut report = ScriptReport::default();

    for (index, step) in script.steps.iter().enumerate() {
        let step_no = index + 1;
        match step {
            Step::Call {
                name,
                args,
                callback,
            } => {
                let callback = callback.as_deref().map(Callback::forward);
                let outcome = facade.send(name, args, callback.as_ref());
                report.calls += 1;
                if outcome.is_err() {
                    report.call_failures += 1;
                }
                out.line(step_no, "call", &format!("{name} -> {}", describe(&outcome)))?;
            }
            Step::Direct { name, args } => {
                let target = facade.ledger().unwrap();
                let outcome = target
                    .try_borrow_mut()
                    .map_err(|_| RecorderError::TargetBusy)?
                    .send(name, args, None);
                out.line(step_no, "direct", &format!("{name} -> {}", describe(&outcome)))?;
            }
            Step::Swap { target, text } => {
                facade
                    .ledger_mut()
                    .wrap(targets::build(*target, text.as_deref()));
                out.line(
                    step_no,
                    "swap",
                    &format!(
                        "{} ({} records kept)",
                        target.as_str(),
                        facade.ledger().len()
                    ),
                )?;
            }
            Step::Replay => {
                let outcomes = facade.ledger().replay()?;
                let failures = outcomes.iter().filter(|o| o.is_err()).count();
                report.replays += 1;
                report.replay_failures += failures;
                out.line(
                    step_no,
                    "replay",
                    &format!("{} records, {failures} failed", outcomes.len()),
                )?;
                for (position, outcome) in outcomes.iter().enumerate() {
                    out.line(step_no, "replay", &format!("[{position}] {}", describe(outcome)))?;
                }
            }
            Step::Reset => {
                let discarded = facade.ledger().len();
                facade.ledger_mut().reset();
                out.line(step_no, "reset", &format!("{discarded} records discarded"))?;
            }
            Step::Records => {
                let records = facade.ledger().records();
                if records.is_empty() {
                    out.line(step_no, "records", "none")?;
                }
                for (position, record) in records.iter().enumerate() {
                    out.line(step_no, "records", &format!("[{position}] {}", record.summary()))?;
                }
            }
        }
    }

    Ok(report)
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Ok(value) => format!("ok {value}"),
        Err(error) => format!("error: {error}"),
    }
}

struct StepWriter<'a> {
    terminal: &'a dyn Terminal,
    structured: bool,
}

impl StepWriter<'_> {
    fn line(&self, step: usize, action: &str, message: &str) -> Result<(), RecorderError> {
        if self.structured {
            self.terminal.write_line(&structured_line(step, action, message))
        } else {
            self.terminal.write_line(&format!("{action:<8}{message}"))
        }
    }
}
