//! Stock receivers used by session scripts and tests.

use crate::errors::CallError;
use crate::receiver::{Callback, Outcome, Receiver, SharedTarget};
use crate::types::TargetKind;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// `text` seeds a [`Text`] target and is ignored by the other kinds.
pub fn build(kind: TargetKind, text: Option<&str>) -> SharedTarget {
    match kind {
        TargetKind::Checklist => Rc::new(RefCell::new(Checklist::new())),
        TargetKind::Text => Rc::new(RefCell::new(Text::new(text.unwrap_or_default()))),
        TargetKind::Null => Rc::new(RefCell::new(NullObject)),
        TargetKind::Blank => Rc::new(RefCell::new(Blank)),
    }
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), CallError> {
    if args.len() != expected {
        return Err(CallError::arity(name, expected, args.len()));
    }
    Ok(())
}

fn string_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, CallError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| CallError::invalid_argument(name, format!("argument {index} must be a string")))
}

fn require_callback<'a>(name: &str, callback: Option<&'a Callback>) -> Result<&'a Callback, CallError> {
    callback.ok_or_else(|| CallError::MissingCallback(name.to_string()))
}

// ── Checklist ─────────────────────────────────────────────────────────────────

const CALLED: &str = "called";

/// Three-step workflow. `step2` and `step3` refuse to run before `step1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checklist {
    step1: Option<Value>,
    step2: Option<Value>,
    step3: Option<Value>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.step1 = None;
        self.step2 = None;
        self.step3 = None;
    }

    pub fn completed(&self) -> bool {
        [&self.step1, &self.step2, &self.step3]
            .into_iter()
            .all(|step| step.as_ref().and_then(Value::as_str) == Some(CALLED))
    }

    fn ensure_started(&self) -> Result<(), CallError> {
        if self.step1.as_ref().and_then(Value::as_str) != Some(CALLED) {
            return Err(CallError::failed("nope"));
        }
        Ok(())
    }
}

impl Receiver for Checklist {
    fn send(&mut self, name: &str, args: &[Value], callback: Option<&Callback>) -> Outcome {
        match name {
            "step1" => {
                expect_arity(name, args, 0)?;
                let value = json!(CALLED);
                self.step1 = Some(value.clone());
                Ok(value)
            }
            "step2" => {
                expect_arity(name, args, 1)?;
                self.ensure_started()?;
                self.step2 = Some(args[0].clone());
                Ok(args[0].clone())
            }
            "step3" => {
                expect_arity(name, args, 1)?;
                let callback = require_callback(name, callback)?;
                self.ensure_started()?;
                let value = callback.call(self, args)?;
                self.step3 = Some(value.clone());
                Ok(value)
            }
            "step3_blk" => {
                expect_arity(name, args, 0)?;
                Ok(json!(CALLED))
            }
            "name" => {
                expect_arity(name, args, 2)?;
                let callback = require_callback(name, callback)?;
                let yielded = callback.call(self, &args[1..])?;
                Ok(json!([args[0].clone(), yielded]))
            }
            "reset" => {
                expect_arity(name, args, 0)?;
                self.reset();
                Ok(Value::Null)
            }
            "completed" => {
                expect_arity(name, args, 0)?;
                Ok(json!(self.completed()))
            }
            _ => Err(CallError::NoSuchOperation(name.to_string())),
        }
    }
}

// ── Text ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    value: String,
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Receiver for Text {
    fn send(&mut self, name: &str, args: &[Value], _callback: Option<&Callback>) -> Outcome {
        match name {
            "split" => {
                let parts: Vec<&str> = match args {
                    [] => self.value.split_whitespace().collect(),
                    [_] => self.value.split(string_arg(name, args, 0)?).collect(),
                    _ => return Err(CallError::arity(name, 1, args.len())),
                };
                Ok(json!(parts))
            }
            "replace" => {
                expect_arity(name, args, 2)?;
                let from = string_arg(name, args, 0)?;
                let to = string_arg(name, args, 1)?;
                if from.is_empty() {
                    return Err(CallError::invalid_argument(name, "pattern must not be empty"));
                }
                Ok(json!(self.value.replace(from, to)))
            }
            "upcase" => {
                expect_arity(name, args, 0)?;
                Ok(json!(self.value.to_uppercase()))
            }
            "len" => {
                expect_arity(name, args, 0)?;
                Ok(json!(self.value.chars().count()))
            }
            "push_str" => {
                expect_arity(name, args, 1)?;
                self.value.push_str(string_arg(name, args, 0)?);
                Ok(json!(self.value.chars().count()))
            }
            "value" => {
                expect_arity(name, args, 0)?;
                Ok(json!(self.value))
            }
            _ => Err(CallError::NoSuchOperation(name.to_string())),
        }
    }
}

// ── NullObject / Blank ────────────────────────────────────────────────────────

/// Accepts every operation and answers `true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObject;

impl Receiver for NullObject {
    fn send(&mut self, _name: &str, _args: &[Value], _callback: Option<&Callback>) -> Outcome {
        Ok(Value::Bool(true))
    }
}

/// Has no operations at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blank;

impl Receiver for Blank {
    fn send(&mut self, name: &str, _args: &[Value], _callback: Option<&Callback>) -> Outcome {
        Err(CallError::NoSuchOperation(name.to_string()))
    }
}
