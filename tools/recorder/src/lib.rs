//! Call-recording proxy.
//!
//! Wrap any [`receiver::Receiver`] in a [`replay::Facade`], send it
//! operations by name, and replay the captured sequence later, possibly
//! against a different target:
//!
//! ```
//! use recorder::receiver::{shared, Callback, Receiver};
//! use recorder::replay::wrap;
//! use recorder::targets::{Checklist, NullObject};
//! use serde_json::json;
//!
//! let mut facade = wrap(shared(NullObject)).expect("plain targets wrap");
//! facade.send("step1", &[], None).expect("null object accepts anything");
//! facade.send("step2", &[json!("called")], None).expect("accepted");
//! let cb = Callback::forward("step3_blk");
//! facade.send("step3", &[json!("arg")], Some(&cb)).expect("accepted");
//!
//! let checklist = shared(Checklist::new());
//! facade.ledger_mut().wrap(checklist.clone());
//! let outcomes = facade.ledger().replay().expect("target is free");
//! assert_eq!(outcomes.len(), 3);
//! assert!(checklist.borrow().completed());
//! ```
//!
//! Everything is single-threaded; the shared target handle is
//! `Rc<RefCell<..>>` and cannot cross threads.

pub mod config;
pub mod errors;
pub mod logging;
pub mod receiver;
pub mod replay;
pub mod runtime;
pub mod script;
pub mod targets;
pub mod types;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use config::{load_config, CliOverrides};
use errors::RecorderError;
use logging::{clear_event_log, init_event_log, JsonlLogger};
use runtime::ProductionRuntime;
use script::{run_script, Script};
use types::TargetKind;

pub const EXIT_REPLAY_FAILURES: i32 = 2;

#[derive(Debug, Clone, Parser)]
#[command(name = "recorder")]
#[command(about = "Record operations sent to a stock target and replay them")]
pub struct Cli {
    /// Session script (TOML). Runs the built-in demo when omitted.
    #[arg(long)]
    pub script: Option<std::path::PathBuf>,
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    /// Write JSONL events here; enables the event log.
    #[arg(long)]
    pub event_log: Option<std::path::PathBuf>,
    /// Replace the script's initial target.
    #[arg(long, value_enum)]
    pub target: Option<CliTarget>,
    /// Exit with status 2 when any replayed record failed.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliTarget {
    Checklist,
    Text,
    Null,
    Blank,
}

impl From<CliTarget> for TargetKind {
    fn from(value: CliTarget) -> Self {
        match value {
            CliTarget::Checklist => TargetKind::Checklist,
            CliTarget::Text => TargetKind::Text,
            CliTarget::Null => TargetKind::Null,
            CliTarget::Blank => TargetKind::Blank,
        }
    }
}

pub fn run() -> Result<i32, RecorderError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| RecorderError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &std::path::Path,
    runtime: &ProductionRuntime,
) -> Result<i32, RecorderError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(RecorderError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        event_log: cli.event_log.clone(),
    };
    let cfg = load_config(&overrides, runtime.file_system.as_ref())?;

    let mut script = match &cli.script {
        Some(path) => Script::load(runtime.file_system.as_ref(), path)?,
        None => Script::demo(),
    };
    if let Some(target) = cli.target {
        script = script.with_target(target.into());
    }

    if cfg.logging.enabled {
        init_event_log(JsonlLogger::from_config(&cfg.logging, cwd));
    }
    let result = run_script(&script, &cfg, runtime.terminal.as_ref());
    if cfg.logging.enabled {
        clear_event_log();
    }
    let report = result?;

    if cli.strict && report.replay_failures > 0 {
        return Ok(EXIT_REPLAY_FAILURES);
    }
    Ok(0)
}

pub fn render_help() -> String {
    Cli::command().render_long_help().to_string()
}
