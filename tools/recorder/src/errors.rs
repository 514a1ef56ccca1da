use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("target is already borrowed; re-entrant replay is not supported")]
    TargetBusy,
}

/// Failure raised by a receiver while handling an operation.
///
/// Forwarded calls hand these back to the caller untouched; replay captures
/// them in place of a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("undefined operation `{0}`")]
    NoSuchOperation(String),
    #[error("wrong number of arguments for `{name}` (given {got}, expected {expected})")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid argument for `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("no callback given for `{0}`")]
    MissingCallback(String),
    #[error("{0}")]
    Failed(String),
    #[error("target is already borrowed")]
    TargetBusy,
}

impl CallError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn arity(name: &str, expected: usize, got: usize) -> Self {
        Self::Arity {
            name: name.to_string(),
            expected,
            got,
        }
    }

    pub fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
