use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ReplError {
    /// Blank submissions are rejected before they reach the session.
    #[error("Input is empty")]
    EmptyInput,

    /// The evaluator could not be reached or answered without a usable body.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The evaluator answered with a shape we do not understand.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A well-formed error the evaluator chose to send. Displays as the bare message.
    #[error("{0}")]
    Evaluator(String),

    #[error("Completion prefix must be longer than 2 characters: '{0}'")]
    CompletionPrefixTooShort(String),

    #[error("Undefined command '{0}'")]
    UndefinedCommand(String),

    #[error("No input #{0} to recall")]
    NoSuchInput(usize),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReplResult<T> = Result<T, ReplError>;

impl ReplError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        ReplError::Transport(message.into())
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        ReplError::Protocol(message.into())
    }
}

impl From<reqwest::Error> for ReplError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ReplError::Protocol(err.to_string())
        } else {
            ReplError::Transport(err.to_string())
        }
    }
}
