//! Error taxonomy for the invocation core.
//!
//! Every variant is fatal for the current invocation; nothing here is retried.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The value handed to the materializer is not a record.
    #[error("target must be a record, found {found}")]
    Shape { found: &'static str },

    /// A scalar field's string could not be parsed into the field's kind.
    #[error("field '{field}': expected {expected}, got {got:?}")]
    Conversion {
        field: String,
        expected: &'static str,
        got: String,
    },

    /// A bag (top level or nested field) is not a JSON object of values.
    #[error("invalid argument bag for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown method '{name}'")]
    UnknownMethod { name: String },

    /// Malformed connection or endpoint string.
    #[error("malformed {what} '{input}': {reason}")]
    Format {
        what: &'static str,
        input: String,
        reason: &'static str,
    },

    #[error("remote call failed: {0}")]
    Invoke(String),

    #[error("cannot load schema artifact '{path}': {reason}")]
    Load { path: String, reason: String },
}

impl Error {
    pub(crate) fn load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn format(what: &'static str, input: &str, reason: &'static str) -> Self {
        Error::Format {
            what,
            input: input.to_string(),
            reason,
        }
    }
}
