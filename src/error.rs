//! Unified error types for the LBC client.
//!
//! Every failure surfaces as an [`LbcError`]. Variants are fine-grained; use
//! [`LbcError::kind`] to get the coarse classification (transport vs.
//! pre-validation rejection vs. execution rejection, and so on).

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::keys::KeyError;

/// Top-level client error.
#[derive(Debug, Error)]
pub enum LbcError {
    /// Local key persistence or load failure
    #[error("Key store error: {0}")]
    Key(#[from] KeyError),

    /// Canonical serialization failure (a programming defect, never a remote condition)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Caller-supplied input was rejected before anything was signed or sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network or connection failure from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON-RPC error object returned by the node
    #[error("RPC error: {code} {message} ({data})")]
    Rpc {
        code: i64,
        message: String,
        data: String,
    },

    /// Non-JSON body with a non-success HTTP status
    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),

    /// Body could not be parsed as a JSON-RPC response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// JSON-RPC response carried neither an error nor a result
    #[error("empty result")]
    EmptyResult,

    /// Rejected by the node's pre-validation (CheckTx)
    #[error("CheckTx failed (code {code}): {log}")]
    ValidationRejected { code: u32, log: String },

    /// Accepted by CheckTx but rejected during execution (DeliverTx)
    #[error("DeliverTx failed (code {code}): {log}")]
    ExecutionRejected { code: u32, log: String },

    /// A query value could not be base64-decoded
    #[error("cannot base64-decode value: {reason}")]
    Decode { value: String, reason: String },
}

/// Result type alias for client operations.
pub type LbcResult<T> = Result<T, LbcError>;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyIo,
    Encoding,
    InvalidInput,
    Config,
    Transport,
    Timeout,
    EmptyResult,
    ValidationRejected,
    ExecutionRejected,
    Decode,
}

impl ErrorKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyIo => "key_io",
            Self::Encoding => "encoding",
            Self::InvalidInput => "invalid_input",
            Self::Config => "config",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::EmptyResult => "empty_result",
            Self::ValidationRejected => "validation_rejected",
            Self::ExecutionRejected => "execution_rejected",
            Self::Decode => "decode",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl LbcError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Key(_) => ErrorKind::KeyIo,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::Config,
            Self::Http(_) | Self::Rpc { .. } | Self::UnexpectedStatus(..) => ErrorKind::Transport,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::MalformedResponse(_) | Self::EmptyResult => ErrorKind::EmptyResult,
            Self::ValidationRejected { .. } => ErrorKind::ValidationRejected,
            Self::ExecutionRejected { .. } => ErrorKind::ExecutionRejected,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Whether the remote state machine rejected the transaction.
    ///
    /// Rejections are application-level outcomes, not local defects.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ValidationRejected | ErrorKind::ExecutionRejected
        )
    }
}
