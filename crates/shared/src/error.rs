use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ChainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NetworkMismatch,
    SubmissionFailure,
    ReadFailure,
    NotConnected,
    Unauthorized,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaoError {
    #[error("wrong network: expected chain id {expected}, wallet is on chain id {actual}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },
    #[error("transaction failed: {0}")]
    SubmissionFailure(String),
    #[error("read failed: {0}")]
    ReadFailure(String),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet exposes no signing account")]
    NoSigner,
    #[error("only the DAO owner may withdraw the treasury")]
    NotOwner,
    #[error("another action is still waiting for its transaction")]
    ActionInFlight,
}

impl DaoError {
    /// Alternate formatting keeps the full context chain of `anyhow` errors.
    pub fn read(err: impl std::fmt::Display) -> Self {
        Self::ReadFailure(format!("{err:#}"))
    }

    pub fn submission(err: impl std::fmt::Display) -> Self {
        Self::SubmissionFailure(format!("{err:#}"))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DaoError::NetworkMismatch { .. } => ErrorCode::NetworkMismatch,
            DaoError::SubmissionFailure(_) => ErrorCode::SubmissionFailure,
            DaoError::ReadFailure(_) => ErrorCode::ReadFailure,
            DaoError::NotConnected | DaoError::NoSigner => ErrorCode::NotConnected,
            DaoError::NotOwner => ErrorCode::Unauthorized,
            DaoError::ActionInFlight => ErrorCode::Busy,
        }
    }
}

/// Error payload attached to alerts so front-ends can show the cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&DaoError> for AlertPayload {
    fn from(value: &DaoError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
