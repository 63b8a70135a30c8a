//! Error types for branch resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop resolution of a whole repository.
#[derive(Debug, Error)]
pub enum RefError {
    /// The repository's branch list or configuration could not be read.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// A single branch whose upstream could not be resolved.
///
/// Reported per branch; resolution of the remaining branches continues.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("branch {branch}: {reason}")]
pub struct UpstreamError {
    pub branch: String,
    pub reason: String,
}

impl UpstreamError {
    pub fn new(branch: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for resolution operations.
pub type Result<T> = std::result::Result<T, RefError>;
