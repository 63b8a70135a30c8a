use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid worker count: {0} (must be at least 1)")]
    InvalidWorkerCount(i64),

    #[error("too many workers: {requested} (at most {max})")]
    TooManyWorkers { requested: i64, max: i64 },

    #[error("repository path must not be empty")]
    EmptyPath,
}
