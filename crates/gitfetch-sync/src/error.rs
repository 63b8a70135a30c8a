use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid dispatcher configuration: {0}")]
    InvalidConfig(#[from] gitfetch_types::TypeError),

    #[error("cannot open repository {path}: {reason}")]
    InvalidRepository { path: String, reason: String },

    #[error("branch resolution error: {0}")]
    Refs(#[from] gitfetch_refs::RefError),
}

pub type SyncResult<T> = Result<T, SyncError>;
