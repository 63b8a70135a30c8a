use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed registry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is already registered")]
    AlreadyRegistered(String),

    #[error(transparent)]
    InvalidWorkers(#[from] gitfetch_types::TypeError),

    #[error("cannot determine the user configuration directory")]
    NoConfigDir,
}

pub type RegistryResult<T> = Result<T, RegistryError>;
