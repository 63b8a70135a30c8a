//! Foundation types for gitfetch.
//!
//! This crate provides the small vocabulary shared by every other gitfetch
//! crate: the registry, the dispatcher, and the command-line front end all
//! speak in terms of these types.
//!
//! # Key Types
//!
//! - [`RepositoryPath`] — Opaque identifier of a registered local repository
//! - [`WorkerCount`] — Validated worker pool size, between 1 and [`MAX_WORKERS`]
//! - [`JobId`] — Position of a fetch job within a single run

pub mod error;
pub mod job;
pub mod path;
pub mod workers;

pub use error::TypeError;
pub use job::JobId;
pub use path::RepositoryPath;
pub use workers::{WorkerCount, DEFAULT_WORKERS, MAX_WORKERS};
