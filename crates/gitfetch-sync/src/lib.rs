//! Fetch engine for gitfetch.
//!
//! Synchronizes a set of registered local repositories with their remotes.
//! A [`FetchDispatcher`] fans jobs out across a fixed pool of workers; each
//! job resolves the repository's tracked branches and fetches them one by one
//! through git2, with every handshake routed through the trust verifier and
//! credential negotiator from `gitfetch-trust`.

pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod transport;
pub mod types;

pub use dispatcher::FetchDispatcher;
pub use error::{SyncError, SyncResult};
pub use fetcher::{FetchSettings, GitFetcher, RepoFetcher};
pub use types::{
    BranchReport, BranchStatus, FetchFailure, FetchReport, JobOutcome, OutcomeKind, RepoOutcome,
};

pub use tokio_util::sync::CancellationToken;
