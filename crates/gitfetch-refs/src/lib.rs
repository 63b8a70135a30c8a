//! Branch resolution for gitfetch.
//!
//! Before a repository is fetched, each of its local branches is mapped to the
//! remote-tracking ref it follows. Only those pairs are fetched: a branch with
//! no upstream, or whose upstream is another local branch, contributes nothing.
//!
//! # Modules
//!
//! - [`error`] — Error types for resolution
//! - [`types`] — [`BranchUpstreamPair`] and [`RefSpec`]
//! - [`resolver`] — The lazy [`UpstreamIter`] over a repository's branches

pub mod error;
pub mod resolver;
pub mod types;

pub use error::{RefError, Result, UpstreamError};
pub use resolver::{resolve_upstreams, UpstreamIter};
pub use types::{BranchUpstreamPair, RefSpec};
