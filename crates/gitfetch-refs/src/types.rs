//! Core types produced by branch resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of every remote-tracking ref.
pub const REMOTES_PREFIX: &str = "refs/remotes/";

/// Prefix of every local branch ref.
pub const HEADS_PREFIX: &str = "refs/heads/";

/// A local branch together with the remote-tracking ref it follows.
///
/// Produced fresh for every fetch job and consumed immediately; never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchUpstreamPair {
    /// Short name of the local branch (e.g. "main").
    pub local_branch: String,
    /// Remote-tracking ref the branch follows (e.g. "refs/remotes/origin/main").
    pub upstream_ref: String,
    /// Name of the remote (e.g. "origin").
    pub remote: String,
    /// Ref on the remote side that the upstream mirrors (e.g. "refs/heads/main").
    pub remote_ref: String,
}

impl BranchUpstreamPair {
    /// Short name of the upstream (e.g. "origin/main").
    pub fn upstream_short_name(&self) -> &str {
        self.upstream_ref
            .strip_prefix(REMOTES_PREFIX)
            .unwrap_or(&self.upstream_ref)
    }

    /// Refspec fetching exactly this branch's upstream, forced so a rewritten
    /// remote branch still updates the tracking ref.
    pub fn refspec(&self) -> RefSpec {
        RefSpec {
            src: self.remote_ref.clone(),
            dst: self.upstream_ref.clone(),
            force: true,
        }
    }
}

impl fmt::Display for BranchUpstreamPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.local_branch, self.upstream_short_name())
    }
}

/// A refspec mapping a remote ref to a local one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpec {
    pub src: String,
    pub dst: String,
    pub force: bool,
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force {
            f.write_str("+")?;
        }
        write!(f, "{}:{}", self.src, self.dst)
    }
}
