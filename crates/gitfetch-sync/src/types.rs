use std::fmt;

use gitfetch_refs::{BranchUpstreamPair, UpstreamError};
use gitfetch_types::{JobId, RepositoryPath};
use serde::Serialize;

/// Why a single branch fetch did not complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum FetchFailure {
    /// The remote's certificate or host key was rejected.
    TrustRejected(String),
    /// Every credential round was declined or refused.
    AuthenticationFailed(String),
    /// The run was cancelled while this fetch was pending or in flight.
    Cancelled,
    /// Any other transport or repository error.
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrustRejected(r) => write!(f, "untrusted remote: {r}"),
            Self::AuthenticationFailed(r) => write!(f, "authentication failed: {r}"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Transport(r) => write!(f, "{r}"),
        }
    }
}

/// Result of fetching one tracked branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "snake_case")]
pub enum BranchStatus {
    /// The remote-tracking ref moved or was created.
    Fetched,
    /// Nothing new on the remote. Not an error.
    UpToDate,
    NotFetched(FetchFailure),
}

impl BranchStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NotFetched(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    pub pair: BranchUpstreamPair,
    pub status: BranchStatus,
}

/// Everything one fetch job produced for one repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepoOutcome {
    /// The repository opened; each tracked branch has its own status.
    ///
    /// A repository with no tracked branches is `Synced` with no reports.
    Synced {
        branches: Vec<BranchReport>,
        unresolved: Vec<UpstreamError>,
    },
    /// The path no longer opens as a repository. The caller should prune it.
    InvalidRepository { reason: String },
    /// The job died before it could report (e.g. a panic in the fetch task).
    Aborted { reason: String },
    /// Cancellation fired before the job started.
    NotAttempted,
}

/// User-facing summary of a [`RepoOutcome`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Fetched,
    UpToDate,
    NotFetched,
    InvalidRepository,
    NotAttempted,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        Self::Fetched,
        Self::UpToDate,
        Self::NotFetched,
        Self::InvalidRepository,
        Self::NotAttempted,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::UpToDate => "already up to date",
            Self::NotFetched => "not fetched",
            Self::InvalidRepository => "invalid repository",
            Self::NotAttempted => "not attempted",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl RepoOutcome {
    pub fn synced(branches: Vec<BranchReport>) -> Self {
        Self::Synced { branches, unresolved: Vec::new() }
    }

    /// Collapse into exactly one user-visible status.
    ///
    /// Any failed branch makes the repository "not fetched"; otherwise any
    /// moved ref makes it "fetched"; otherwise it is up to date.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Synced { branches, .. } => {
                if branches.iter().any(|b| b.status.is_failure()) {
                    OutcomeKind::NotFetched
                } else if branches.iter().any(|b| b.status == BranchStatus::Fetched) {
                    OutcomeKind::Fetched
                } else {
                    OutcomeKind::UpToDate
                }
            }
            Self::InvalidRepository { .. } => OutcomeKind::InvalidRepository,
            Self::Aborted { .. } => OutcomeKind::NotFetched,
            Self::NotAttempted => OutcomeKind::NotAttempted,
        }
    }

    /// Human-readable reason for a non-success outcome.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Synced { branches, .. } => branches.iter().find_map(|b| match &b.status {
                BranchStatus::NotFetched(failure) => Some(format!("{}: {failure}", b.pair)),
                _ => None,
            }),
            Self::InvalidRepository { reason } | Self::Aborted { reason } => Some(reason.clone()),
            Self::NotAttempted => None,
        }
    }

    /// Number of fetch operations the job actually performed.
    pub fn fetch_attempts(&self) -> usize {
        match self {
            Self::Synced { branches, .. } => branches
                .iter()
                .filter(|b| b.status != BranchStatus::NotFetched(FetchFailure::Cancelled))
                .count(),
            _ => 0,
        }
    }
}

/// Outcome of one job, tied back to the path it was submitted for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    #[serde(skip)]
    pub id: JobId,
    pub path: RepositoryPath,
    pub summary: OutcomeKind,
    #[serde(flatten)]
    pub outcome: RepoOutcome,
}

impl JobOutcome {
    pub fn new(id: JobId, path: RepositoryPath, outcome: RepoOutcome) -> Self {
        Self { id, path, summary: outcome.kind(), outcome }
    }
}

/// Every outcome of one fetch-all run: exactly one per submitted path.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FetchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl FetchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.summary == kind).count()
    }

    /// Paths that no longer open as repositories, for pruning from the registry.
    pub fn invalid_paths(&self) -> Vec<RepositoryPath> {
        self.outcomes
            .iter()
            .filter(|o| o.summary == OutcomeKind::InvalidRepository)
            .map(|o| o.path.clone())
            .collect()
    }

    pub fn outcome_for(&self, path: &str) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|o| o.path.as_str() == path)
    }
}
