use std::sync::Arc;

use git2::{AutotagOption, FetchOptions, Repository};
use gitfetch_refs::{resolve_upstreams, BranchUpstreamPair};
use gitfetch_trust::{AgentNegotiator, CredentialNegotiator, StrictVerifier, TrustVerifier};
use gitfetch_types::RepositoryPath;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::transport::{classify_failure, remote_callbacks};
use crate::types::{BranchReport, BranchStatus, FetchFailure, RepoOutcome};

/// Runs the whole fetch job for one repository.
///
/// Called from a blocking worker thread. Implementations report every failure
/// through the returned outcome; nothing escapes as a panic or error.
pub trait RepoFetcher: Send + Sync + 'static {
    fn fetch_repository(&self, path: &RepositoryPath, cancel: &CancellationToken) -> RepoOutcome;
}

/// Tunables for a single fetch operation.
#[derive(Clone, Debug)]
pub struct FetchSettings {
    /// Fetch every tag the remote advertises, not only those reachable from
    /// fetched commits.
    pub download_tags: bool,
    /// Credential rounds allowed per connection before giving up.
    pub max_auth_rounds: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            download_tags: true,
            max_auth_rounds: 3,
        }
    }
}

/// [`RepoFetcher`] backed by git2.
pub struct GitFetcher {
    verifier: Arc<dyn TrustVerifier>,
    negotiator: Arc<dyn CredentialNegotiator>,
    settings: FetchSettings,
}

impl GitFetcher {
    pub fn new(
        verifier: Arc<dyn TrustVerifier>,
        negotiator: Arc<dyn CredentialNegotiator>,
        settings: FetchSettings,
    ) -> Self {
        Self { verifier, negotiator, settings }
    }

    /// Strict host verification with agent-backed SSH keys from the environment.
    pub fn from_env(settings: FetchSettings) -> Self {
        Self::new(
            Arc::new(StrictVerifier),
            Arc::new(AgentNegotiator::from_env()),
            settings,
        )
    }

    fn open(&self, path: &RepositoryPath) -> SyncResult<Repository> {
        Repository::open(path.as_path()).map_err(|e| SyncError::InvalidRepository {
            path: path.to_string(),
            reason: e.message().to_string(),
        })
    }

    fn sync(&self, repo: &Repository, cancel: &CancellationToken) -> SyncResult<RepoOutcome> {
        let mut branches = Vec::new();
        let mut unresolved = Vec::new();

        for item in resolve_upstreams(repo)? {
            let pair = match item {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(branch = %err.branch, reason = %err.reason, "skipping branch");
                    unresolved.push(err);
                    continue;
                }
            };
            let status = if cancel.is_cancelled() {
                BranchStatus::NotFetched(FetchFailure::Cancelled)
            } else {
                self.fetch_branch(repo, &pair, cancel)
            };
            debug!(%pair, ?status, "branch done");
            branches.push(BranchReport { pair, status });
        }

        Ok(RepoOutcome::Synced { branches, unresolved })
    }

    fn fetch_branch(
        &self,
        repo: &Repository,
        pair: &BranchUpstreamPair,
        cancel: &CancellationToken,
    ) -> BranchStatus {
        let before = repo.refname_to_id(&pair.upstream_ref).ok();

        let mut remote = match repo.find_remote(&pair.remote) {
            Ok(remote) => remote,
            Err(e) => return BranchStatus::NotFetched(FetchFailure::Transport(e.message().to_string())),
        };

        let mut options = FetchOptions::new();
        options.remote_callbacks(remote_callbacks(
            self.verifier.as_ref(),
            self.negotiator.as_ref(),
            self.settings.max_auth_rounds,
            cancel,
        ));
        options.download_tags(if self.settings.download_tags {
            AutotagOption::All
        } else {
            AutotagOption::Auto
        });

        let refspec = pair.refspec().to_string();
        if let Err(e) = remote.fetch(&[refspec.as_str()], Some(&mut options), None) {
            let failure = classify_failure(&e, cancel);
            warn!(%pair, error = %failure, "fetch failed");
            return BranchStatus::NotFetched(failure);
        }

        let after = repo.refname_to_id(&pair.upstream_ref).ok();
        match after {
            Some(new) if after != before => {
                info!(%pair, to = %new, "fetched");
                BranchStatus::Fetched
            }
            _ => BranchStatus::UpToDate,
        }
    }
}

impl RepoFetcher for GitFetcher {
    fn fetch_repository(&self, path: &RepositoryPath, cancel: &CancellationToken) -> RepoOutcome {
        info!(%path, "fetching");
        let repo = match self.open(path) {
            Ok(repo) => repo,
            Err(e) => {
                warn!(%path, error = %e, "invalid repository");
                return RepoOutcome::InvalidRepository { reason: e.to_string() };
            }
        };
        match self.sync(&repo, cancel) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%path, error = %e, "could not enumerate branches");
                RepoOutcome::Aborted { reason: e.to_string() }
            }
        }
    }
}
