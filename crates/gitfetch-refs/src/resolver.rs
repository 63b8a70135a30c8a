//! Lazy resolution of local branches to their remote-tracking upstreams.

use git2::{Branch, BranchType, Branches, Config, ErrorCode, Repository};
use tracing::{debug, trace};

use crate::error::{Result, UpstreamError};
use crate::types::{BranchUpstreamPair, HEADS_PREFIX, REMOTES_PREFIX};

/// Start resolving the upstreams of every local branch in `repo`.
///
/// The returned iterator is lazy and single-pass. Branches without an upstream,
/// and branches whose upstream is another local branch, are skipped without
/// producing an item. A branch with broken upstream configuration yields an
/// `Err` item and iteration continues with the next branch.
pub fn resolve_upstreams(repo: &Repository) -> Result<UpstreamIter<'_>> {
    Ok(UpstreamIter {
        repo,
        config: repo.config()?,
        branches: repo.branches(Some(BranchType::Local))?,
    })
}

/// Iterator over the [`BranchUpstreamPair`]s of one repository.
pub struct UpstreamIter<'repo> {
    repo: &'repo Repository,
    config: Config,
    branches: Branches<'repo>,
}

enum Step {
    Pair(BranchUpstreamPair),
    Skip { branch: String, why: &'static str },
    Failed(UpstreamError),
}

impl<'repo> UpstreamIter<'repo> {
    fn resolve(&self, branch: &Branch<'repo>) -> Step {
        let Some(refname) = branch.get().name() else {
            return Step::Failed(UpstreamError::new(
                String::from_utf8_lossy(branch.get().name_bytes()),
                "branch name is not valid UTF-8",
            ));
        };
        let short = refname.strip_prefix(HEADS_PREFIX).unwrap_or(refname);

        let remote_ref = match self.config.get_string(&format!("branch.{short}.merge")) {
            Ok(merge) => merge,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Step::Skip { branch: short.to_string(), why: "no upstream configured" };
            }
            Err(e) => return Step::Failed(UpstreamError::new(short, e.message())),
        };

        let upstream = match self.repo.branch_upstream_name(refname) {
            Ok(buf) => buf,
            Err(e) => return Step::Failed(UpstreamError::new(short, e.message())),
        };
        let Some(upstream_ref) = upstream.as_str() else {
            return Step::Failed(UpstreamError::new(short, "upstream name is not valid UTF-8"));
        };
        if !upstream_ref.starts_with(REMOTES_PREFIX) {
            return Step::Skip { branch: short.to_string(), why: "upstream is not a remote branch" };
        }

        let remote = match self.repo.branch_upstream_remote(refname) {
            Ok(buf) => match buf.as_str() {
                Some(r) => r.to_string(),
                None => {
                    return Step::Failed(UpstreamError::new(short, "remote name is not valid UTF-8"))
                }
            },
            Err(e) => return Step::Failed(UpstreamError::new(short, e.message())),
        };

        Step::Pair(BranchUpstreamPair {
            local_branch: short.to_string(),
            upstream_ref: upstream_ref.to_string(),
            remote,
            remote_ref,
        })
    }
}

impl<'repo> Iterator for UpstreamIter<'repo> {
    type Item = std::result::Result<BranchUpstreamPair, UpstreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let branch = match self.branches.next()? {
                Ok((branch, _)) => branch,
                Err(e) => return Some(Err(UpstreamError::new("<unknown>", e.message()))),
            };
            match self.resolve(&branch) {
                Step::Pair(pair) => {
                    trace!(%pair, "resolved upstream");
                    return Some(Ok(pair));
                }
                Step::Skip { branch, why } => trace!(%branch, why, "skipping branch"),
                Step::Failed(err) => {
                    debug!(error = %err, "upstream resolution failed");
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{RepositoryInitOptions, Signature};
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();
        {
            let sig = Signature::now("test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).unwrap();
        }
        (dir, repo)
    }

    fn branch(repo: &Repository, name: &str) {
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch(name, &head, false).unwrap();
    }

    fn track(repo: &Repository, branch: &str, remote: &str, merge: &str) {
        let mut cfg = repo.config().unwrap();
        cfg.set_str(&format!("branch.{branch}.remote"), remote).unwrap();
        cfg.set_str(&format!("branch.{branch}.merge"), merge).unwrap();
    }

    fn collect(repo: &Repository) -> (Vec<BranchUpstreamPair>, Vec<UpstreamError>) {
        let mut pairs = Vec::new();
        let mut errors = Vec::new();
        for item in resolve_upstreams(repo).unwrap() {
            match item {
                Ok(p) => pairs.push(p),
                Err(e) => errors.push(e),
            }
        }
        pairs.sort_by(|a, b| a.local_branch.cmp(&b.local_branch));
        (pairs, errors)
    }

    #[test]
    fn branch_without_upstream_yields_nothing() {
        let (_dir, repo) = init_repo();
        let (pairs, errors) = collect(&repo);
        assert!(pairs.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn remote_upstream_yields_pair() {
        let (_dir, repo) = init_repo();
        repo.remote("origin", "/nonexistent/origin.git").unwrap();
        track(&repo, "main", "origin", "refs/heads/main");

        let (pairs, errors) = collect(&repo);
        assert!(errors.is_empty());
        assert_eq!(
            pairs,
            vec![BranchUpstreamPair {
                local_branch: "main".into(),
                upstream_ref: "refs/remotes/origin/main".into(),
                remote: "origin".into(),
                remote_ref: "refs/heads/main".into(),
            }]
        );
    }

    #[test]
    fn merge_ref_name_may_differ_from_local_name() {
        let (_dir, repo) = init_repo();
        repo.remote("upstream", "/nonexistent/up.git").unwrap();
        branch(&repo, "work");
        track(&repo, "work", "upstream", "refs/heads/develop");

        let (pairs, _) = collect(&repo);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].upstream_ref, "refs/remotes/upstream/develop");
        assert_eq!(pairs[0].refspec().to_string(), "+refs/heads/develop:refs/remotes/upstream/develop");
    }

    #[test]
    fn local_upstream_is_skipped() {
        let (_dir, repo) = init_repo();
        branch(&repo, "feature");
        track(&repo, "feature", ".", "refs/heads/main");

        let (pairs, errors) = collect(&repo);
        assert!(pairs.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn dangling_upstream_reports_and_continues() {
        let (_dir, repo) = init_repo();
        repo.remote("origin", "/nonexistent/origin.git").unwrap();
        track(&repo, "main", "origin", "refs/heads/main");
        branch(&repo, "stale");
        track(&repo, "stale", "gone", "refs/heads/stale");

        let (pairs, errors) = collect(&repo);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].local_branch, "main");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].branch, "stale");
    }

    #[test]
    fn remote_tracking_branches_are_not_enumerated() {
        let (_dir, repo) = init_repo();
        let head = repo.head().unwrap().target().unwrap();
        repo.reference("refs/remotes/origin/main", head, true, "test").unwrap();

        let (pairs, errors) = collect(&repo);
        assert!(pairs.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn resolution_is_fresh_per_call() {
        let (_dir, repo) = init_repo();
        repo.remote("origin", "/nonexistent/origin.git").unwrap();
        assert!(collect(&repo).0.is_empty());

        track(&repo, "main", "origin", "refs/heads/main");
        assert_eq!(collect(&repo).0.len(), 1);
    }
}
