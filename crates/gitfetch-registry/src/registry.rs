use std::fs;

use gitfetch_types::{RepositoryPath, WorkerCount, DEFAULT_WORKERS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::location::RegistryLocation;

/// On-disk shape of the registry.
///
/// `workers` is kept as the raw integer from the file. A hand-edited value
/// outside `1..=MAX_WORKERS` is rejected when a run starts, not when the file is read, so
/// `list`, `add` and `remove` keep working on such a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    pub workers: i64,
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self { workers: DEFAULT_WORKERS, repositories: Vec::new() }
    }
}

/// A loaded registry. Changes stay in memory until [`Registry::save`].
#[derive(Debug)]
pub struct Registry {
    location: RegistryLocation,
    doc: RegistryDocument,
}

impl Registry {
    /// Load the registry, or start from defaults if the file does not exist yet.
    pub fn open(location: RegistryLocation) -> RegistryResult<Self> {
        let path = location.file();
        let doc = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no registry yet, using defaults");
                RegistryDocument::default()
            }
            Err(source) => return Err(RegistryError::Io { path: path.to_path_buf(), source }),
        };
        Ok(Self { location, doc })
    }

    pub fn location(&self) -> &RegistryLocation {
        &self.location
    }

    pub fn document(&self) -> &RegistryDocument {
        &self.doc
    }

    /// Registered repositories in registration order.
    pub fn list(&self) -> Vec<RepositoryPath> {
        self.doc.repositories.iter().map(|r| RepositoryPath::new(r.as_str())).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.repositories.is_empty()
    }

    pub fn contains(&self, path: &RepositoryPath) -> bool {
        self.doc.repositories.iter().any(|r| r == path.as_str())
    }

    /// Configured pool size, unvalidated.
    pub fn worker_count(&self) -> i64 {
        self.doc.workers
    }

    pub fn set_workers(&mut self, workers: i64) -> RegistryResult<WorkerCount> {
        let count = WorkerCount::try_from(workers)?;
        self.doc.workers = workers;
        Ok(count)
    }

    pub fn add(&mut self, path: RepositoryPath) -> RegistryResult<()> {
        if self.contains(&path) {
            return Err(RegistryError::AlreadyRegistered(path.into_inner()));
        }
        self.doc.repositories.push(path.into_inner());
        Ok(())
    }

    pub fn remove(&mut self, path: &RepositoryPath) -> RegistryResult<()> {
        let before = self.doc.repositories.len();
        self.doc.repositories.retain(|r| r != path.as_str());
        if self.doc.repositories.len() == before {
            return Err(RegistryError::NotFound(path.to_string()));
        }
        Ok(())
    }

    /// Drop every listed path that is registered. Returns how many were removed.
    pub fn prune<'a>(&mut self, paths: impl IntoIterator<Item = &'a RepositoryPath>) -> usize {
        let doomed: Vec<&str> = paths.into_iter().map(RepositoryPath::as_str).collect();
        let before = self.doc.repositories.len();
        self.doc.repositories.retain(|r| !doomed.contains(&r.as_str()));
        let removed = before - self.doc.repositories.len();
        if removed > 0 {
            info!(removed, "pruned invalid repositories");
        }
        removed
    }

    pub fn save(&self) -> RegistryResult<()> {
        let path = self.location.file();
        if let Some(dir) = self.location.dir() {
            create_private_dir(dir).map_err(|source| RegistryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(&self.doc).map_err(|source| {
            RegistryError::Parse { path: path.to_path_buf(), source }
        })?;
        fs::write(path, content + "\n")
            .map_err(|source| RegistryError::Io { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "registry saved");
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &std::path::Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, Registry) {
        let dir = tempfile::tempdir().unwrap();
        let reg = Registry::open(RegistryLocation::in_dir(dir.path().join("gitfetch"))).unwrap();
        (dir, reg)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let (_dir, reg) = fresh();
        assert_eq!(reg.worker_count(), 8);
        assert!(reg.list().is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn add_preserves_order_and_rejects_duplicates() {
        let (_dir, mut reg) = fresh();
        reg.add("/b".into()).unwrap();
        reg.add("/a".into()).unwrap();
        let err = reg.add("/b".into()).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(p) if p == "/b"));
        assert_eq!(reg.list(), vec![RepositoryPath::new("/b"), RepositoryPath::new("/a")]);
    }

    #[test]
    fn remove_absent_reports_not_found_and_changes_nothing() {
        let (_dir, mut reg) = fresh();
        reg.add("/a".into()).unwrap();
        let err = reg.remove(&"/missing".into()).unwrap_err();
        assert_eq!(err.to_string(), "/missing not found");
        assert_eq!(reg.list(), vec![RepositoryPath::new("/a")]);

        reg.remove(&"/a".into()).unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn set_workers_validates() {
        let (_dir, mut reg) = fresh();
        assert_eq!(reg.set_workers(3).unwrap().get(), 3);
        assert!(reg.set_workers(0).is_err());
        assert!(reg.set_workers(-4).is_err());
        assert!(matches!(
            reg.set_workers(i64::MAX),
            Err(RegistryError::InvalidWorkers(gitfetch_types::TypeError::TooManyWorkers { .. }))
        ));
        assert!(reg.set_workers(gitfetch_types::MAX_WORKERS + 1).is_err());
        assert_eq!(reg.worker_count(), 3);
    }

    #[test]
    fn prune_removes_only_listed() {
        let (_dir, mut reg) = fresh();
        for p in ["/a", "/b", "/c"] {
            reg.add(p.into()).unwrap();
        }
        let gone = vec![RepositoryPath::new("/b"), RepositoryPath::new("/zzz")];
        assert_eq!(reg.prune(&gone), 1);
        assert_eq!(reg.list(), vec![RepositoryPath::new("/a"), RepositoryPath::new("/c")]);
    }

    #[test]
    fn save_then_open_round_trips() {
        let (_dir, mut reg) = fresh();
        reg.add("/a".into()).unwrap();
        reg.set_workers(2).unwrap();
        reg.save().unwrap();

        let again = Registry::open(reg.location().clone()).unwrap();
        assert_eq!(again.document(), reg.document());
    }

    #[test]
    fn file_uses_plain_field_names() {
        let (_dir, mut reg) = fresh();
        reg.add("/a".into()).unwrap();
        reg.save().unwrap();

        let raw = fs::read_to_string(reg.location().file()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["workers"], 8);
        assert_eq!(value["repositories"][0], "/a");
    }

    #[cfg(unix)]
    #[test]
    fn save_creates_private_directory() {
        use std::os::unix::fs::PermissionsExt;
        let (dir, reg) = fresh();
        reg.save().unwrap();
        let mode = fs::metadata(dir.path().join("gitfetch")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn reads_compact_legacy_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gitfetch.json");
        fs::write(&file, r#"{"workers":4,"repositories":["/x","/y"]}"#).unwrap();

        let reg = Registry::open(RegistryLocation::at(&file)).unwrap();
        assert_eq!(reg.worker_count(), 4);
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn non_positive_workers_in_file_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gitfetch.json");
        fs::write(&file, r#"{"workers":0}"#).unwrap();

        let reg = Registry::open(RegistryLocation::at(&file)).unwrap();
        assert_eq!(reg.worker_count(), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gitfetch.json");
        fs::write(&file, "{not json").unwrap();
        assert!(matches!(
            Registry::open(RegistryLocation::at(&file)),
            Err(RegistryError::Parse { .. })
        ));
    }
}
