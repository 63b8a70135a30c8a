use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier of a local repository registered for fetching.
///
/// The string is stored exactly as the user registered it. Whether it still
/// names a valid repository is only known when a fetch job opens it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryPath(String);

impl RepositoryPath {
    /// Wrap a path string without validation.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Parse user input, rejecting empty or whitespace-only paths.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        if input.trim().is_empty() {
            return Err(TypeError::EmptyPath);
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepositoryPath({:?})", self.0)
    }
}

impl From<String> for RepositoryPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<Path> for RepositoryPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
