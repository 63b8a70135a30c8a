use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};

pub const APP_NAME: &str = "gitfetch";

/// Where the registry document lives on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryLocation {
    file: PathBuf,
}

impl RegistryLocation {
    /// `$XDG_CONFIG_HOME/gitfetch/gitfetch.json`, or `~/.config/gitfetch/gitfetch.json`.
    pub fn from_env() -> RegistryResult<Self> {
        let base = dirs::config_dir().ok_or(RegistryError::NoConfigDir)?;
        Ok(Self::in_dir(base.join(APP_NAME)))
    }

    /// `<dir>/gitfetch.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(format!("{APP_NAME}.json")))
    }

    pub fn at(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn dir(&self) -> Option<&Path> {
        self.file.parent().filter(|p| !p.as_os_str().is_empty())
    }
}
