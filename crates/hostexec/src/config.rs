use crate::command_map::CommandMap;
use crate::error::{HostExecError, Result};
use crate::search_path::SearchPath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File form of the wrapper settings.
///
/// ```toml
/// chroot_dir = "/host"
/// search_path = ["/usr/sbin", "/usr/bin"]
///
/// [command_map]
/// iscsiadm = "/usr/local/sbin/iscsiadm"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostExecConfig {
    pub command_map: CommandMap,
    pub chroot_dir: Option<String>,
    pub search_path: Option<Vec<String>>,
}

impl HostExecConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| HostExecError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&raw, path)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        parse(raw, Path::new("<inline>"))
    }

    /// Empty string and `None` both mean chroot wrapping is off.
    pub fn chroot_dir(&self) -> &str {
        self.chroot_dir.as_deref().unwrap_or("")
    }

    pub fn search_path(&self) -> Result<SearchPath> {
        match &self.search_path {
            Some(dirs) => SearchPath::new(dirs.iter().cloned()),
            None => Ok(SearchPath::default()),
        }
    }
}

fn parse(raw: &str, path: &Path) -> Result<HostExecConfig> {
    toml::from_str(raw).map_err(|source| HostExecError::ParseConfig {
        path: PathBuf::from(path),
        source,
    })
}
