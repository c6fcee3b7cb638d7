use crate::error::{HostExecError, Result};

/// Directories used for `PATH` when none is configured.
pub const DEFAULT_SEARCH_PATH: &[&str] = &[
    "/usr/local/sbin",
    "/usr/local/bin",
    "/usr/sbin",
    "/usr/bin",
    "/sbin",
    "/bin",
];

/// Ordered list of absolute directories.
///
/// Used both as the `PATH` handed to the spawned process and as the probe
/// order when the environment helper is unavailable. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<String>,
}

impl SearchPath {
    pub fn new<I, S>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for dir in dirs {
            let dir = dir.into();
            // ':' would split the entry in two once joined into PATH
            if !dir.starts_with('/') || dir.contains(':') {
                return Err(HostExecError::InvalidSearchPath(dir));
            }
            out.push(dir);
        }
        Ok(Self { dirs: out })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Colon-joined form suitable for a `PATH` value.
    pub fn joined(&self) -> String {
        self.dirs.join(":")
    }

    /// Candidate location of `name` in each directory, in search order.
    pub(crate) fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        self.iter()
            .map(move |dir| format!("{}/{name}", dir.trim_end_matches('/')))
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        Self {
            dirs: DEFAULT_SEARCH_PATH.iter().map(|d| d.to_string()).collect(),
        }
    }
}
