use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Logical command name to real command name or path.
///
/// Entries whose target is empty are kept but never applied, so a config file
/// can blank out a mapping without deleting the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandMap(BTreeMap<String, String>);

impl CommandMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.0.insert(name.into(), target.into());
        self
    }

    /// Returns the real command for `name`, if a non-empty mapping exists.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|target| !target.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CommandMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for CommandMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<HashMap<String, String>> for CommandMap {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
