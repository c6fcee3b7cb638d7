use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HostExecError>;

#[derive(Error, Debug)]
pub enum HostExecError {
    #[error("chroot directory does not exist or is not a directory: {}", path.display())]
    ChrootNotDirectory { path: PathBuf },

    #[error("failed to read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid search path entry: {0:?}")]
    InvalidSearchPath(String),
}
