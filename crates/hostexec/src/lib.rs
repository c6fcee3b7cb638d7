//! Runs commands inside a target root filesystem with a predictable `PATH`.
//!
//! [`HostExec`] sits in front of an [`Executor`] and rewrites each
//! `(program, args)` pair before delegating, so callers can keep using stable
//! logical command names while the host layout differs from the target's.

pub mod command_map;
pub mod config;
pub mod error;
pub mod executor;
pub mod search_path;
pub mod wrapper;

pub use command_map::CommandMap;
pub use config::HostExecConfig;
pub use error::{HostExecError, Result};
pub use executor::{Executor, ProcessCommand, ProcessExecutor};
pub use search_path::{DEFAULT_SEARCH_PATH, SearchPath};
pub use tokio_util::sync::CancellationToken;
pub use wrapper::{CHROOT_PROGRAM, ENV_HELPER, HostExec};
