use crate::command_map::CommandMap;
use crate::config::HostExecConfig;
use crate::error::{HostExecError, Result};
use crate::executor::{Executor, ProcessExecutor};
use crate::search_path::SearchPath;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Environment helper used to pin `PATH` for unqualified commands.
pub const ENV_HELPER: &str = "/usr/bin/env";

/// Program that enters the target root. Addressed from the host namespace.
pub const CHROOT_PROGRAM: &str = "/usr/sbin/chroot";

/// Executor adapter that rewrites every command before handing it on.
///
/// Rewriting happens in three fixed steps:
/// 1. the logical name is replaced through the [`CommandMap`],
/// 2. unqualified names are pinned to the [`SearchPath`], either through
///    `/usr/bin/env -i PATH=...` or by probing for an absolute path,
/// 3. the result is wrapped in `/usr/sbin/chroot <root>` when a root is set.
///
/// Probes are plain existence checks made from the host side. A miss never
/// fails the call: the name is passed on unchanged and the target
/// environment gets to resolve it.
#[derive(Debug, Clone)]
pub struct HostExec<E = ProcessExecutor> {
    executor: E,
    command_map: CommandMap,
    chroot_dir: Option<String>,
    search_path: SearchPath,
}

impl HostExec<ProcessExecutor> {
    /// `chroot_dir` may be empty to disable chroot wrapping.
    pub fn new(command_map: CommandMap, chroot_dir: &str) -> Result<Self> {
        Self::with_executor(ProcessExecutor, command_map, chroot_dir)
    }

    pub fn from_config(config: &HostExecConfig) -> Result<Self> {
        Self::from_config_with_executor(ProcessExecutor, config)
    }
}

impl<E: Executor> HostExec<E> {
    pub fn with_executor(executor: E, command_map: CommandMap, chroot_dir: &str) -> Result<Self> {
        let chroot_dir = match chroot_dir {
            "" => None,
            dir => {
                ensure_directory(dir)?;
                Some(dir.to_string())
            }
        };

        info!(
            chroot_dir = chroot_dir.as_deref().unwrap_or(""),
            mapped_commands = command_map.len(),
            "host exec wrapper configured"
        );

        Ok(Self {
            executor,
            command_map,
            chroot_dir,
            search_path: SearchPath::default(),
        })
    }

    pub fn from_config_with_executor(executor: E, config: &HostExecConfig) -> Result<Self> {
        let search_path = config.search_path()?;
        let host = Self::with_executor(executor, config.command_map.clone(), config.chroot_dir())?;
        Ok(host.with_search_path(search_path))
    }

    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn command_map(&self) -> &CommandMap {
        &self.command_map
    }

    pub fn chroot_dir(&self) -> Option<&str> {
        self.chroot_dir.as_deref()
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Computes the program and arguments that will actually be spawned.
    pub fn wrap(&self, name: &str, args: &[String]) -> (String, Vec<String>) {
        let (name, args) = self.resolve_command(name, args.to_vec());
        let (name, args) = self.normalize_environment(name, args);
        self.apply_chroot(name, args)
    }

    /// Replaces a logical command name with its mapped target.
    pub fn resolve_command(&self, name: &str, args: Vec<String>) -> (String, Vec<String>) {
        match self.command_map.resolve(name) {
            Some(target) => {
                debug!(name, target, "command remapped");
                (target.to_string(), args)
            }
            None => (name.to_string(), args),
        }
    }

    /// Makes resolution of an unqualified name independent of the caller's `PATH`.
    ///
    /// Names containing `/` are explicit paths and are left alone.
    pub fn normalize_environment(&self, name: String, args: Vec<String>) -> (String, Vec<String>) {
        if name.contains('/') {
            return (name, args);
        }

        if self.exists_in_target(ENV_HELPER) {
            debug!(name = %name, helper = ENV_HELPER, "pinning PATH through env helper");
            let mut wrapped = Vec::with_capacity(args.len() + 3);
            wrapped.push("-i".to_string());
            wrapped.push(format!("PATH={}", self.search_path.joined()));
            wrapped.push(name);
            wrapped.extend(args);
            return (ENV_HELPER.to_string(), wrapped);
        }

        // Minimal images may ship without env; look the command up ourselves.
        // Any existing entry is a hit, directories included, like a plain stat.
        for candidate in self.search_path.candidates(&name) {
            if std::fs::metadata(self.host_path(&candidate)).is_ok() {
                debug!(
                    name = %name,
                    path = %candidate,
                    "env helper missing, found command on search path"
                );
                return (candidate, args);
            }
        }

        debug!(name = %name, "command not found on search path, passing through unqualified");
        (name, args)
    }

    /// Wraps the invocation in the chroot program when a root is configured.
    pub fn apply_chroot(&self, name: String, args: Vec<String>) -> (String, Vec<String>) {
        let Some(root) = &self.chroot_dir else {
            return (name, args);
        };

        debug!(root = %root, program = %name, "wrapping command in chroot");
        let mut wrapped = Vec::with_capacity(args.len() + 2);
        wrapped.push(root.clone());
        wrapped.push(name);
        wrapped.extend(args);
        (CHROOT_PROGRAM.to_string(), wrapped)
    }

    /// Host-side location of an absolute path as seen from inside the target root.
    fn host_path(&self, path: &str) -> String {
        match &self.chroot_dir {
            Some(root) => format!("{root}{path}"),
            None => path.to_string(),
        }
    }

    /// Only a definite "not found" counts as absent. Other stat failures mean
    /// the host cannot see clearly, so the helper is assumed present.
    fn exists_in_target(&self, path: &str) -> bool {
        match std::fs::metadata(self.host_path(path)) {
            Ok(_) => true,
            Err(err) => err.kind() != ErrorKind::NotFound,
        }
    }
}

impl<E: Executor> Executor for HostExec<E> {
    type Cmd = E::Cmd;

    fn command(&self, program: &str, args: &[String]) -> Self::Cmd {
        let (program, args) = self.wrap(program, args);
        self.executor.command(&program, &args)
    }

    fn command_context(
        &self,
        ctx: CancellationToken,
        program: &str,
        args: &[String],
    ) -> Self::Cmd {
        let (program, args) = self.wrap(program, args);
        self.executor.command_context(ctx, &program, &args)
    }
}

fn ensure_directory(dir: &str) -> Result<()> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(HostExecError::ChrootNotDirectory {
            path: PathBuf::from(dir),
        }),
    }
}
