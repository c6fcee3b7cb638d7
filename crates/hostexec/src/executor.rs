use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// Something that can turn a program path and argument list into a runnable
/// command handle.
///
/// `command_context` ties the handle to a cancellation token; what cancellation
/// means for a running process is up to the implementation.
pub trait Executor: Send + Sync {
    type Cmd;

    fn command(&self, program: &str, args: &[String]) -> Self::Cmd;

    fn command_context(
        &self,
        ctx: CancellationToken,
        program: &str,
        args: &[String],
    ) -> Self::Cmd;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    type Cmd = E::Cmd;

    fn command(&self, program: &str, args: &[String]) -> Self::Cmd {
        (**self).command(program, args)
    }

    fn command_context(
        &self,
        ctx: CancellationToken,
        program: &str,
        args: &[String],
    ) -> Self::Cmd {
        (**self).command_context(ctx, program, args)
    }
}

/// Spawns real processes through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    type Cmd = ProcessCommand;

    fn command(&self, program: &str, args: &[String]) -> ProcessCommand {
        ProcessCommand::new(program, args, None)
    }

    fn command_context(
        &self,
        ctx: CancellationToken,
        program: &str,
        args: &[String],
    ) -> ProcessCommand {
        ProcessCommand::new(program, args, Some(ctx))
    }
}

/// A not-yet-started process.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
    env: Vec<(String, String)>,
    ctx: Option<CancellationToken>,
}

impl ProcessCommand {
    fn new(program: &str, args: &[String], ctx: Option<CancellationToken>) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            dir: None,
            env: Vec::new(),
            ctx,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.ctx.as_ref()
    }

    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a variable on top of the inherited environment.
    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Starts the process with inherited stdio. The child is killed when dropped.
    pub fn spawn(&self) -> io::Result<Child> {
        self.ensure_not_cancelled()?;
        self.build().spawn()
    }

    /// Runs to completion with captured stdout and stderr.
    pub async fn output(&self) -> io::Result<Output> {
        self.ensure_not_cancelled()?;
        let mut cmd = self.build();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let child = cmd.spawn()?;

        let Some(ctx) = &self.ctx else {
            return child.wait_with_output().await;
        };
        tokio::select! {
            output = child.wait_with_output() => output,
            // dropping the wait future drops the child, which kills it
            _ = ctx.cancelled() => Err(self.cancelled_error()),
        }
    }

    /// Runs to completion with inherited stdio.
    pub async fn run(&self) -> io::Result<ExitStatus> {
        let mut child = self.spawn()?;

        let Some(ctx) = &self.ctx else {
            return child.wait().await;
        };
        tokio::select! {
            status = child.wait() => return status,
            _ = ctx.cancelled() => {}
        }
        child.kill().await?;
        Err(self.cancelled_error())
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    fn ensure_not_cancelled(&self) -> io::Result<()> {
        match &self.ctx {
            Some(ctx) if ctx.is_cancelled() => Err(self.cancelled_error()),
            _ => Ok(()),
        }
    }

    fn cancelled_error(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::Interrupted,
            format!("command cancelled: {}", self.program),
        )
    }
}
