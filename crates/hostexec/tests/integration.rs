use anyhow::Result;
use hostexec::{
    CHROOT_PROGRAM, CancellationToken, CommandMap, ENV_HELPER, Executor, HostExec, HostExecConfig,
    HostExecError, SearchPath,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("hostexec=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone)]
struct Recorded {
    program: String,
    args: Vec<String>,
    ctx: Option<CancellationToken>,
}

/// Captures what would have been spawned.
#[derive(Debug, Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<Recorded>>,
}

impl RecordingExecutor {
    fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().expect("lock").clone()
    }
}

impl Executor for RecordingExecutor {
    type Cmd = Recorded;

    fn command(&self, program: &str, args: &[String]) -> Recorded {
        let rec = Recorded {
            program: program.to_string(),
            args: args.to_vec(),
            ctx: None,
        };
        self.calls.lock().expect("lock").push(rec.clone());
        rec
    }

    fn command_context(&self, ctx: CancellationToken, program: &str, args: &[String]) -> Recorded {
        let rec = Recorded {
            program: program.to_string(),
            args: args.to_vec(),
            ctx: Some(ctx),
        };
        self.calls.lock().expect("lock").push(rec.clone());
        rec
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn make_root(files: &[&str]) -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    for file in files {
        let path = dir.path().join(file.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, "")?;
    }
    Ok(dir)
}

fn root_str(dir: &tempfile::TempDir) -> String {
    dir.path().display().to_string()
}

#[test]
fn command_delegates_wrapped_invocation() -> Result<()> {
    init_tracing();
    let dir = make_root(&["/usr/bin/env"])?;
    let root = root_str(&dir);
    let recorder = Arc::new(RecordingExecutor::default());
    let map = CommandMap::new().with("mkfs", "mkfs.ext4");
    let host = HostExec::with_executor(Arc::clone(&recorder), map, &root)?;

    let cmd = host.command("mkfs", &strings(&["-F", "/dev/sdb"]));
    assert_eq!(cmd.program, CHROOT_PROGRAM);
    assert_eq!(
        cmd.args,
        vec![
            root,
            ENV_HELPER.to_string(),
            "-i".to_string(),
            format!("PATH={}", SearchPath::default().joined()),
            "mkfs.ext4".to_string(),
            "-F".to_string(),
            "/dev/sdb".to_string(),
        ]
    );
    assert!(cmd.ctx.is_none());
    assert_eq!(recorder.calls().len(), 1);
    Ok(())
}

#[test]
fn command_context_forwards_token_unchanged() -> Result<()> {
    init_tracing();
    let dir = make_root(&["/sbin/blkid"])?;
    let root = root_str(&dir);
    let recorder = Arc::new(RecordingExecutor::default());
    let host = HostExec::with_executor(Arc::clone(&recorder), CommandMap::new(), &root)?;

    let ctx = CancellationToken::new();
    let cmd = host.command_context(ctx.clone(), "blkid", &strings(&["-p"]));
    assert_eq!(cmd.program, CHROOT_PROGRAM);
    assert_eq!(cmd.args, vec![root, "/sbin/blkid".to_string(), "-p".to_string()]);

    let forwarded = cmd.ctx.expect("token forwarded");
    assert!(!forwarded.is_cancelled());
    ctx.cancel();
    assert!(forwarded.is_cancelled());
    Ok(())
}

#[test]
fn wrapper_without_chroot_only_pins_path() -> Result<()> {
    init_tracing();
    let recorder = RecordingExecutor::default();
    let host = HostExec::with_executor(recorder, CommandMap::new(), "")?;

    let cmd = host.command("/opt/bin/tool", &strings(&["--version"]));
    assert_eq!(cmd.program, "/opt/bin/tool");
    assert_eq!(cmd.args, strings(&["--version"]));
    assert_eq!(host.executor().calls().len(), 1);
    Ok(())
}

#[test]
fn config_drives_construction() -> Result<()> {
    init_tracing();
    let dir = make_root(&["/opt/tools/iscsiadm"])?;
    let root = root_str(&dir);
    let cfg_path = dir.path().join("hostexec.toml");
    std::fs::write(
        &cfg_path,
        format!(
            "chroot_dir = {root:?}\nsearch_path = [\"/opt/tools\"]\n\n[command_map]\niscsi = \"iscsiadm\"\n"
        ),
    )?;

    let cfg = HostExecConfig::load(&cfg_path)?;
    let host = HostExec::from_config_with_executor(RecordingExecutor::default(), &cfg)?;
    assert_eq!(host.chroot_dir(), Some(root.as_str()));

    let cmd = host.command("iscsi", &strings(&["-m", "node"]));
    assert_eq!(
        cmd.args,
        vec![root, "/opt/tools/iscsiadm".into(), "-m".into(), "node".into()]
    );
    Ok(())
}

#[test]
fn config_with_missing_chroot_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("gone");
    let cfg = HostExecConfig {
        chroot_dir: Some(missing.display().to_string()),
        ..HostExecConfig::default()
    };
    let err = HostExec::from_config(&cfg).expect_err("must fail");
    assert!(matches!(err, HostExecError::ChrootNotDirectory { .. }));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn process_executor_runs_wrapped_command() -> Result<()> {
    init_tracing();
    // sh must be reachable either through /usr/bin/env or the default search path
    let reachable = Path::new(ENV_HELPER).exists()
        || SearchPath::default()
            .iter()
            .any(|dir| Path::new(dir).join("sh").exists());
    if !reachable {
        eprintln!("skipping: no sh reachable on this host");
        return Ok(());
    }

    let host = HostExec::new(CommandMap::new().with("shell", "sh"), "")?;
    let output = host
        .command("shell", &strings(&["-c", "echo wrapped"]))
        .output()
        .await?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "wrapped");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn env_helper_replaces_caller_path() -> Result<()> {
    if !Path::new(ENV_HELPER).exists() {
        eprintln!("skipping: {ENV_HELPER} not present");
        return Ok(());
    }

    let host = HostExec::new(CommandMap::new(), "")?
        .with_search_path(SearchPath::new(["/usr/bin", "/bin"])?);
    let mut cmd = host.command("sh", &strings(&["-c", "echo $PATH"]));
    cmd.env("PATH", "/nonexistent");
    let output = cmd.output().await?;
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "/usr/bin:/bin");
    Ok(())
}
