// # Shell Command Executors
//
// This crate provides the platform command executors for the DDNS system.
//
// ## Platforms
//
// | Executor              | Invocation            | Host     |
// |-----------------------|-----------------------|----------|
// | `BashExecutor`        | `bash -c <command>`   | Linux    |
// | `ZshExecutor`         | `zsh -c <command>`    | macOS    |
// | `PowerShellExecutor`  | `powershell /C <cmd>` | Windows  |
//
// ## Termination
//
// Every run is bounded by a wall-clock timeout (5 seconds unless configured).
// On expiry the whole process tree is killed, not just the shell: on unix the
// shell is started as the leader of its own process group and the group is
// sent SIGKILL; on Windows `taskkill /T /F` walks the tree.

use ddns_core::ProviderRegistry;
use ddns_core::config::{ShellKind, SourceConfig};
use ddns_core::traits::{CommandExecutor, ExecutorFactory};
use ddns_core::{Error, Result};

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Default wall-clock bound for one command run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs commands with `bash -c`
#[derive(Debug, Clone)]
pub struct BashExecutor {
    timeout: Duration,
}

impl BashExecutor {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for BashExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for BashExecutor {
    async fn execute(&self, command: &str) -> Result<Vec<u8>> {
        run_shell("bash", "-c", command, self.timeout).await
    }

    fn shell_name(&self) -> &'static str {
        "bash"
    }
}

/// Runs commands with `zsh -c`
#[derive(Debug, Clone)]
pub struct ZshExecutor {
    timeout: Duration,
}

impl ZshExecutor {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ZshExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ZshExecutor {
    async fn execute(&self, command: &str) -> Result<Vec<u8>> {
        run_shell("zsh", "-c", command, self.timeout).await
    }

    fn shell_name(&self) -> &'static str {
        "zsh"
    }
}

/// Runs commands with `powershell /C`
#[derive(Debug, Clone)]
pub struct PowerShellExecutor {
    timeout: Duration,
}

impl PowerShellExecutor {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PowerShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for PowerShellExecutor {
    async fn execute(&self, command: &str) -> Result<Vec<u8>> {
        run_shell("powershell", "/C", command, self.timeout).await
    }

    fn shell_name(&self) -> &'static str {
        "powershell"
    }
}

/// Spawn `program flag command`, wait for it within `timeout` and return stdout
///
/// # Returns
///
/// - `Ok(Vec<u8>)`: Raw stdout of a successful run
/// - `Err(Error::Spawn)`: The shell could not be started or its pipes failed
/// - `Err(Error::NonZeroExit)`: The shell exited unsuccessfully
/// - `Err(Error::Timeout)`: The run exceeded `timeout`; the process tree was killed
async fn run_shell(program: &str, flag: &str, command: &str, timeout: Duration) -> Result<Vec<u8>> {
    let mut cmd = Command::new(program);
    cmd.arg(flag)
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // New process group led by the shell, so the tree can be killed at once
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|e| Error::spawn(command, e))?;
    let pid = child.id();
    debug!("Spawned {} (pid {:?}) for command: {}", program, pid, command);

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let run = async {
        tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
    };

    let finished = tokio::time::timeout(timeout, run).await;
    match finished {
        Ok(Ok((status, out, err))) => {
            if status.success() {
                Ok(out)
            } else {
                Err(Error::NonZeroExit {
                    command: command.to_string(),
                    code: status.code(),
                    stderr: String::from_utf8_lossy(&err).trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => Err(Error::spawn(command, e)),
        Err(_) => {
            warn!("Command timed out after {:?}, killing process tree: {}", timeout, command);
            terminate(&mut child, pid).await;
            Err(Error::timeout(command, timeout))
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill the child and every process it started
async fn terminate(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_tree(pid).await;
    }
    if let Err(e) = child.kill().await {
        debug!("Child already gone: {}", e);
    }
}

#[cfg(unix)]
async fn kill_tree(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    // The shell leads the group created at spawn
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!("killpg({}) failed: {}", raw, e);
    }
}

#[cfg(windows)]
async fn kill_tree(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        debug!("taskkill for pid {} failed: {}", pid, e);
    }
}

#[cfg(not(any(unix, windows)))]
async fn kill_tree(_pid: u32) {}

/// The executor for the platform this binary was built for, with the default timeout
pub fn host_executor() -> Box<dyn CommandExecutor> {
    executor_for(ShellKind::for_host(), DEFAULT_TIMEOUT)
}

fn executor_for(shell: ShellKind, timeout: Duration) -> Box<dyn CommandExecutor> {
    match shell {
        ShellKind::Bash => Box::new(BashExecutor::with_timeout(timeout)),
        ShellKind::Zsh => Box::new(ZshExecutor::with_timeout(timeout)),
        ShellKind::PowerShell => Box::new(PowerShellExecutor::with_timeout(timeout)),
    }
}

/// Factory for creating shell executors
pub struct ShellExecutorFactory {
    shell: ShellKind,
}

impl ShellExecutorFactory {
    pub fn new(shell: ShellKind) -> Self {
        Self { shell }
    }
}

impl ExecutorFactory for ShellExecutorFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn CommandExecutor>> {
        if config.timeout_secs == 0 {
            return Err(Error::config("Source command timeout must be > 0"));
        }
        Ok(executor_for(self.shell, config.timeout()))
    }
}

/// Register every shell executor with a registry
pub fn register(registry: &ProviderRegistry) {
    for shell in [ShellKind::Bash, ShellKind::Zsh, ShellKind::PowerShell] {
        registry.register_executor(shell.name(), Box::new(ShellExecutorFactory::new(shell)));
    }
}
