//! Abstraction over external command execution.
//!
//! [`CommandRunner`] allows swapping the real system command execution
//! ([`SystemCommandRunner`]) with a mock in tests. This is necessary because
//! the application calls macOS CLI tools (networksetup, ifconfig, launchctl,
//! osascript) that are unavailable in CI or on other platforms. Injecting a
//! [`CommandRunner`] makes device detection and daemon management testable
//! without requiring the actual OS utilities.
//!
//! A runner never returns an error: a command that cannot be spawned at all
//! is reported as `exit_code = 1` with empty output, so that callers handle
//! "binary missing" and "command ran and failed" through the same degraded
//! path. The status indicator must keep polling whatever the state of the
//! underlying tools.

use std::process::Command;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Captured outcome of one external command invocation.
///
/// `combined_output` holds stdout and stderr merged into a single buffer;
/// the relative ordering of the two streams is not guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// stdout and stderr of the process, lossily decoded as UTF-8.
    pub combined_output: String,
    /// Raw process exit code. Spawn failures and signal deaths map to 1.
    pub exit_code: i32,
}

impl CommandResult {
    /// `true` when the command exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Result reported when the command could not be spawned at all.
    pub fn spawn_failure() -> Self {
        Self {
            combined_output: String::new(),
            exit_code: 1,
        }
    }
}

/// Trait for running external commands and capturing their output.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` with the given `args`, block until it exits, and return the
    /// captured [`CommandResult`]. Never fails: see [`CommandResult::spawn_failure`].
    fn run(&self, cmd: &str, args: Vec<String>) -> CommandResult;
}

/// Default implementation that delegates to [`std::process::Command`].
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, cmd: &str, args: Vec<String>) -> CommandResult {
        let output = match Command::new(cmd).args(&args).output() {
            Ok(output) => output,
            Err(e) => {
                debug!("Unable to spawn {}: {}", cmd, e);
                return CommandResult::spawn_failure();
            }
        };
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        CommandResult {
            combined_output: combined,
            exit_code: output.status.code().unwrap_or(1),
        }
    }
}

/// Run `cmd` on a background thread and deliver its [`CommandResult`] through
/// the returned channel.
///
/// Used for invocations that may block on user interaction (typically the
/// administrator-privileges prompt shown by osascript): the caller stays
/// responsive and picks up the outcome whenever it lands.
pub fn run_detached(
    runner: Arc<dyn CommandRunner>,
    cmd: &str,
    args: Vec<String>,
) -> mpsc::Receiver<CommandResult> {
    let (tx, rx) = mpsc::channel();
    let cmd = cmd.to_owned();
    thread::spawn(move || {
        let res = runner.run(&cmd, args);
        // Receiver may be gone if the caller lost interest; that is fine.
        let _ = tx.send(res);
    });
    rx
}


#[cfg(test)]
mod run_detached_should {
    use super::*;
    use test_log::test;

    #[test]
    fn deliver_result_through_channel() {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
        let rx = run_detached(runner, "/bin/sh", vec!["-c".into(), "echo hello".into()]);
        let res = rx.recv().expect("channel closed without a result");
        assert!(res.success());
        assert!(res.combined_output.contains("hello"));
    }
}
