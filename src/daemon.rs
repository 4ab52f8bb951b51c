//! Control of the privileged launchd helper.
//!
//! The actual interface toggling is done by an external root daemon and a
//! shell script; this module only checks on them, restarts the daemon and
//! fires the script through the osascript administrator-privileges prompt.
//! Nothing here propagates errors: failed management commands are logged and
//! the next poll reports whatever state the system ended up in.

use crate::command::{run_detached, CommandRunner};
use crate::config::HelperConfig;
use std::fmt;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

const LAUNCHCTL: &str = "/bin/launchctl";
const OSASCRIPT: &str = "/usr/bin/osascript";

/// Why the toggle script cannot be invoked.
///
/// These are diagnosed before prompting for privileges; they are logged by
/// [`DaemonController::run_toggle_script`] rather than surfaced to callers.
#[derive(Debug, Error)]
pub enum ToggleError {
    /// The script path does not exist (or is not a regular file).
    #[error("toggle script {0} is missing")]
    ScriptMissing(PathBuf),
    /// The script exists but has no execute bit set.
    #[error("toggle script {0} is not executable")]
    ScriptNotExecutable(PathBuf),
}

/// Manages the privileged helper daemon and its toggle script.
pub struct DaemonController {
    runner: Arc<dyn CommandRunner>,
    helper: HelperConfig,
}

impl fmt::Debug for DaemonController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonController")
            .field("helper", &self.helper)
            .finish()
    }
}

impl DaemonController {
    /// Create a controller for the helper described by `helper`.
    pub fn new(runner: Arc<dyn CommandRunner>, helper: HelperConfig) -> Self {
        Self { runner, helper }
    }

    /// `true` when launchctl knows the service. Only the exit code matters,
    /// the printed service description is ignored.
    pub fn is_daemon_running(&self) -> bool {
        let res = self.runner.run(
            LAUNCHCTL,
            vec!["print".into(), format!("system/{}", self.helper.service_id)],
        );
        res.success()
    }

    /// Best-effort restart of the helper daemon.
    ///
    /// Runs bootout, bootstrap and kickstart in sequence. All three always
    /// run to completion: bootout failing because the service was not loaded
    /// must not keep the daemon from being bootstrapped afterwards.
    pub fn restart_daemon(&self) {
        let plist = self.helper.plist_path.display().to_string();
        let target = format!("system/{}", self.helper.service_id);
        let steps: [Vec<String>; 3] = [
            vec!["bootout".into(), "system".into(), plist.clone()],
            vec!["bootstrap".into(), "system".into(), plist],
            vec!["kickstart".into(), "-k".into(), target],
        ];
        for step in steps {
            let label = step[0].clone();
            let res = self.runner.run(LAUNCHCTL, step);
            if res.success() {
                debug!("launchctl {} succeeded", label);
            } else {
                warn!(
                    "launchctl {} failed with code {}: {}",
                    label,
                    res.exit_code,
                    res.combined_output.trim()
                );
            }
        }
    }

    /// Check that the toggle script is present and executable.
    pub fn toggle_script_ready(&self) -> Result<(), ToggleError> {
        let path = &self.helper.script_path;
        let meta = fs::metadata(path).map_err(|_| ToggleError::ScriptMissing(path.clone()))?;
        if !meta.is_file() {
            return Err(ToggleError::ScriptMissing(path.clone()));
        }
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(ToggleError::ScriptNotExecutable(path.clone()));
        }
        Ok(())
    }

    /// Run the toggle script under administrator privileges.
    ///
    /// osascript blocks on the interactive authentication prompt, so the
    /// invocation happens on a background thread; the returned channel
    /// eventually yields a bare success boolean. A missing or non-executable
    /// script is logged and completes with `false` without prompting.
    pub fn run_toggle_script(&self) -> mpsc::Receiver<bool> {
        let (tx, rx) = mpsc::channel();
        if let Err(e) = self.toggle_script_ready() {
            warn!("{}", e);
            let _ = tx.send(false);
            return rx;
        }
        let snippet = format!(
            "do shell script \"{} --verbose\" with administrator privileges",
            self.helper.script_path.display()
        );
        info!("Running toggle script through osascript");
        let results = run_detached(
            Arc::clone(&self.runner),
            OSASCRIPT,
            vec!["-e".into(), snippet],
        );
        thread::spawn(move || {
            let ok = results.recv().map(|r| r.success()).unwrap_or(false);
            if !ok {
                warn!("Toggle script failed or was declined");
            }
            let _ = tx.send(ok);
        });
        rx
    }

    /// Last `n` lines of the helper's log file, oldest first.
    ///
    /// The log is owned and appended by the external script; a missing or
    /// unreadable file simply reads as empty.
    pub fn tail_log(&self, n: usize) -> Vec<String> {
        let text = match fs::read_to_string(&self.helper.log_path) {
            Ok(text) => text,
            Err(_) => return Vec::new(),
        };
        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        let skip = lines.len().saturating_sub(n);
        lines.into_iter().skip(skip).collect()
    }
}
