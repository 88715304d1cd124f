//! ProcessHost: spawn and lifetime of the external terminal emulator
//!
//! The child is an independent GUI process; the host never reads its
//! stdio. A watcher thread observes termination and posts exactly one
//! `ProcessExited` notification, whatever the cause: user closed the
//! window, crash, or host-initiated kill.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use termdock_utils::{Result, TermdockError};

use crate::events::{EventProxy, UiEvent};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A spawned terminal-emulator process owned by one panel
pub struct ProcessHost {
    pid: u32,
    executable: PathBuf,
    child: Arc<Mutex<Child>>,
}

impl ProcessHost {
    /// Validate the executable and spawn it with the given arguments.
    ///
    /// Launch failures (empty path, missing file, access denied) are fatal
    /// to panel creation and propagate to the caller; nothing is retried.
    /// `panel_id` tags the exit notification delivered through `events`.
    pub fn start(
        executable: &Path,
        args: &[String],
        panel_id: Uuid,
        events: EventProxy,
    ) -> Result<Self> {
        if executable.as_os_str().is_empty() {
            return Err(TermdockError::LaunchPathEmpty);
        }
        if !executable.exists() {
            return Err(TermdockError::LaunchMissing(executable.to_path_buf()));
        }

        let child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    TermdockError::LaunchMissing(executable.to_path_buf())
                }
                std::io::ErrorKind::PermissionDenied => {
                    TermdockError::LaunchDenied(executable.to_path_buf())
                }
                _ => TermdockError::ProcessSpawn(e.to_string()),
            })?;

        let pid = child.id();
        info!(pid, executable = %executable.display(), "terminal process started");

        let child = Arc::new(Mutex::new(child));
        let host = Self {
            pid,
            executable: executable.to_path_buf(),
            child,
        };

        if let Err(e) = spawn_exit_watcher(host.child.clone(), pid, panel_id, events) {
            host.close();
            return Err(TermdockError::internal(format!(
                "failed to spawn exit watcher: {}",
                e
            )));
        }

        Ok(host)
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Whether the process is still running
    pub fn is_running(&self) -> bool {
        matches!(self.child.lock().try_wait(), Ok(None))
    }

    /// Ask the process to close. A no-op if it has already exited; the exit
    /// notification still arrives through the watcher, exactly once.
    pub fn close(&self) {
        let mut child = self.child.lock();
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = self.pid, %status, "close requested but process already exited");
            }
            _ => {
                if let Err(e) = child.kill() {
                    debug!(pid = self.pid, "kill failed (process likely gone): {}", e);
                }
            }
        }
    }
}

impl Drop for ProcessHost {
    fn drop(&mut self) {
        self.close();
    }
}

/// Watch for child exit on a dedicated thread and notify the UI thread
/// once. The watcher holds only the shared child handle, so it keeps
/// running after the owning `ProcessHost` is dropped and still reports the
/// final exit.
fn spawn_exit_watcher(
    child: Arc<Mutex<Child>>,
    pid: u32,
    panel_id: Uuid,
    events: EventProxy,
) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name(format!("exit-watch-{}", pid))
        .spawn(move || {
            loop {
                match child.lock().try_wait() {
                    Ok(Some(status)) => {
                        info!(pid, %status, "terminal process exited");
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(pid, "failed to poll child process: {}", e);
                        break;
                    }
                }
                std::thread::sleep(EXIT_POLL_INTERVAL);
            }
            events.post(UiEvent::ProcessExited { panel_id });
        })
        .map(|_| ())
}
