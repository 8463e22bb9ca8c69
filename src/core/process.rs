//! Process supervisor for managed backend runtimes
//!
//! One process-wide table of child processes keyed by provider id. Start and
//! stop are idempotent per id; a failed spawn is reported to the caller and
//! logged, never fatal to the gateway.

use std::collections::HashMap;
use std::process::Stdio;

use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{error, info, warn};

/// Seconds to wait for a graceful exit before escalating to a kill
const STOP_GRACE_SECONDS: u64 = 5;

/// Tracks managed backend child processes
#[derive(Default)]
pub struct ProcessSupervisor {
    table: Mutex<HashMap<String, Child>>,
}

impl ProcessSupervisor {
    /// New supervisor with an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a child for `id` unless one is already alive.
    ///
    /// A dead entry is reaped and replaced. Returns false when the spawn
    /// fails.
    pub fn start_process(
        &self,
        id: &str,
        command: &str,
        args: &[String],
        cwd: Option<&str>,
        env: &HashMap<String, String>,
    ) -> bool {
        let mut table = self.table.lock();

        if let Some(child) = table.get_mut(id) {
            match child.try_wait() {
                Ok(None) => {
                    info!(provider = id, "process already running");
                    return true;
                }
                _ => {
                    table.remove(id);
                }
            }
        }

        info!(provider = id, command, ?args, "starting process");

        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        match cmd.spawn() {
            Ok(child) => {
                table.insert(id.to_string(), child);
                true
            }
            Err(e) => {
                error!(provider = id, error = %e, "failed to start process");
                false
            }
        }
    }

    /// Gracefully terminate the child for `id`, escalating to a kill after
    /// the grace period. No-op for unknown or already-exited ids.
    pub async fn stop_process(&self, id: &str) {
        let child = self.table.lock().remove(id);
        let Some(mut child) = child else {
            return;
        };

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }

        info!(provider = id, "stopping process");
        terminate(&mut child);

        match tokio::time::timeout(
            std::time::Duration::from_secs(STOP_GRACE_SECONDS),
            child.wait(),
        )
        .await
        {
            Ok(Ok(status)) => {
                info!(provider = id, %status, "process exited");
            }
            Ok(Err(e)) => {
                error!(provider = id, error = %e, "error waiting for process");
            }
            Err(_) => {
                warn!(provider = id, "process did not stop in time, killing");
                if let Err(e) = child.kill().await {
                    error!(provider = id, error = %e, "failed to kill process");
                }
            }
        }
    }

    /// Whether a tracked child for `id` is still alive.
    pub fn is_running(&self, id: &str) -> bool {
        let mut table = self.table.lock();
        match table.get_mut(id) {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        // SIGTERM first so the runtime can flush and release the GPU.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    } else {
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.start_kill();
}
