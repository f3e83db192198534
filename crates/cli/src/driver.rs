//! Skills phase: run the automation driver as a child process
//!
//! The payload goes over the child's stdin in one write; every line the
//! driver prints is relayed to our stdout. Ctrl-C is forwarded as SIGTERM
//! so the driver can close its browser session before exiting.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use sutr_common::DriverPayload;

use crate::error::CliError;
use crate::output;

/// File name of the driver executable
pub const DRIVER_BIN: &str = if cfg!(windows) {
    "sutr-driver.exe"
} else {
    "sutr-driver"
};

/// Locate the driver: explicit path, next to this executable, then `PATH`
pub fn locate(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DRIVER_BIN)));
    match sibling {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(DRIVER_BIN),
    }
}

pub struct DriverProcess {
    program: PathBuf,
    verbose: bool,
}

impl DriverProcess {
    pub fn new(program: PathBuf, verbose: bool) -> Self {
        Self { program, verbose }
    }

    /// Run one publish and map the driver's exit status
    pub async fn publish(&self, payload: &DriverPayload) -> anyhow::Result<()> {
        let bytes = payload.to_vec()?;

        let mut command = Command::new(&self.program);
        if self.verbose {
            command.arg("--verbose");
        }
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program.display()))?;
        debug!("Started driver (pid {:?})", child.id());

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&bytes).await?;
            stdin.shutdown().await?;
        }

        let relay = child.stdout.take().map(|stdout| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    output::print_relayed(&line);
                }
            })
        });

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping driver");
                terminate(&child);
                child.wait().await?
            }
        };

        if let Some(relay) = relay {
            let _ = relay.await;
        }
        check_status(status)
    }
}

fn check_status(status: ExitStatus) -> anyhow::Result<()> {
    if status.success() {
        return Ok(());
    }
    debug!("Driver exited with {}", status);
    Err(CliError::DeploymentFailed {
        code: status.code(),
    }
    .into())
}

#[cfg(unix)]
fn terminate(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!("Failed to signal driver: {}", e);
        }
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) {}
