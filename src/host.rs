//! host.rs - The queryable machine-state interface the executor works through.
//!
//! Guards and actions never touch the machine directly; they go through the
//! `Host` trait. `RealHost` shells out to the actual OS utilities, while the
//! tests substitute a mock host with a fake filesystem. This keeps guard
//! evaluation and the executor's skip logic fully testable without root.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;
use std::process::Command;

use crate::types::Ownership;

/// Queries and actions against the target machine.
///
/// Query methods take `&self`; actions take `&mut self`. `probe` is `&mut`
/// because probe commands are not assumed side-effect free (the ring
/// rebalance guard runs a real rebalance as its probe).
pub trait Host {
    /// Does a filesystem artifact exist at this path?
    fn path_exists(&self, path: &Path) -> bool;

    /// Is the named apt package installed?
    fn package_installed(&self, name: &str) -> bool;

    /// Is the named system service running?
    fn service_running(&self, name: &str) -> bool;

    /// Run a probe command; `true` means exit code zero. A probe that
    /// cannot be spawned counts as failed, never as an error.
    fn probe(&mut self, command: &str) -> bool;

    /// Run a shell command, failing on non-zero exit.
    fn run_command(&mut self, command: &str, cwd: Option<&Path>) -> Result<()>;

    /// Install an apt package.
    fn install_package(&mut self, name: &str) -> Result<()>;

    /// Create a directory, optionally with ownership and parents.
    fn create_directory(
        &mut self,
        path: &Path,
        ownership: Option<&Ownership>,
        recursive: bool,
    ) -> Result<()>;

    /// Write a file, optionally with ownership.
    fn write_file(&mut self, path: &Path, contents: &str, ownership: Option<&Ownership>)
        -> Result<()>;

    /// Create a symbolic link at `path` pointing to `target`.
    fn create_symlink(&mut self, path: &Path, target: &Path) -> Result<()>;

    /// Start a system service.
    fn start_service(&mut self, name: &str) -> Result<()>;
}

/// The real machine: every query and action shells out to OS utilities.
#[derive(Debug, Default)]
pub struct RealHost;

impl RealHost {
    pub fn new() -> Self {
        Self
    }

    /// Run `sh -c <command>` and return its output, failing only on spawn errors.
    fn shell(command: &str, cwd: Option<&Path>) -> std::io::Result<std::process::Output> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.output()
    }
}

impl Host for RealHost {
    fn path_exists(&self, path: &Path) -> bool {
        // symlink_metadata so dangling symlinks still count as "present"
        std::fs::symlink_metadata(path).is_ok()
    }

    fn package_installed(&self, name: &str) -> bool {
        Command::new("dpkg")
            .args(["-s", name])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn service_running(&self, name: &str) -> bool {
        Command::new("service")
            .args([name, "status"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn probe(&mut self, command: &str) -> bool {
        match Self::shell(command, None) {
            Ok(output) => {
                debug!("Probe `{}` exited {:?}", command, output.status.code());
                output.status.success()
            }
            Err(e) => {
                // Spawn failure means "guard not satisfied", the action proceeds
                debug!("Probe `{}` could not run: {}", command, e);
                false
            }
        }
    }

    fn run_command(&mut self, command: &str, cwd: Option<&Path>) -> Result<()> {
        debug!("Running `{}` (cwd={:?})", command, cwd);
        let output = Self::shell(command, cwd)
            .with_context(|| format!("Failed to spawn command: {}", command))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "`{}` failed (exit code {}): {}",
                command,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )
        }
    }

    fn install_package(&mut self, name: &str) -> Result<()> {
        info!("Installing package {}", name);
        let output = Command::new("apt-get")
            .args(["install", "-y", name])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .with_context(|| format!("Failed to spawn apt-get for package {}", name))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "apt-get install {} failed (exit code {}): {}",
                name,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )
        }
    }

    fn create_directory(
        &mut self,
        path: &Path,
        ownership: Option<&Ownership>,
        recursive: bool,
    ) -> Result<()> {
        if recursive {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory {:?}", path))?;
        } else {
            std::fs::create_dir(path)
                .with_context(|| format!("Failed to create directory {:?}", path))?;
        }
        if let Some(own) = ownership {
            chown(path, own)?;
        }
        Ok(())
    }

    fn write_file(
        &mut self,
        path: &Path,
        contents: &str,
        ownership: Option<&Ownership>,
    ) -> Result<()> {
        std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
        if let Some(own) = ownership {
            chown(path, own)?;
        }
        Ok(())
    }

    fn create_symlink(&mut self, path: &Path, target: &Path) -> Result<()> {
        std::os::unix::fs::symlink(target, path)
            .with_context(|| format!("Failed to link {:?} -> {:?}", path, target))
    }

    fn start_service(&mut self, name: &str) -> Result<()> {
        info!("Starting service {}", name);
        let output = Command::new("service")
            .args([name, "start"])
            .output()
            .with_context(|| format!("Failed to spawn service start for {}", name))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "service {} start failed (exit code {}): {}",
                name,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )
        }
    }
}

/// Apply owner:group to a path via chown(1).
fn chown(path: &Path, ownership: &Ownership) -> Result<()> {
    let output = Command::new("chown")
        .arg(ownership.to_string())
        .arg(path)
        .output()
        .with_context(|| format!("Failed to spawn chown for {:?}", path))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "chown {} {:?} failed: {}",
            ownership,
            path,
            stderr.trim()
        )
    }
}
