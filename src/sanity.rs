//! Pre-flight sanity checks for the runtime environment
//!
//! Verifies the target machine before any step runs:
//! - Base runtime binaries are present
//! - Running with root privileges (EUID 0)
//!
//! If any check fails, the program exits with a clear error message before
//! the plan executes.

use std::process::Command;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }
}

/// Binaries the plan needs before package installation has run
const REQUIRED_BINARIES: &[&str] = &[
    "sh",         // Shell for command steps and probes
    "apt-get",    // Package installation
    "truncate",   // Sparse disk file (coreutils)
    "grep",       // Idempotency probes
    "sed",        // rsync enablement
    "mountpoint", // Mount guard (util-linux)
];

/// Binaries the plan itself installs; warn if missing but don't fail
const OPTIONAL_BINARIES: &[&str] = &[
    "mkfs.xfs",           // xfsprogs, installed by the package steps
    "rsync",              // installed by the package steps
    "swift-ring-builder", // installed by the swift develop step
    "swift-init",         // installed by the swift develop step
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Perform all sanity checks and return the result
pub fn verify_environment() -> SanityCheckResult {
    let mut missing = Vec::new();

    for binary in REQUIRED_BINARIES {
        if !binary_exists(binary) {
            missing.push((*binary).to_string());
        }
    }

    for binary in OPTIONAL_BINARIES {
        if !binary_exists(binary) {
            log::debug!(
                "Optional binary not found: {} (installed later by the plan)",
                binary
            );
        }
    }

    SanityCheckResult {
        missing_binaries: missing,
        is_root: is_running_as_root(),
    }
}

/// Print an error message to stderr and exit.
/// Called before any step runs, so printing to stderr is safe.
pub fn print_error_and_exit(result: &SanityCheckResult) -> ! {
    eprintln!();
    eprintln!("saio-provision: pre-flight check failed");
    eprintln!();

    if !result.is_root {
        eprintln!("  Root privileges required.");
        eprintln!("  Provisioning installs packages, formats the loopback disk and");
        eprintln!("  starts services, all of which need EUID 0:");
        eprintln!("    sudo saio-provision provision");
        eprintln!();
    }

    if !result.missing_binaries.is_empty() {
        eprintln!("  Missing required binaries:");
        for binary in &result.missing_binaries {
            eprintln!("    - {}", binary);
        }
        eprintln!();
    }

    eprintln!("Fix the above issues and try again.");
    std::process::exit(1);
}

/// Skip root check (for development/testing).
/// Set SAIO_SKIP_ROOT_CHECK=1 to skip.
pub fn should_skip_root_check() -> bool {
    std::env::var("SAIO_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Main entry point: verify the environment and exit if checks fail
pub fn run_preflight_checks() {
    log::debug!("Running pre-flight sanity checks...");

    let mut result = verify_environment();

    if should_skip_root_check() {
        log::warn!("Root check skipped (SAIO_SKIP_ROOT_CHECK=1)");
        result.is_root = true;
    }

    if !result.is_ok() {
        print_error_and_exit(&result);
    }

    log::info!("Pre-flight checks passed");
}
