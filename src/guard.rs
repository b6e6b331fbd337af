//! Idempotency guards
//!
//! A guard answers one question before a command step runs: is the work
//! already done? A satisfied guard means the step is skipped with no side
//! effect and no error. A probe that cannot even be spawned counts as
//! "not satisfied", so the action proceeds and fails (or succeeds) on its
//! own terms.

use std::fmt;
use std::path::PathBuf;

use crate::host::Host;

/// An idempotency precondition for a command step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Satisfied when a filesystem artifact exists at the path
    PathExists(PathBuf),
    /// Satisfied when the probe command exits zero
    ///
    /// Probes are not assumed side-effect free: the ring rebalance guard
    /// deliberately runs `swift-ring-builder ... rebalance` as its probe.
    ProbeSucceeds(String),
    /// Satisfied when any inner guard is satisfied
    AnyOf(Vec<Guard>),
}

impl Guard {
    /// Evaluate this guard against the host. `true` means "already done".
    pub fn is_satisfied<H: Host + ?Sized>(&self, host: &mut H) -> bool {
        match self {
            Self::PathExists(path) => host.path_exists(path),
            Self::ProbeSucceeds(command) => host.probe(command),
            Self::AnyOf(guards) => guards.iter().any(|g| g.is_satisfied(host)),
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathExists(path) => write!(f, "exists({})", path.display()),
            Self::ProbeSucceeds(command) => write!(f, "probe(`{}`)", command),
            Self::AnyOf(guards) => {
                write!(f, "any_of(")?;
                for (i, guard) in guards.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", guard)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use anyhow::Result;
    use std::collections::HashSet;
    use std::path::Path;

    /// Minimal host stub: a fake filesystem plus a set of passing probes.
    struct StubHost {
        files: HashSet<PathBuf>,
        passing_probes: HashSet<String>,
        probes_run: Vec<String>,
    }

    impl StubHost {
        fn new() -> Self {
            Self {
                files: HashSet::new(),
                passing_probes: HashSet::new(),
                probes_run: Vec::new(),
            }
        }
    }

    impl Host for StubHost {
        fn path_exists(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn package_installed(&self, _name: &str) -> bool {
            false
        }

        fn service_running(&self, _name: &str) -> bool {
            false
        }

        fn probe(&mut self, command: &str) -> bool {
            self.probes_run.push(command.to_string());
            self.passing_probes.contains(command)
        }

        fn run_command(&mut self, _command: &str, _cwd: Option<&Path>) -> Result<()> {
            unreachable!("guard evaluation must not run actions")
        }

        fn install_package(&mut self, _name: &str) -> Result<()> {
            unreachable!("guard evaluation must not run actions")
        }

        fn create_directory(
            &mut self,
            _path: &Path,
            _ownership: Option<&crate::types::Ownership>,
            _recursive: bool,
        ) -> Result<()> {
            unreachable!("guard evaluation must not run actions")
        }

        fn write_file(
            &mut self,
            _path: &Path,
            _contents: &str,
            _ownership: Option<&crate::types::Ownership>,
        ) -> Result<()> {
            unreachable!("guard evaluation must not run actions")
        }

        fn create_symlink(&mut self, _path: &Path, _target: &Path) -> Result<()> {
            unreachable!("guard evaluation must not run actions")
        }

        fn start_service(&mut self, _name: &str) -> Result<()> {
            unreachable!("guard evaluation must not run actions")
        }
    }

    #[test]
    fn test_path_exists_guard() {
        let mut host = StubHost::new();
        let guard = Guard::PathExists(PathBuf::from("/etc/swift/object.builder"));
        assert!(!guard.is_satisfied(&mut host));

        host.files.insert(PathBuf::from("/etc/swift/object.builder"));
        assert!(guard.is_satisfied(&mut host));
    }

    #[test]
    fn test_probe_guard() {
        let mut host = StubHost::new();
        let guard = Guard::ProbeSucceeds("grep swift-disk /etc/fstab".to_string());
        assert!(!guard.is_satisfied(&mut host));

        host.passing_probes
            .insert("grep swift-disk /etc/fstab".to_string());
        assert!(guard.is_satisfied(&mut host));
    }

    #[test]
    fn test_any_of_short_circuits() {
        let mut host = StubHost::new();
        host.files.insert(PathBuf::from("/etc/swift/object.ring.gz"));

        let guard = Guard::AnyOf(vec![
            Guard::PathExists(PathBuf::from("/etc/swift/object.ring.gz")),
            Guard::ProbeSucceeds("swift-ring-builder rebalance".to_string()),
        ]);
        assert!(guard.is_satisfied(&mut host));
        // First branch satisfied, probe never ran
        assert!(host.probes_run.is_empty());
    }

    #[test]
    fn test_any_of_falls_through() {
        let mut host = StubHost::new();
        let guard = Guard::AnyOf(vec![
            Guard::PathExists(PathBuf::from("/nope")),
            Guard::ProbeSucceeds("false".to_string()),
        ]);
        assert!(!guard.is_satisfied(&mut host));
        assert_eq!(host.probes_run, vec!["false".to_string()]);
    }

    #[test]
    fn test_guard_display() {
        let guard = Guard::AnyOf(vec![
            Guard::ProbeSucceeds("mountpoint /mnt/swift-disk".to_string()),
            Guard::PathExists(PathBuf::from("/tmp/.marker")),
        ]);
        assert_eq!(
            guard.to_string(),
            "any_of(probe(`mountpoint /mnt/swift-disk`), exists(/tmp/.marker))"
        );
    }
}
