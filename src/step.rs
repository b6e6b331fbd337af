//! Provisioning step data model
//!
//! A `Step` is one atomic, idempotent action against the target machine.
//! Steps carry only the fields their kind needs; the executor handles each
//! variant exhaustively. Command steps carry explicit guards; the other
//! kinds are implicitly guarded by the executor (directory exists, package
//! installed, service running, and so on).

use std::fmt;
use std::path::PathBuf;

use crate::guard::Guard;
use crate::types::Ownership;

/// A single atomic provisioning step in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run a shell command, skipped when any guard is already satisfied
    Command {
        /// Stable identifier used in logs (e.g. "create-sparse-file")
        id: String,
        command: String,
        cwd: Option<PathBuf>,
        guards: Vec<Guard>,
    },

    /// Ensure an apt package is installed
    Package { name: String },

    /// Ensure a directory exists
    Directory {
        path: PathBuf,
        ownership: Option<Ownership>,
        recursive: bool,
    },

    /// Materialize a static file, skipped when the target already exists
    FileCopy {
        path: PathBuf,
        contents: &'static str,
        ownership: Option<Ownership>,
    },

    /// Render a template to a target path, skipped when the target exists
    Template {
        path: PathBuf,
        template: &'static str,
        vars: Vec<(String, String)>,
        ownership: Option<Ownership>,
    },

    /// Ensure a symbolic link exists
    Link { path: PathBuf, target: PathBuf },

    /// Ensure a system service is running
    Service { name: String },
}

impl Step {
    /// Short identifier for logs and plan summaries.
    pub fn id(&self) -> String {
        match self {
            Self::Command { id, .. } => id.clone(),
            Self::Package { name } => format!("package:{}", name),
            Self::Directory { path, .. } => format!("directory:{}", path.display()),
            Self::FileCopy { path, .. } => format!("file:{}", path.display()),
            Self::Template { path, .. } => format!("template:{}", path.display()),
            Self::Link { path, .. } => format!("link:{}", path.display()),
            Self::Service { name } => format!("service:{}", name),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { id, command, cwd, guards } => {
                write!(f, "Command({}: `{}`", id, command)?;
                if let Some(dir) = cwd {
                    write!(f, ", cwd={}", dir.display())?;
                }
                if !guards.is_empty() {
                    write!(f, ", {} guard(s)", guards.len())?;
                }
                write!(f, ")")
            }
            Self::Package { name } => write!(f, "Package({})", name),
            Self::Directory { path, ownership, recursive } => {
                write!(f, "Directory({}", path.display())?;
                if let Some(own) = ownership {
                    write!(f, ", owner={}", own)?;
                }
                if *recursive {
                    write!(f, ", recursive")?;
                }
                write!(f, ")")
            }
            Self::FileCopy { path, .. } => write!(f, "FileCopy({})", path.display()),
            Self::Template { path, vars, .. } => {
                write!(f, "Template({}, {} var(s))", path.display(), vars.len())
            }
            Self::Link { path, target } => {
                write!(f, "Link({} -> {})", path.display(), target.display())
            }
            Self::Service { name } => write!(f, "Service({})", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        let step = Step::Link {
            path: PathBuf::from("/srv/node1/sdb1"),
            target: PathBuf::from("/mnt/swift-disk/sdb1"),
        };
        assert_eq!(step.to_string(), "Link(/srv/node1/sdb1 -> /mnt/swift-disk/sdb1)");

        let step = Step::Command {
            id: "mount".to_string(),
            command: "mount /mnt/swift-disk".to_string(),
            cwd: None,
            guards: vec![Guard::ProbeSucceeds("mountpoint /mnt/swift-disk".to_string())],
        };
        let text = step.to_string();
        assert!(text.contains("mount /mnt/swift-disk"));
        assert!(text.contains("1 guard(s)"));
    }

    #[test]
    fn test_step_ids() {
        let step = Step::Package {
            name: "memcached".to_string(),
        };
        assert_eq!(step.id(), "package:memcached");

        let step = Step::Service {
            name: "rsync".to_string(),
        };
        assert_eq!(step.id(), "service:rsync");
    }
}
