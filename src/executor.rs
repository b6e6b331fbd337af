//! Step executor
//!
//! Applies a `ProvisionPlan` to a `Host`, strictly in order, single-threaded.
//! Each step's guard is evaluated first; a satisfied guard skips the step
//! with no side effect. The first action failure aborts the whole run with
//! the underlying tool's error in the chain. There is no rollback and no
//! retry: recovery is "fix the environment and re-run", and the guards make
//! the re-run converge.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::engine::plan::ProvisionPlan;
use crate::host::Host;
use crate::step::Step;
use crate::template::render;

/// What a run did: which steps acted and which were already satisfied.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Step ids that performed their action
    pub executed: Vec<String>,
    /// Step ids skipped because their guard was satisfied
    pub skipped: Vec<String>,
}

impl ExecutionReport {
    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Sequential, fail-fast plan executor.
#[derive(Debug, Default)]
pub struct StepExecutor {
    /// Evaluate guards and log actions without performing them
    pub dry_run: bool,
}

impl StepExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Execute every step of the plan in order.
    ///
    /// Returns the report on success; the error of the first failing action
    /// otherwise, with no further steps attempted.
    pub fn execute<H: Host>(&self, plan: &ProvisionPlan, host: &mut H) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        info!(
            "Executing provision plan ({} steps{})",
            plan.steps.len(),
            if self.dry_run { ", dry-run" } else { "" }
        );

        for step in &plan.steps {
            if self.already_satisfied(step, host) {
                debug!("Skipping {} (already done)", step);
                report.skipped.push(step.id());
                continue;
            }

            if self.dry_run {
                info!("[dry-run] would run {}", step);
                report.executed.push(step.id());
                continue;
            }

            info!("Applying {}", step);
            self.apply(step, host)
                .with_context(|| format!("Step {} failed", step.id()))?;
            report.executed.push(step.id());
        }

        info!(
            "Plan complete: {} executed, {} skipped",
            report.executed_count(),
            report.skipped_count()
        );
        Ok(report)
    }

    /// Evaluate the idempotency guard for a step. Command steps carry
    /// explicit guards; every other kind is guarded by the host query that
    /// matches its action.
    fn already_satisfied<H: Host>(&self, step: &Step, host: &mut H) -> bool {
        match step {
            Step::Command { guards, .. } => guards.iter().any(|g| g.is_satisfied(host)),
            Step::Package { name } => host.package_installed(name),
            Step::Directory { path, .. } => host.path_exists(path),
            Step::FileCopy { path, .. } => host.path_exists(path),
            Step::Template { path, .. } => host.path_exists(path),
            Step::Link { path, .. } => host.path_exists(path),
            Step::Service { name } => host.service_running(name),
        }
    }

    /// Perform the step's action against the host.
    fn apply<H: Host>(&self, step: &Step, host: &mut H) -> Result<()> {
        match step {
            Step::Command { command, cwd, .. } => host.run_command(command, cwd.as_deref()),
            Step::Package { name } => host.install_package(name),
            Step::Directory {
                path,
                ownership,
                recursive,
            } => host.create_directory(path, ownership.as_ref(), *recursive),
            Step::FileCopy {
                path,
                contents,
                ownership,
            } => host.write_file(path, contents, ownership.as_ref()),
            Step::Template {
                path,
                template,
                vars,
                ownership,
            } => {
                let rendered = render(template, vars)
                    .with_context(|| format!("Failed to render template for {:?}", path))?;
                host.write_file(path, &rendered, ownership.as_ref())
            }
            Step::Link { path, target } => host.create_symlink(path, target),
            Step::Service { name } => host.start_service(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::ClusterConfig;
    use crate::engine::plan::build_provision_plan;
    use crate::guard::Guard;
    use crate::types::Ownership;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    /// Recording host: fake filesystem plus an action log. Probes pass when
    /// their command is in `passing_probes`.
    #[derive(Default)]
    struct RecordingHost {
        files: HashSet<PathBuf>,
        packages: HashSet<String>,
        services: HashSet<String>,
        passing_probes: HashSet<String>,
        actions: Vec<String>,
    }

    impl Host for RecordingHost {
        fn path_exists(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn package_installed(&self, name: &str) -> bool {
            self.packages.contains(name)
        }

        fn service_running(&self, name: &str) -> bool {
            self.services.contains(name)
        }

        fn probe(&mut self, command: &str) -> bool {
            self.passing_probes.contains(command)
        }

        fn run_command(&mut self, command: &str, _cwd: Option<&Path>) -> Result<()> {
            self.actions.push(format!("run:{}", command));
            Ok(())
        }

        fn install_package(&mut self, name: &str) -> Result<()> {
            self.actions.push(format!("install:{}", name));
            self.packages.insert(name.to_string());
            Ok(())
        }

        fn create_directory(
            &mut self,
            path: &Path,
            _ownership: Option<&Ownership>,
            _recursive: bool,
        ) -> Result<()> {
            self.actions.push(format!("mkdir:{}", path.display()));
            self.files.insert(path.to_path_buf());
            Ok(())
        }

        fn write_file(
            &mut self,
            path: &Path,
            contents: &str,
            _ownership: Option<&Ownership>,
        ) -> Result<()> {
            self.actions
                .push(format!("write:{}:{}b", path.display(), contents.len()));
            self.files.insert(path.to_path_buf());
            Ok(())
        }

        fn create_symlink(&mut self, path: &Path, target: &Path) -> Result<()> {
            self.actions
                .push(format!("link:{}->{}", path.display(), target.display()));
            self.files.insert(path.to_path_buf());
            Ok(())
        }

        fn start_service(&mut self, name: &str) -> Result<()> {
            self.actions.push(format!("start:{}", name));
            self.services.insert(name.to_string());
            Ok(())
        }
    }

    fn single_command(id: &str, guards: Vec<Guard>) -> ProvisionPlan {
        ProvisionPlan {
            steps: vec![Step::Command {
                id: id.to_string(),
                command: format!("echo {}", id),
                cwd: None,
                guards,
            }],
            nodes: 1,
            disks: 1,
            zones: 1,
            regions: 1,
        }
    }

    #[test]
    fn test_guarded_command_skipped() {
        let mut host = RecordingHost::default();
        host.files.insert(PathBuf::from("/tmp/.apt-get-update"));

        let plan = single_command(
            "apt-get-update",
            vec![Guard::PathExists(PathBuf::from("/tmp/.apt-get-update"))],
        );
        let report = StepExecutor::new(false)
            .execute(&plan, &mut host)
            .expect("execute");

        assert!(host.actions.is_empty());
        assert_eq!(report.skipped, vec!["apt-get-update".to_string()]);
    }

    #[test]
    fn test_unguarded_command_runs_every_time() {
        let mut host = RecordingHost::default();
        let plan = single_command("startmain", Vec::new());
        let executor = StepExecutor::new(false);

        executor.execute(&plan, &mut host).expect("first run");
        executor.execute(&plan, &mut host).expect("second run");
        assert_eq!(host.actions.len(), 2);
    }

    #[test]
    fn test_existing_file_copy_target_not_overwritten() {
        let mut host = RecordingHost::default();
        host.files.insert(PathBuf::from("/etc/rsyncd.conf"));

        let plan = ProvisionPlan {
            steps: vec![Step::FileCopy {
                path: PathBuf::from("/etc/rsyncd.conf"),
                contents: "uid = vagrant\n",
                ownership: None,
            }],
            nodes: 1,
            disks: 1,
            zones: 1,
            regions: 1,
        };
        let report = StepExecutor::new(false)
            .execute(&plan, &mut host)
            .expect("execute");

        assert!(host.actions.is_empty());
        assert_eq!(report.executed_count(), 0);
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn test_dry_run_performs_no_actions() {
        let mut host = RecordingHost::default();
        let plan = build_provision_plan(&ClusterConfig::default()).expect("plan");

        let report = StepExecutor::new(true)
            .execute(&plan, &mut host)
            .expect("dry run");

        assert!(host.actions.is_empty());
        assert_eq!(report.executed_count(), plan.steps.len());
    }

    #[test]
    fn test_template_rendered_before_write() {
        let mut host = RecordingHost::default();
        let plan = ProvisionPlan {
            steps: vec![Step::Template {
                path: PathBuf::from("/etc/swift/object-server/1.conf"),
                template: "bind_port = {{ bind_port }}\n",
                vars: vec![("bind_port".to_string(), "6010".to_string())],
                ownership: None,
            }],
            nodes: 1,
            disks: 1,
            zones: 1,
            regions: 1,
        };

        StepExecutor::new(false).execute(&plan, &mut host).expect("execute");
        // 17 bytes: "bind_port = 6010\n" rendered, not the raw template
        assert_eq!(host.actions, vec!["write:/etc/swift/object-server/1.conf:17b".to_string()]);
    }

    #[test]
    fn test_template_render_failure_aborts() {
        let mut host = RecordingHost::default();
        let plan = ProvisionPlan {
            steps: vec![
                Step::Template {
                    path: PathBuf::from("/etc/swift/object-server/1.conf"),
                    template: "bind_port = {{ missing_var }}\n",
                    vars: Vec::new(),
                    ownership: None,
                },
                Step::Service {
                    name: "rsync".to_string(),
                },
            ],
            nodes: 1,
            disks: 1,
            zones: 1,
            regions: 1,
        };

        let err = StepExecutor::new(false)
            .execute(&plan, &mut host)
            .expect_err("render should fail");
        assert!(format!("{:#}", err).contains("missing_var"));
        // Nothing after the failing step ran
        assert!(host.actions.is_empty());
    }
}
