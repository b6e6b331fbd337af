//! Provision plan builder
//!
//! Translates the cluster topology configuration into an ordered sequence of
//! idempotent `Step` values that the executor can apply. The order is the
//! contract: packages install before anything needs their binaries, the
//! loopback disk mounts before node directories land on it, configs and
//! rings exist before the services start.
//!
//! # Design
//!
//! - **Pure logic**: No I/O, no side effects — only generates the plan
//! - **Typed output**: Each `Step` maps directly to one executor action
//! - **Guarded**: Every step that could repeat work carries its guard, so
//!   re-running the whole plan converges without duplicate side effects

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

use crate::config_file::{ClusterConfig, DISK_FILE, MOUNT_POINT, SWIFT_CONF_DIR};
use crate::engine::rings::ring_steps;
use crate::guard::Guard;
use crate::packages::resolve_packages;
use crate::step::Step;
use crate::templates::{server_config_template, RSYNCD_CONF, STATIC_SWIFT_CONFIGS};
use crate::types::SwiftService;

/// A complete provision plan: an ordered list of steps.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    /// Ordered sequence of provisioning steps
    pub steps: Vec<Step>,
    /// Topology the plan was generated for
    pub nodes: u32,
    pub disks: u32,
    pub zones: u32,
    pub regions: u32,
}

impl ProvisionPlan {
    /// Returns a summary of the plan for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Provision Plan".to_string(),
            format!(
                "  Topology: {} node(s), {} disk(s), {} zone(s), {} region(s)",
                self.nodes, self.disks, self.zones, self.regions
            ),
            format!("  Steps ({}):", self.steps.len()),
        ];
        for (i, step) in self.steps.iter().enumerate() {
            lines.push(format!("    {}. {}", i + 1, step));
        }
        lines.join("\n")
    }
}

/// Build the full provision plan from a cluster configuration.
///
/// Fails only on an invalid configuration; plan generation itself performs
/// no I/O and cannot observe the machine.
pub fn build_provision_plan(config: &ClusterConfig) -> Result<ProvisionPlan> {
    config
        .validate()
        .context("Cannot build a plan from an invalid configuration")?;

    let mut steps = Vec::new();

    steps.extend(cleanup_steps(config));
    steps.extend(package_steps(config));
    steps.extend(disk_steps(config));
    steps.extend(storage_layout_steps(config));
    steps.extend(rsync_steps());
    steps.extend(source_install_steps(config));
    steps.extend(swift_config_steps(config));
    for service in SwiftService::iter() {
        steps.extend(ring_steps(service, config));
    }
    steps.extend(startup_steps(config));
    steps.extend(profile_steps(config));

    Ok(ProvisionPlan {
        steps,
        nodes: config.nodes,
        disks: config.disks,
        zones: config.zones,
        regions: config.regions,
    })
}

/// Remove the image's leftover post-install script. Unguarded; the `|| true`
/// makes a missing file a no-op.
fn cleanup_steps(config: &ClusterConfig) -> Vec<Step> {
    vec![Step::Command {
        id: "clean-up".to_string(),
        command: format!("rm {}/postinstall.sh || true", home_dir(config).display()),
        cwd: None,
        guards: Vec::new(),
    }]
}

/// `apt-get update` once (marker-guarded), then every required package.
fn package_steps(config: &ClusterConfig) -> Vec<Step> {
    let mut steps = vec![Step::Command {
        id: "apt-get-update".to_string(),
        command: "apt-get update && touch /tmp/.apt-get-update".to_string(),
        cwd: None,
        guards: vec![Guard::PathExists(PathBuf::from("/tmp/.apt-get-update"))],
    }];

    for name in resolve_packages(config) {
        steps.push(Step::Package { name });
    }

    steps
}

/// Loopback disk: sparse file, XFS, fstab entry, mount.
fn disk_steps(config: &ClusterConfig) -> Vec<Step> {
    vec![
        Step::Directory {
            path: PathBuf::from("/var/lib/swift"),
            ownership: None,
            recursive: false,
        },
        Step::Directory {
            path: PathBuf::from(MOUNT_POINT),
            ownership: None,
            recursive: false,
        },
        Step::Command {
            id: "create-sparse-file".to_string(),
            command: format!("truncate -s {} {}", config.loopback_size, DISK_FILE),
            cwd: None,
            guards: vec![Guard::PathExists(PathBuf::from(DISK_FILE))],
        },
        Step::Command {
            id: "create-filesystem".to_string(),
            command: format!("mkfs.xfs {}", DISK_FILE),
            cwd: None,
            // xfs_admin succeeds only once the file carries an XFS label
            guards: vec![Guard::ProbeSucceeds(format!("xfs_admin -l {}", DISK_FILE))],
        },
        Step::Command {
            id: "update-fstab".to_string(),
            command: format!(
                "echo '{} {} xfs loop,noatime,nodiratime,nobarrier,logbufs=8 0 0' >> /etc/fstab",
                DISK_FILE, MOUNT_POINT
            ),
            cwd: None,
            guards: vec![Guard::ProbeSucceeds("grep swift-disk /etc/fstab".to_string())],
        },
        Step::Command {
            id: "mount".to_string(),
            command: format!("mount {}", MOUNT_POINT),
            cwd: None,
            guards: vec![Guard::ProbeSucceeds(format!("mountpoint {}", MOUNT_POINT))],
        },
    ]
}

/// Per-disk storage directories, the /srv/node<i> symlink farm, run dir and
/// per-node recon caches.
fn storage_layout_steps(config: &ClusterConfig) -> Vec<Step> {
    let ownership = config.ownership();
    let mut steps = Vec::new();

    for disk in 1..=config.disks {
        let disk_path = PathBuf::from(format!("{}/sdb{}", MOUNT_POINT, disk));
        let node_path = PathBuf::from(format!("/srv/node{}", disk));
        steps.push(Step::Directory {
            path: disk_path.clone(),
            ownership: Some(ownership.clone()),
            recursive: false,
        });
        steps.push(Step::Directory {
            path: node_path.clone(),
            ownership: Some(ownership.clone()),
            recursive: false,
        });
        steps.push(Step::Link {
            path: node_path.join(format!("sdb{}", disk)),
            target: disk_path,
        });
    }

    steps.push(Step::Directory {
        path: PathBuf::from("/var/run/swift"),
        ownership: Some(ownership.clone()),
        recursive: false,
    });

    for node in 1..=config.nodes {
        steps.push(Step::Directory {
            path: PathBuf::from(format!("/var/cache/swift/node{}", node)),
            ownership: Some(ownership.clone()),
            recursive: true,
        });
    }

    steps
}

/// rsync daemon config, enablement and startup.
fn rsync_steps() -> Vec<Step> {
    vec![
        Step::FileCopy {
            path: PathBuf::from("/etc/rsyncd.conf"),
            contents: RSYNCD_CONF,
            ownership: None,
        },
        Step::Command {
            id: "enable-rsync".to_string(),
            command: "sed -i 's/ENABLE=false/ENABLE=true/' /etc/default/rsync".to_string(),
            cwd: None,
            guards: vec![Guard::ProbeSucceeds(
                "grep ENABLE=true /etc/default/rsync".to_string(),
            )],
        },
        Step::Service {
            name: "rsync".to_string(),
        },
    ]
}

/// Develop-mode installs of swift and python-swiftclient from the shared
/// source checkout.
fn source_install_steps(config: &ClusterConfig) -> Vec<Step> {
    let root = PathBuf::from(&config.source_root);
    vec![
        Step::Command {
            id: "fix-git-relative-submodules".to_string(),
            command: "for project in $(ls .git/modules); do \
                      sed -i \"s|worktree = .*|worktree = ../../../${project}|g\" \
                      .git/modules/${project}/config; done && rm */.git && git submodule update"
                .to_string(),
            cwd: Some(root.clone()),
            guards: vec![Guard::ProbeSucceeds(format!(
                "cd {}/swift && git status",
                config.source_root
            ))],
        },
        Step::Command {
            id: "python-swiftclient-install".to_string(),
            command: "pip install -e . && pip install -r test-requirements.txt".to_string(),
            cwd: Some(root.join("python-swiftclient")),
            guards: vec![Guard::PathExists(PathBuf::from(
                "/usr/local/lib/python2.7/dist-packages/python-swiftclient.egg-link",
            ))],
        },
        // Unguarded: setup.py develop is cheap and safe to repeat
        Step::Command {
            id: "python-swift-install".to_string(),
            command: "python setup.py develop && pip install -r test-requirements.txt".to_string(),
            cwd: Some(root.join("swift")),
            guards: Vec::new(),
        },
    ]
}

/// /etc/swift tree: static configs plus per-node rendered server configs.
fn swift_config_steps(config: &ClusterConfig) -> Vec<Step> {
    let ownership = config.ownership();
    let conf_dir = PathBuf::from(SWIFT_CONF_DIR);
    let mut steps = Vec::new();

    steps.push(Step::Directory {
        path: conf_dir.clone(),
        ownership: Some(ownership.clone()),
        recursive: false,
    });

    for (name, contents) in STATIC_SWIFT_CONFIGS {
        steps.push(Step::FileCopy {
            path: conf_dir.join(name),
            contents,
            ownership: Some(ownership.clone()),
        });
    }

    for service in SwiftService::iter() {
        steps.push(Step::Directory {
            path: conf_dir.join(format!("{}-server", service)),
            ownership: Some(ownership.clone()),
            recursive: false,
        });

        for node in 1..=config.nodes {
            steps.push(Step::Template {
                path: conf_dir.join(format!("{}-server/{}.conf", service, node)),
                template: server_config_template(service),
                vars: vec![
                    ("srv_path".to_string(), format!("/srv/node{}", node)),
                    (
                        "bind_port".to_string(),
                        service.port_for_node(node).to_string(),
                    ),
                    (
                        "recon_cache_path".to_string(),
                        format!("/var/cache/swift/node{}", node),
                    ),
                ],
                ownership: Some(ownership.clone()),
            });
        }
    }

    steps
}

/// Bring the cluster up. Unguarded; swift-init tolerates already-running
/// servers.
fn startup_steps(config: &ClusterConfig) -> Vec<Step> {
    vec![Step::Command {
        id: "startmain".to_string(),
        command: format!("sudo -u {} swift-init start main", config.owner),
        cwd: None,
        guards: Vec::new(),
    }]
}

/// PATH and swift-client auth exports, each appended to the profile at most
/// once.
fn profile_steps(config: &ClusterConfig) -> Vec<Step> {
    let profile = &config.profile_path;
    let bin_dir = format!("{}/bin", config.source_root);

    let mut steps = vec![Step::Command {
        id: "update-path".to_string(),
        command: format!("echo 'export PATH=$PATH:{}' >> {}", bin_dir, profile),
        cwd: None,
        guards: vec![Guard::ProbeSucceeds(format!("grep {} {}", bin_dir, profile))],
    }];

    for (var, value) in [
        ("ST_AUTH", "http://localhost:8080/auth/v1.0"),
        ("ST_USER", "test:tester"),
        ("ST_KEY", "testing"),
    ] {
        steps.push(Step::Command {
            id: format!("swift-env-{}", var),
            command: format!("echo 'export {}={}' >> {}", var, value, profile),
            cwd: None,
            guards: vec![Guard::ProbeSucceeds(format!("grep {} {}", var, profile))],
        });
    }

    steps
}

/// Home directory of the owning user, derived from the profile path.
fn home_dir(config: &ClusterConfig) -> PathBuf {
    Path::new(&config.profile_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/root"))
}
