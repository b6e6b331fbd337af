//! Ring construction steps
//!
//! Each of the three storage services gets its own ring, built incrementally:
//! create the builder once, add one device per disk, then rebalance and write
//! the ring file once. Every stage is guarded so a re-run converges without
//! rebuilding a finished ring.
//!
//! # Placement policy
//!
//! Disk index `i` maps deterministically onto the topology:
//!
//! ```text
//! node   = ((i - 1) % nodes) + 1
//! zone   = ((i - 1) % zones) + 1
//! region = ((zone - 1) % regions) + 1
//! ```
//!
//! with endpoint `127.0.0.1:60<node><p>` and device `sdb<i>`. Ring consumers
//! elsewhere (rsync modules, server configs) depend on these derived
//! addresses, so the formula must be reproduced exactly.

use std::path::PathBuf;

use crate::config_file::{ClusterConfig, SWIFT_CONF_DIR};
use crate::guard::Guard;
use crate::step::Step;
use crate::types::SwiftService;

/// Where one disk lands in the ring topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingDevice {
    pub disk: u32,
    pub node: u32,
    pub zone: u32,
    pub region: u32,
}

impl RingDevice {
    /// Device name on the node, e.g. `sdb5`.
    pub fn device_name(&self) -> String {
        format!("sdb{}", self.disk)
    }

    /// The `swift-ring-builder add` device spec, e.g.
    /// `r1z1-127.0.0.1:6010/sdb5`.
    pub fn add_spec(&self, service: SwiftService) -> String {
        format!(
            "r{}z{}-127.0.0.1:{}/{}",
            self.region,
            self.zone,
            service.port_for_node(self.node),
            self.device_name()
        )
    }
}

/// Deterministic placement of a disk index onto (region, zone, node).
///
/// Disk indices are 1-based.
pub fn place_disk(disk: u32, config: &ClusterConfig) -> RingDevice {
    debug_assert!(disk >= 1, "disk indices are 1-based");
    let node = ((disk - 1) % config.nodes) + 1;
    let zone = ((disk - 1) % config.zones) + 1;
    let region = ((zone - 1) % config.regions) + 1;
    RingDevice {
        disk,
        node,
        zone,
        region,
    }
}

/// Build the ordered ring-construction steps for one service.
pub fn ring_steps(service: SwiftService, config: &ClusterConfig) -> Vec<Step> {
    let conf_dir = PathBuf::from(SWIFT_CONF_DIR);
    let builder = service.builder_file();
    let builder_path = conf_dir.join(&builder);
    let ring_path = conf_dir.join(service.ring_file());
    let owner = &config.owner;

    let mut steps = Vec::new();

    // Builder is created once, keyed by (part_power, replicas)
    steps.push(Step::Command {
        id: format!("{}.builder-create", service),
        command: format!(
            "sudo -u {} swift-ring-builder {} create {} {} 1",
            owner, builder, config.part_power, config.replicas
        ),
        cwd: Some(conf_dir.clone()),
        guards: vec![Guard::PathExists(builder_path.clone())],
    });

    // One add per disk; a fresh add invalidates any previously written ring
    for disk in 1..=config.disks {
        let device = place_disk(disk, config);
        steps.push(Step::Command {
            id: format!("{}.builder-add-{}", service, device.device_name()),
            command: format!(
                "sudo -u {} swift-ring-builder {} add {} 1 && rm -f {} || true",
                owner,
                builder,
                device.add_spec(service),
                ring_path.display()
            ),
            cwd: Some(conf_dir.clone()),
            guards: vec![Guard::ProbeSucceeds(format!(
                "swift-ring-builder {} search /{}",
                builder_path.display(),
                device.device_name()
            ))],
        });
    }

    // Rebalance-and-write runs once. The probe runs a real rebalance and is
    // not side-effect free; a successful no-op rebalance or an existing ring
    // file both mean the ring is finished.
    steps.push(Step::Command {
        id: format!("{}.builder-rebalance", service),
        command: format!("sudo -u {} swift-ring-builder {} write_ring", owner, builder),
        cwd: Some(conf_dir),
        guards: vec![
            Guard::ProbeSucceeds(format!(
                "sudo -u {} swift-ring-builder {} rebalance",
                owner,
                builder_path.display()
            )),
            Guard::PathExists(ring_path),
        ],
    });

    steps
}
