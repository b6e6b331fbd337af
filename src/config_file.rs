//! Cluster configuration handling for saving and loading provisioning configs.
//!
//! The topology integers here are the only inputs the plan builder needs;
//! everything else about the cluster layout is derived from them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::Ownership;

/// Fixed location of the sparse file backing the loopback disk.
pub const DISK_FILE: &str = "/var/lib/swift/disk";

/// Fixed mount point for the loopback XFS filesystem.
pub const MOUNT_POINT: &str = "/mnt/swift-disk";

/// Fixed Swift configuration directory.
pub const SWIFT_CONF_DIR: &str = "/etc/swift";

/// Cluster topology and environment configuration.
///
/// Defaults match the stock four-node SAIO layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of storage nodes (single digit, feeds the 60<node><p> port scheme)
    pub nodes: u32,
    /// Number of loopback-backed devices (sdb1..sdbN)
    pub disks: u32,
    /// Failure-domain zones the ring spreads replicas across
    pub zones: u32,
    /// Regions the zones are grouped into
    pub regions: u32,
    /// Ring partition power (log2 of partition count)
    pub part_power: u32,
    /// Ring replica count
    pub replicas: u32,

    /// Extra apt packages installed on top of the built-in list
    pub extra_packages: Vec<String>,

    /// User owning the storage directories and configs
    pub owner: String,
    /// Group owning the storage directories and configs
    pub group: String,

    /// Checkout containing the `swift` and `python-swiftclient` source trees
    pub source_root: String,
    /// Shell profile that receives the PATH and ST_* exports
    pub profile_path: String,
    /// Size passed to `truncate -s` for the sparse disk file
    pub loopback_size: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: 4,
            disks: 8,
            zones: 2,
            regions: 1,
            part_power: 10,
            replicas: 3,
            extra_packages: Vec::new(),
            owner: "vagrant".to_string(),
            group: "vagrant".to_string(),
            source_root: "/vagrant".to_string(),
            profile_path: "/home/vagrant/.profile".to_string(),
            loopback_size: "3GB".to_string(),
        }
    }
}

impl ClusterConfig {
    /// Create a new configuration with the stock SAIO defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.nodes == 0 {
            anyhow::bail!("Node count must be at least 1");
        }
        if self.nodes > 9 {
            // Bind ports are 60<node><p>; two-digit nodes would collide
            anyhow::bail!("Node count must be a single digit (1-9)");
        }
        if self.disks == 0 {
            anyhow::bail!("Disk count must be at least 1");
        }
        if self.zones == 0 {
            anyhow::bail!("Zone count must be at least 1");
        }
        if self.zones > self.disks {
            anyhow::bail!(
                "Zone count ({}) cannot exceed disk count ({}) — some zones would be empty",
                self.zones,
                self.disks
            );
        }
        if self.regions == 0 {
            anyhow::bail!("Region count must be at least 1");
        }
        if self.regions > self.zones {
            anyhow::bail!(
                "Region count ({}) cannot exceed zone count ({})",
                self.regions,
                self.zones
            );
        }
        if self.part_power == 0 || self.part_power > 32 {
            anyhow::bail!("Partition power must be in 1..=32");
        }
        if self.replicas == 0 {
            anyhow::bail!("Replica count must be at least 1");
        }

        if self.owner.trim().is_empty() || self.group.trim().is_empty() {
            anyhow::bail!("Owner and group must be specified");
        }
        if self.profile_path.trim().is_empty() {
            anyhow::bail!("Profile path must be specified");
        }
        if !self.profile_path.starts_with('/') {
            anyhow::bail!("Profile path must be absolute");
        }
        if self.source_root.trim().is_empty() {
            anyhow::bail!("Source root must be specified");
        }
        if self.loopback_size.trim().is_empty() {
            anyhow::bail!("Loopback size must be specified");
        }

        for pkg in &self.extra_packages {
            if pkg.trim().is_empty() || pkg.contains(char::is_whitespace) {
                anyhow::bail!("Invalid extra package name: {:?}", pkg);
            }
        }

        Ok(())
    }

    /// Ownership applied to created storage paths and configs
    pub fn ownership(&self) -> Ownership {
        Ownership::new(self.owner.clone(), self.group.clone())
    }
}
