//! Package resolution
//!
//! Translates the cluster configuration into the concrete apt package list.
//!
//! - **Pure logic**: No I/O, no side effects — only resolves names
//! - **Order-preserving**: Required packages first, then extras, so a plan
//!   diff stays readable; duplicates are dropped

use crate::config_file::ClusterConfig;

/// Packages every SAIO node needs: build tooling, memcached, rsync, sqlite,
/// xfsprogs and the Python stack Swift runs on.
pub const REQUIRED_PACKAGES: &[&str] = &[
    "curl",
    "gcc",
    "memcached",
    "rsync",
    "sqlite3",
    "xfsprogs",
    "git-core",
    "python-setuptools",
    "python-coverage",
    "python-dev",
    "python-nose",
    "python-simplejson",
    "python-xattr",
    "python-eventlet",
    "python-greenlet",
    "python-pastedeploy",
    "python-netifaces",
    "python-pip",
    "python-dnspython",
    "python-mock",
];

/// Resolve the full apt package list: built-ins plus config extras,
/// first occurrence wins.
pub fn resolve_packages(config: &ClusterConfig) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();

    for pkg in REQUIRED_PACKAGES {
        packages.push((*pkg).to_string());
    }

    for pkg in &config.extra_packages {
        if !packages.iter().any(|existing| existing == pkg) {
            packages.push(pkg.clone());
        }
    }

    packages
}
