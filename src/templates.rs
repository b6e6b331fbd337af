//! Embedded configuration assets
//!
//! The static Swift configs and the per-service server-config templates the
//! plan materializes onto the target machine. Compiled into the binary so
//! the provisioner is a single self-contained executable.

use crate::types::SwiftService;

/// rsync daemon config with per-node account/container/object modules.
pub const RSYNCD_CONF: &str = include_str!("../assets/rsyncd.conf");

/// Cluster-wide hash path salts.
pub const SWIFT_CONF: &str = include_str!("../assets/swift.conf");

/// Proxy server pipeline with tempauth test accounts.
pub const PROXY_SERVER_CONF: &str = include_str!("../assets/proxy-server.conf");

/// Functional test account configuration.
pub const TEST_CONF: &str = include_str!("../assets/test.conf");

/// Dispersion tool auth configuration.
pub const DISPERSION_CONF: &str = include_str!("../assets/dispersion.conf");

const OBJECT_SERVER_TEMPLATE: &str = include_str!("../assets/object-server.conf.tmpl");
const CONTAINER_SERVER_TEMPLATE: &str = include_str!("../assets/container-server.conf.tmpl");
const ACCOUNT_SERVER_TEMPLATE: &str = include_str!("../assets/account-server.conf.tmpl");

/// The static configs written under /etc/swift, keyed by filename.
pub const STATIC_SWIFT_CONFIGS: &[(&str, &str)] = &[
    ("swift.conf", SWIFT_CONF),
    ("proxy-server.conf", PROXY_SERVER_CONF),
    ("test.conf", TEST_CONF),
    ("dispersion.conf", DISPERSION_CONF),
];

/// Per-service server-config template with `{{ srv_path }}`, `{{ bind_port }}`
/// and `{{ recon_cache_path }}` placeholders.
pub fn server_config_template(service: SwiftService) -> &'static str {
    match service {
        SwiftService::Object => OBJECT_SERVER_TEMPLATE,
        SwiftService::Container => CONTAINER_SERVER_TEMPLATE,
        SwiftService::Account => ACCOUNT_SERVER_TEMPLATE,
    }
}
