//! saio-provision Library
//!
//! Core functionality for provisioning a Swift all-in-one development
//! cluster: a pure plan builder plus a guarded, fail-fast step executor.

pub mod cli;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod executor;
pub mod guard;
pub mod host;
pub mod packages;
pub mod sanity;
pub mod step;
pub mod template;
pub mod templates;
pub mod types;

// Re-export main types for convenience
pub use config_file::ClusterConfig;
pub use engine::plan::{build_provision_plan, ProvisionPlan};
pub use engine::rings::{place_disk, ring_steps, RingDevice};
pub use error::ProvisionError;
pub use executor::{ExecutionReport, StepExecutor};
pub use guard::Guard;
pub use host::{Host, RealHost};
pub use packages::resolve_packages;
pub use step::Step;
pub use template::render;
pub use types::{Ownership, SwiftService};
