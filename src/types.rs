//! Type-safe domain types for the provisioner
//!
//! This module replaces stringly-typed cluster values with proper Rust enums
//! that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The three independent Swift storage services, each with its own ring.
///
/// The declaration order is significant: the per-service port offset is
/// the position in this enum (object=0, container=1, account=2), and the
/// synthetic endpoint for node `n` is `127.0.0.1:60<n><offset>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum SwiftService {
    #[strum(serialize = "object")]
    Object,
    #[strum(serialize = "container")]
    Container,
    #[strum(serialize = "account")]
    Account,
}

impl SwiftService {
    /// Fixed single-digit port offset appended to `60<node>`.
    pub fn port_offset(&self) -> u32 {
        match self {
            Self::Object => 0,
            Self::Container => 1,
            Self::Account => 2,
        }
    }

    /// Bind port for this service on a given node, e.g. node 1 object -> 6010.
    ///
    /// Ring consumers elsewhere depend on these derived addresses, so the
    /// scheme must not change.
    pub fn port_for_node(&self, node: u32) -> u32 {
        6000 + node * 10 + self.port_offset()
    }

    /// Name of the ring builder artifact, e.g. `object.builder`.
    pub fn builder_file(&self) -> String {
        format!("{}.builder", self)
    }

    /// Name of the finished ring artifact, e.g. `object.ring.gz`.
    pub fn ring_file(&self) -> String {
        format!("{}.ring.gz", self)
    }
}

/// Owner/group applied to directories and files the provisioner creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub owner: String,
    pub group: String,
}

impl Ownership {
    pub fn new(owner: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
        }
    }
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.owner, self.group)
    }
}
