//! Plan-generation engine: topology in, ordered idempotent steps out.

pub mod plan;
pub mod rings;
