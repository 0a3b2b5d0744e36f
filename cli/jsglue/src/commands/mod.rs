//! CLI command implementations.

pub mod bindings;
pub mod exports;
pub mod generate;
pub mod mirrors;
