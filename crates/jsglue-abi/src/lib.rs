//! The re-export surface of jsglue and the C++ side of the glue.
//!
//! `exports.toml` declares which inline engine functions become real symbols and how
//! each one forwards; `bindings.toml` configures the binding generator. From those and
//! the mirror registry this crate generates the glue translation unit and the binding
//! generator's input header.

pub mod config;
pub mod csig;
pub mod error;
pub mod export;
pub mod header;

pub use config::{pattern_matches, validate_config, BindingConfig, BUILTIN_BINDINGS, REQUIRED_VARS};
pub use csig::{CParam, CSignature, CType};
pub use error::{AbiError, Result};
pub use export::{validate_manifest, Export, ExportManifest, Forward, Precondition, BUILTIN_EXPORTS};
pub use header::{generate_glue_source, generate_wrapper_header};
