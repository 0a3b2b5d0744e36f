//! Layout mirrors for engine types that binding generators cannot reflect.
//!
//! Some engine classes use bitfields or members that only exist under `JS_DEBUG`.
//! Automatic reflection gets their layout wrong, so each gets a hand-written structural
//! stand-in (a *mirror*) with the same field order, widths and conditional members. This
//! crate holds those mirrors as a versioned TOML schema, computes their C++ layout per
//! build variant and word size, checks the result against recorded expectations, and
//! emits the C++ replacement classes and Rust structs.

pub mod compute;
pub mod emit;
pub mod error;
pub mod fingerprint;
pub mod registry;
pub mod schema;

pub use compute::{compute_layout, Endianness, FieldPlacement, Layout, Target, TypeSize};
pub use emit::{emit_cpp_replacement, emit_rust_mirror};
pub use error::{LayoutError, Result};
pub use fingerprint::fingerprint;
pub use registry::{CheckOutcome, MirrorRegistry, BUILTIN_MIRRORS};
pub use schema::{Access, Guard, MirrorField, MirrorFile, MirrorSchema, SizeExpectation, Variant, SCHEMA_VERSION};
