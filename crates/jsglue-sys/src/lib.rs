//! Boundary types of the embedded JavaScript engine and the `JS_*` re-exports that make
//! its inline entry points callable from outside C++.
//!
//! The types here are layout-compatible with their engine counterparts. Those whose
//! layout cannot be reflected automatically ([`CallArgs`], [`JitMethodCallArgs`]) are
//! checked against the schemas in `jsglue-layout`; enable the `debug-engine` feature when
//! linking against an engine built with `JS_DEBUG`.
//!
//! The layout tests only see the variant the crate was compiled for, so run them once per
//! variant:
//!
//! ```text
//! cargo test -p jsglue-sys
//! cargo test -p jsglue-sys --features debug-engine
//! ```

#![allow(non_snake_case)]

pub mod call_args;
pub mod context;
pub mod glue;
pub mod handle;
pub mod id;
pub mod opaque;
pub mod options;
pub mod rooting;
pub mod value;

pub use call_args::{CallArgs, JSNative, JSNativeWrapper, JitMethodCallArgs, JitSetterCallArgs};
pub use context::{shadow, JSContext, RootKind, Zone};
pub use glue::*;
pub use handle::{Handle, HandleObject, HandleValue, HandleValueArray, MutableHandle, MutableHandleValue};
pub use id::{jsid, HandleId, ObjectOpResult, PropertyDescriptor, JSID_EMPTY, JSID_VOID};
pub use opaque::*;
pub use options::{CompartmentOptions, OwningCompileOptions, ReadOnlyCompileOptions};
pub use rooting::{GcRootKind, Rooted};
pub use value::{JSWhyMagic, Value, ValueType};

/// Name of the build variant this crate was compiled for, as declared in the mirror
/// schemas.
pub const BUILD_VARIANT: &str = if cfg!(feature = "debug-engine") { "debug" } else { "release" };
