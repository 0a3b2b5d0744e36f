//! Configuration value types constructed with engine defaults.
//!
//! These are plain values: the embedder copies them around and hands them back to the
//! engine. The constructors here reproduce the engine's own default constructors, field
//! for field.

use std::os::raw::c_char;
use std::ptr;

use crate::context::{self, JSContext};
use crate::opaque::{JSObject, JSRuntime, JSScript, JSString, JSTracer};

/// Trace hook for a compartment's global.
pub type JSTraceOp = unsafe extern "C" fn(trc: *mut JSTracer, obj: *mut JSObject);

/// Language version selector. `Unknown` means "inherit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum JSVersion {
    Ecma3 = 148,
    V1_6 = 160,
    V1_7 = 170,
    V1_8 = 180,
    Ecma5 = 185,
    Default = 0,
    Unknown = -1,
}

/// Where a new compartment's zone comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ZoneSpecifier {
    FreshZone = 0,
    SystemZone = 1,
}

/// Tri-state override of a context-wide default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Override {
    Default = 0,
    ForceTrue = 1,
    ForceFalse = 2,
}

impl Override {
    /// Resolve against the context-wide value.
    pub fn get(self, default_value: bool) -> bool {
        match self {
            Override::Default => default_value,
            Override::ForceTrue => true,
            Override::ForceFalse => false,
        }
    }
}

/// Options fixed at compartment creation.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct CompartmentCreationOptions {
    pub trace_global: Option<JSTraceOp>,
    pub zone_spec: ZoneSpecifier,
    pub zone_pointer: *mut std::os::raw::c_void,
    pub invisible_to_debugger: bool,
    pub mergeable: bool,
    pub preserve_jit_code: bool,
    pub clone_singletons: bool,
    pub shared_memory_and_atomics: bool,
    pub secure_context: bool,
}

impl CompartmentCreationOptions {
    #[inline]
    pub const fn new() -> Self {
        Self {
            trace_global: None,
            zone_spec: ZoneSpecifier::FreshZone,
            zone_pointer: ptr::null_mut(),
            invisible_to_debugger: false,
            mergeable: false,
            preserve_jit_code: false,
            clone_singletons: false,
            shared_memory_and_atomics: false,
            secure_context: false,
        }
    }
}

impl CompartmentCreationOptions {
    fn trace_global_addr(&self) -> Option<usize> {
        self.trace_global.map(|hook| hook as usize)
    }
}

// Trace hooks compare by address.
impl PartialEq for CompartmentCreationOptions {
    fn eq(&self, other: &Self) -> bool {
        self.trace_global_addr() == other.trace_global_addr()
            && self.zone_spec == other.zone_spec
            && self.zone_pointer == other.zone_pointer
            && self.invisible_to_debugger == other.invisible_to_debugger
            && self.mergeable == other.mergeable
            && self.preserve_jit_code == other.preserve_jit_code
            && self.clone_singletons == other.clone_singletons
            && self.shared_memory_and_atomics == other.shared_memory_and_atomics
            && self.secure_context == other.secure_context
    }
}

impl Eq for CompartmentCreationOptions {}

impl Default for CompartmentCreationOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Options that may change over a compartment's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CompartmentBehaviors {
    pub version: JSVersion,
    pub discard_source: bool,
    pub disable_lazy_parsing: bool,
    pub extra_warnings_override: Override,
    pub singletons_as_templates: bool,
}

impl CompartmentBehaviors {
    #[inline]
    pub const fn new() -> Self {
        Self {
            version: JSVersion::Unknown,
            discard_source: false,
            disable_lazy_parsing: false,
            extra_warnings_override: Override::Default,
            singletons_as_templates: true,
        }
    }
}

impl Default for CompartmentBehaviors {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for a new compartment (realm).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CompartmentOptions {
    pub creation_options: CompartmentCreationOptions,
    pub behaviors: CompartmentBehaviors,
}

impl CompartmentOptions {
    /// The engine's default compartment options.
    #[inline]
    pub const fn new() -> Self {
        Self {
            creation_options: CompartmentCreationOptions::new(),
            behaviors: CompartmentBehaviors::new(),
        }
    }
}

impl Default for CompartmentOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether asm.js is validated and compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AsmJsOption {
    Enabled = 0,
    Disabled = 1,
    DisabledByDebugger = 2,
}

/// Compile options that are inherited by nested compilations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TransitiveCompileOptions {
    pub muted_errors: bool,
    pub filename: *const c_char,
    pub introducer_filename: *const c_char,
    pub source_map_url: *const u16,
    pub version: JSVersion,
    pub version_set: bool,
    pub utf8: bool,
    pub self_hosting_mode: bool,
    pub can_lazily_parse: bool,
    pub strict_option: bool,
    pub extra_warnings_option: bool,
    pub werror_option: bool,
    pub asm_js_option: AsmJsOption,
    pub throw_on_asm_js_validation_failure_option: bool,
    pub force_async: bool,
    pub installed_file: bool,
    pub source_is_lazy: bool,
    pub introduction_type: *const c_char,
    pub introduction_lineno: u32,
    pub introduction_offset: u32,
    pub has_introduction_info: bool,
}

impl TransitiveCompileOptions {
    #[inline]
    pub const fn new() -> Self {
        Self {
            muted_errors: false,
            filename: ptr::null(),
            introducer_filename: ptr::null(),
            source_map_url: ptr::null(),
            version: JSVersion::Unknown,
            version_set: false,
            utf8: false,
            self_hosting_mode: false,
            can_lazily_parse: true,
            strict_option: false,
            extra_warnings_option: false,
            werror_option: false,
            asm_js_option: AsmJsOption::Disabled,
            throw_on_asm_js_validation_failure_option: false,
            force_async: false,
            installed_file: false,
            source_is_lazy: false,
            introduction_type: ptr::null(),
            introduction_lineno: 0,
            introduction_offset: 0,
            has_introduction_info: false,
        }
    }
}

/// Compile options that only apply to the top-level compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ReadOnlyCompileOptions {
    pub transitive: TransitiveCompileOptions,
    pub lineno: u32,
    pub column: u32,
    pub script_source_offset: u32,
    pub is_run_once: bool,
    pub for_eval: bool,
    pub no_script_rval: bool,
}

impl ReadOnlyCompileOptions {
    #[inline]
    pub const fn new() -> Self {
        Self {
            transitive: TransitiveCompileOptions::new(),
            lineno: 1,
            column: 0,
            script_source_offset: 0,
            is_run_once: false,
            for_eval: false,
            no_script_rval: false,
        }
    }
}

impl Default for ReadOnlyCompileOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile options that own their strings and keep their GC referents alive.
///
/// Bound to the runtime of the context it was created from.
#[derive(Debug, PartialEq, Eq)]
#[repr(C)]
pub struct OwningCompileOptions {
    pub options: ReadOnlyCompileOptions,
    pub runtime: *mut JSRuntime,
    pub element_root: *mut JSObject,
    pub element_attribute_name_root: *mut JSString,
    pub introduction_script_root: *mut JSScript,
}

impl OwningCompileOptions {
    /// Default options bound to `cx`'s runtime.
    ///
    /// # Safety
    ///
    /// `cx` must be a live context owned by the calling thread.
    #[inline]
    pub unsafe fn new(cx: *mut JSContext) -> Self {
        Self {
            options: ReadOnlyCompileOptions::new(),
            runtime: context::get_runtime(cx),
            element_root: ptr::null_mut(),
            element_attribute_name_root: ptr::null_mut(),
            introduction_script_root: ptr::null_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compartment_defaults() {
        let options = CompartmentOptions::default();
        let creation = options.creation_options;
        assert!(creation.trace_global.is_none());
        assert_eq!(creation.zone_spec, ZoneSpecifier::FreshZone);
        assert!(creation.zone_pointer.is_null());
        assert!(!creation.invisible_to_debugger);
        assert!(!creation.shared_memory_and_atomics);

        let behaviors = options.behaviors;
        assert_eq!(behaviors.version, JSVersion::Unknown);
        assert_eq!(behaviors.extra_warnings_override, Override::Default);
        assert!(behaviors.singletons_as_templates);
        assert!(!behaviors.discard_source);
    }

    unsafe extern "C" fn trace_a(_trc: *mut JSTracer, _obj: *mut JSObject) {}
    unsafe extern "C" fn trace_b(_trc: *mut JSTracer, _obj: *mut JSObject) {
        let _ = std::hint::black_box(1);
    }

    #[test]
    fn creation_options_compare_trace_hooks_by_address() {
        let plain = CompartmentCreationOptions::new();
        assert_eq!(plain, CompartmentCreationOptions::default());

        let traced = CompartmentCreationOptions {
            trace_global: Some(trace_a),
            ..plain
        };
        assert_ne!(traced, plain);
        assert_eq!(traced, traced);
        assert_ne!(
            traced,
            CompartmentCreationOptions {
                trace_global: Some(trace_b),
                ..plain
            }
        );
        assert_eq!(CompartmentOptions::new(), CompartmentOptions::default());
    }

    #[test]
    fn override_resolution() {
        assert!(Override::Default.get(true));
        assert!(!Override::Default.get(false));
        assert!(Override::ForceTrue.get(false));
        assert!(!Override::ForceFalse.get(true));
    }

    #[test]
    fn read_only_compile_defaults() {
        let options = ReadOnlyCompileOptions::default();
        assert_eq!(options.lineno, 1);
        assert_eq!(options.column, 0);
        assert!(options.transitive.can_lazily_parse);
        assert_eq!(options.transitive.asm_js_option, AsmJsOption::Disabled);
        assert!(options.transitive.filename.is_null());
        assert!(!options.transitive.version_set);
    }
}
