//! Externally linkable entry points for engine primitives that are only available inline.
//!
//! Each function forwards to exactly one primitive and returns its result unchanged.
//! Nothing here allocates, keeps state or reports errors of its own.

use crate::context::{shadow, JSContext, Zone};
use crate::options::{CompartmentOptions, OwningCompileOptions};
use crate::value::Value;

/// Default compartment options.
#[no_mangle]
pub extern "C" fn JS_NewCompartmentOptions() -> CompartmentOptions {
    CompartmentOptions::new()
}

/// Default compile options bound to `cx`'s runtime.
///
/// # Safety
///
/// `cx` must be a live context owned by the calling thread.
#[no_mangle]
pub unsafe extern "C" fn JS_NewOwningCompileOptions(cx: *mut JSContext) -> OwningCompileOptions {
    OwningCompileOptions::new(cx)
}

/// The introspectable view of `zone`. Same address, no allocation.
///
/// # Safety
///
/// `zone` must be non-null and live.
#[no_mangle]
pub unsafe extern "C" fn JS_AsShadowZone(zone: *mut Zone) -> *mut shadow::Zone {
    Zone::as_shadow_zone(zone)
}

#[no_mangle]
pub extern "C" fn JS_Int32Value(i: i32) -> Value {
    Value::int32(i)
}

#[no_mangle]
pub extern "C" fn JS_ValueIsInt32(v: Value) -> bool {
    v.is_int32()
}

/// The int32 payload of `v`, read without checking the tag.
///
/// # Safety
///
/// `JS_ValueIsInt32(v)` must hold. Any other value yields an unspecified integer.
#[no_mangle]
pub unsafe extern "C" fn JS_ValueToInt32(v: Value) -> i32 {
    v.to_int32()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReadOnlyCompileOptions;
    use crate::opaque::JSRuntime;

    #[test]
    fn owning_compile_options_carry_runtime() {
        let runtime = 0x2000 as *mut JSRuntime;
        let mut cx = JSContext::new(runtime);
        let options = unsafe { JS_NewOwningCompileOptions(&mut cx) };
        assert_eq!(options.runtime, runtime);
        assert_eq!(options.options, ReadOnlyCompileOptions::new());
        assert!(options.element_root.is_null());
        assert!(options.element_attribute_name_root.is_null());
        assert!(options.introduction_script_root.is_null());
    }

    #[test]
    fn int32_forwarding() {
        let v = JS_Int32Value(i32::MIN);
        assert!(JS_ValueIsInt32(v));
        assert_eq!(unsafe { JS_ValueToInt32(v) }, i32::MIN);
        assert!(!JS_ValueIsInt32(Value::undefined()));
    }
}
