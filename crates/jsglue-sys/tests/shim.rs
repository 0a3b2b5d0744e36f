use std::ptr;

use jsglue_sys::context::shadow;
use jsglue_sys::options::{CompartmentBehaviors, CompartmentCreationOptions, JSVersion, Override, ZoneSpecifier};
use jsglue_sys::{
    JSContext, JSObject, JSRuntime, JSString, JSWhyMagic, Symbol, Value, Zone, JS_AsShadowZone, JS_Int32Value,
    JS_NewCompartmentOptions, JS_NewOwningCompileOptions, JS_ValueIsInt32, JS_ValueToInt32,
};
use proptest::prelude::*;

#[test]
fn embedder_builds_int32_and_compartment_defaults() {
    let v = JS_Int32Value(-42);
    assert!(JS_ValueIsInt32(v));
    assert_eq!(unsafe { JS_ValueToInt32(v) }, -42);

    let options = JS_NewCompartmentOptions();
    assert!(options.behaviors.singletons_as_templates);
}

#[test]
fn int32_boundaries_round_trip() {
    for i in [0, 1, -1, i32::MAX, i32::MIN] {
        let v = JS_Int32Value(i);
        assert!(JS_ValueIsInt32(v), "{i} lost its tag");
        assert_eq!(unsafe { JS_ValueToInt32(v) }, i);
    }
}

proptest! {
    #[test]
    fn int32_round_trip(i in any::<i32>()) {
        let v = JS_Int32Value(i);
        prop_assert!(JS_ValueIsInt32(v));
        prop_assert_eq!(unsafe { JS_ValueToInt32(v) }, i);
    }

    #[test]
    fn doubles_are_never_int32(d in any::<f64>()) {
        prop_assert!(!JS_ValueIsInt32(Value::double(d)));
    }
}

#[test]
fn non_int32_values_fail_the_check() {
    let values = [
        Value::string(0x1000 as *mut JSString),
        Value::object(0x2000 as *mut JSObject),
        Value::symbol(0x3000 as *mut Symbol),
        Value::double(3.0),
        Value::double(f64::NAN),
        Value::boolean(true),
        Value::boolean(false),
        Value::null(),
        Value::undefined(),
        Value::magic(JSWhyMagic::IsConstructing),
    ];
    for v in values {
        assert!(!JS_ValueIsInt32(v), "{v:?} reported as int32");
    }
}

#[test]
fn compartment_defaults_are_idempotent() {
    let first = JS_NewCompartmentOptions();
    let second = JS_NewCompartmentOptions();
    assert_eq!(first, second);

    let CompartmentCreationOptions {
        trace_global,
        zone_spec,
        zone_pointer,
        invisible_to_debugger,
        mergeable,
        preserve_jit_code,
        clone_singletons,
        shared_memory_and_atomics,
        secure_context,
    } = first.creation_options;
    assert!(trace_global.is_none());
    assert_eq!(zone_spec, ZoneSpecifier::FreshZone);
    assert!(zone_pointer.is_null());
    assert!(!(invisible_to_debugger || mergeable || preserve_jit_code));
    assert!(!(clone_singletons || shared_memory_and_atomics || secure_context));

    let CompartmentBehaviors {
        version,
        discard_source,
        disable_lazy_parsing,
        extra_warnings_override,
        singletons_as_templates,
    } = first.behaviors;
    assert_eq!(version, JSVersion::Unknown);
    assert!(!discard_source && !disable_lazy_parsing);
    assert_eq!(extra_warnings_override, Override::Default);
    assert!(singletons_as_templates);
}

#[test]
fn compile_options_follow_their_context() {
    let runtime = 0x8000 as *mut JSRuntime;
    let mut cx = JSContext::new(runtime);
    let first = unsafe { JS_NewOwningCompileOptions(&mut cx) };
    let second = unsafe { JS_NewOwningCompileOptions(&mut cx) };
    assert_eq!(first, second);
    assert_eq!(first.runtime, runtime);
    assert_eq!(first.options.lineno, 1);
}

#[test]
fn shadow_zone_is_the_same_address() {
    let mut backing = shadow::Zone::new(ptr::null_mut(), ptr::null_mut());
    let zone: *mut Zone = shadow::Zone::as_zone(&mut backing);

    let view = unsafe { JS_AsShadowZone(zone) };
    assert_eq!(view as usize, zone as usize);
    assert_eq!(shadow::Zone::as_zone(view), zone);
    assert!(!unsafe { (*view).needs_incremental_barrier() });
}
