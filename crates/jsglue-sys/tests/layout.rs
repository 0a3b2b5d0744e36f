//! Rust structs against the mirror schemas, for the variant this crate was built for.
//!
//! Both variants need a run:
//!
//! ```text
//! cargo test -p jsglue-sys
//! cargo test -p jsglue-sys --features debug-engine
//! ```

use std::mem::{align_of, offset_of, size_of};

use jsglue_layout::{MirrorRegistry, Target};
use jsglue_sys::{CallArgs, JitMethodCallArgs, Value, BUILD_VARIANT};

fn registry() -> MirrorRegistry {
    MirrorRegistry::builtin().expect("built-in mirrors load")
}

#[test]
fn call_args_matches_its_mirror() {
    let layout = registry()
        .compute("CallArgsReplacement", BUILD_VARIANT, Target::host())
        .unwrap();
    assert_eq!(layout.size, size_of::<CallArgs>() as u64);
    assert_eq!(layout.align, align_of::<CallArgs>() as u64);
    assert_eq!(layout.field("argv_").unwrap().byte_offset(), offset_of!(CallArgs, argv_) as u64);
    assert_eq!(layout.field("argc_").unwrap().byte_offset(), offset_of!(CallArgs, argc_) as u64);
    assert_eq!(
        layout.field("constructing_").unwrap().byte_offset(),
        offset_of!(CallArgs, _bitfield_1) as u64
    );
    assert_eq!(
        layout.field("ignoresReturnValue_").unwrap().byte_offset(),
        offset_of!(CallArgs, _bitfield_1) as u64
    );
    assert_eq!(layout.field("wantUsedRval_").is_some(), cfg!(feature = "debug-engine"));
}

#[test]
fn jit_method_call_args_matches_its_mirror() {
    let layout = registry()
        .compute("JSJitMethodCallArgsReplacement", BUILD_VARIANT, Target::host())
        .unwrap();
    assert_eq!(layout.size, size_of::<JitMethodCallArgs>() as u64);
    assert_eq!(layout.align, align_of::<JitMethodCallArgs>() as u64);
    assert_eq!(
        layout.field("argc_").unwrap().byte_offset(),
        offset_of!(JitMethodCallArgs, argc_) as u64
    );
}

#[test]
fn flag_bits_agree_with_the_mirror() {
    let layout = registry()
        .compute("CallArgsReplacement", BUILD_VARIANT, Target::host())
        .unwrap();
    let constructing = layout.field("constructing_").unwrap();
    let ignores = layout.field("ignoresReturnValue_").unwrap();

    let mut slots = [Value::undefined(); 3];
    let args = unsafe { CallArgs::new(slots.as_mut_ptr().add(2), 0, true, false) };
    assert_eq!(constructing.byte_mask(Target::host()), Some(args._bitfield_1));

    let args = unsafe { CallArgs::new(slots.as_mut_ptr().add(2), 0, false, true) };
    assert_eq!(ignores.byte_mask(Target::host()), Some(args._bitfield_1));
}

#[test]
fn registry_expectations_hold_for_the_host() {
    registry().check(Target::host()).unwrap();
}

#[cfg(feature = "debug-engine")]
#[test]
fn used_rval_markers_follow_the_flag_byte() {
    let registry = registry();
    let call = registry.compute("CallArgsReplacement", "debug", Target::host()).unwrap();
    assert_eq!(
        call.field("wantUsedRval_").unwrap().byte_offset(),
        offset_of!(CallArgs, want_used_rval_) as u64
    );
    let jit = registry
        .compute("JSJitMethodCallArgsReplacement", "debug", Target::host())
        .unwrap();
    assert_eq!(
        jit.field("wantUsedRval_").unwrap().byte_offset(),
        offset_of!(JitMethodCallArgs, want_used_rval_) as u64
    );
    assert_eq!(offset_of!(CallArgs, want_used_rval_), offset_of!(CallArgs, _bitfield_1) + 1);
}
