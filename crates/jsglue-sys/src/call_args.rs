//! Argument records passed to native functions.
//!
//! The engine declares these with bitfields and JS_DEBUG-only members, which binding
//! generators cannot reflect. The structs below are the hand-maintained mirrors; the
//! matching schemas live in `jsglue-layout`'s `mirrors.toml` and both must change
//! together.
//!
//! A native is called with `vp` pointing at `[callee, this, args...]`; `argv_` points at
//! the first argument, so the callee and `this` sit at `argv_[-2]` and `argv_[-1]`, and
//! the return value overwrites the callee slot.

use std::cell::Cell;

use crate::context::JSContext;
use crate::handle::{HandleValue, MutableHandleValue};
use crate::opaque::{JSJitInfo, JSObject};
use crate::value::{JSWhyMagic, Value};

/// Signature of a native function.
pub type JSNative = unsafe extern "C" fn(cx: *mut JSContext, argc: u32, vp: *mut Value) -> bool;

/// A native plus its optional JIT metadata.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct JSNativeWrapper {
    pub op: Option<JSNative>,
    pub info: *const JSJitInfo,
}

unsafe impl Sync for JSNativeWrapper {}

impl JSNativeWrapper {
    pub const fn zeroed() -> Self {
        Self {
            op: None,
            info: std::ptr::null(),
        }
    }

    pub fn is_zeroed(&self) -> bool {
        let JSNativeWrapper { op, info } = *self;
        op.is_none() && info.is_null()
    }
}

pub mod detail {
    //! Debug-build bookkeeping of whether a native touched its return value.

    use super::Cell;

    /// Records the first use of `rval()`.
    #[derive(Debug, Default)]
    #[repr(C)]
    pub struct IncludeUsedRval {
        used_rval_: Cell<bool>,
    }

    impl IncludeUsedRval {
        pub fn is_used_rval(&self) -> bool {
            self.used_rval_.get()
        }

        pub fn set_used_rval(&self) {
            self.used_rval_.set(true);
        }

        pub fn clear_used_rval(&self) {
            self.used_rval_.set(false);
        }
    }

    /// Placeholder with the size of an empty C++ class.
    #[derive(Debug, Default)]
    #[repr(C)]
    pub struct NoUsedRval {
        _unused: u8,
    }

    impl NoUsedRval {
        pub fn is_used_rval(&self) -> bool {
            false
        }

        pub fn set_used_rval(&self) {}

        pub fn clear_used_rval(&self) {}
    }
}

// Bitfields are allocated from the least significant bit on little-endian targets and
// from the most significant bit on big-endian ones.
#[cfg(target_endian = "little")]
const CONSTRUCTING_BIT: u8 = 0x01;
#[cfg(target_endian = "little")]
const IGNORES_RETURN_VALUE_BIT: u8 = 0x02;
#[cfg(target_endian = "big")]
const CONSTRUCTING_BIT: u8 = 0x80;
#[cfg(target_endian = "big")]
const IGNORES_RETURN_VALUE_BIT: u8 = 0x40;

fn pack_flags(constructing: bool, ignores_return_value: bool) -> u8 {
    let mut bits = 0;
    if constructing {
        bits |= CONSTRUCTING_BIT;
    }
    if ignores_return_value {
        bits |= IGNORES_RETURN_VALUE_BIT;
    }
    bits
}

/// Arguments of a native call.
#[derive(Debug)]
#[repr(C)]
pub struct CallArgs {
    pub argv_: *mut Value,
    pub argc_: u32,
    /// `constructing_:1`, `ignoresReturnValue_:1`.
    pub _bitfield_1: u8,
    #[cfg(feature = "debug-engine")]
    pub want_used_rval_: detail::IncludeUsedRval,
}

impl CallArgs {
    /// # Safety
    ///
    /// `argv` must point just past a `[callee, this]` pair and be followed by `argc`
    /// rooted values, plus a `new.target` slot when `constructing`.
    pub unsafe fn new(argv: *mut Value, argc: u32, constructing: bool, ignores_return_value: bool) -> Self {
        Self {
            argv_: argv,
            argc_: argc,
            _bitfield_1: pack_flags(constructing, ignores_return_value),
            #[cfg(feature = "debug-engine")]
            want_used_rval_: detail::IncludeUsedRval::default(),
        }
    }

    /// Decode the `vp` array handed to a native. `this` holding the `IsConstructing`
    /// magic value marks a constructor call.
    ///
    /// # Safety
    ///
    /// `vp` must point at `argc + 2` rooted values, plus `new.target` when constructing.
    pub unsafe fn from_vp(vp: *mut Value, argc: u32) -> Self {
        let constructing = (*vp.add(1)).is_magic_why(JSWhyMagic::IsConstructing);
        Self::new(vp.add(2), argc, constructing, false)
    }

    #[inline]
    pub fn argc(&self) -> u32 {
        self.argc_
    }

    #[inline]
    pub fn constructing(&self) -> bool {
        self._bitfield_1 & CONSTRUCTING_BIT != 0
    }

    #[inline]
    pub fn ignores_return_value(&self) -> bool {
        self._bitfield_1 & IGNORES_RETURN_VALUE_BIT != 0
    }

    pub fn set_ignores_return_value(&mut self, ignores: bool) {
        if ignores {
            self._bitfield_1 |= IGNORES_RETURN_VALUE_BIT;
        } else {
            self._bitfield_1 &= !IGNORES_RETURN_VALUE_BIT;
        }
    }

    /// Whether `rval()` has been called. Always false without `debug-engine`.
    pub fn is_used_rval(&self) -> bool {
        #[cfg(feature = "debug-engine")]
        {
            self.want_used_rval_.is_used_rval()
        }
        #[cfg(not(feature = "debug-engine"))]
        {
            false
        }
    }

    /// Argument `i`, or `undefined` past the end.
    #[inline]
    pub fn get(&self, i: u32) -> HandleValue {
        if i < self.argc_ {
            unsafe { HandleValue::from_marked_location(self.argv_.add(i as usize)) }
        } else {
            HandleValue::undefined()
        }
    }

    /// # Panics
    ///
    /// Panics if `i >= argc`.
    #[inline]
    pub fn index(&self, i: u32) -> HandleValue {
        assert!(i < self.argc_, "argument {i} out of range ({})", self.argc_);
        unsafe { HandleValue::from_marked_location(self.argv_.add(i as usize)) }
    }

    /// # Panics
    ///
    /// Panics if `i >= argc`.
    #[inline]
    pub fn index_mut(&self, i: u32) -> MutableHandleValue {
        assert!(i < self.argc_, "argument {i} out of range ({})", self.argc_);
        unsafe { MutableHandleValue::from_marked_location(self.argv_.add(i as usize)) }
    }

    /// The return value slot. Shares storage with the callee.
    #[inline]
    pub fn rval(&self) -> MutableHandleValue {
        #[cfg(feature = "debug-engine")]
        self.want_used_rval_.set_used_rval();
        unsafe { MutableHandleValue::from_marked_location(self.argv_.offset(-2)) }
    }

    #[inline]
    pub fn thisv(&self) -> HandleValue {
        unsafe { HandleValue::from_marked_location(self.argv_.offset(-1)) }
    }

    #[inline]
    pub fn calleev(&self) -> HandleValue {
        unsafe { HandleValue::from_marked_location(self.argv_.offset(-2)) }
    }

    #[inline]
    pub fn callee(&self) -> *mut JSObject {
        self.calleev().to_object()
    }

    /// # Panics
    ///
    /// Panics unless this is a constructor call.
    #[inline]
    pub fn new_target(&self) -> MutableHandleValue {
        assert!(self.constructing(), "new.target is only present for constructor calls");
        unsafe { MutableHandleValue::from_marked_location(self.argv_.add(self.argc_ as usize)) }
    }
}

/// Arguments of a JIT-invoked DOM method.
#[derive(Debug)]
#[repr(C)]
pub struct JitMethodCallArgs {
    pub argv_: *mut Value,
    pub argc_: u32,
    /// `constructing_:1`, `ignoresReturnValue_:1`.
    pub _bitfield_1: u8,
    #[cfg(feature = "debug-engine")]
    pub want_used_rval_: detail::NoUsedRval,
}

impl JitMethodCallArgs {
    /// Borrow the arguments of an ordinary call.
    pub fn from_call_args(args: &CallArgs) -> Self {
        Self {
            argv_: args.argv_,
            argc_: args.argc_,
            _bitfield_1: args._bitfield_1,
            #[cfg(feature = "debug-engine")]
            want_used_rval_: detail::NoUsedRval::default(),
        }
    }

    #[inline]
    pub fn argc(&self) -> u32 {
        self.argc_
    }

    #[inline]
    pub fn get(&self, i: u32) -> HandleValue {
        if i < self.argc_ {
            unsafe { HandleValue::from_marked_location(self.argv_.add(i as usize)) }
        } else {
            HandleValue::undefined()
        }
    }

    /// # Panics
    ///
    /// Panics if `i >= argc`.
    #[inline]
    pub fn index(&self, i: u32) -> HandleValue {
        assert!(i < self.argc_, "argument {i} out of range ({})", self.argc_);
        unsafe { HandleValue::from_marked_location(self.argv_.add(i as usize)) }
    }

    /// # Panics
    ///
    /// Panics if `i >= argc`.
    #[inline]
    pub fn index_mut(&self, i: u32) -> MutableHandleValue {
        assert!(i < self.argc_, "argument {i} out of range ({})", self.argc_);
        unsafe { MutableHandleValue::from_marked_location(self.argv_.add(i as usize)) }
    }

    #[inline]
    pub fn rval(&self) -> MutableHandleValue {
        unsafe { MutableHandleValue::from_marked_location(self.argv_.offset(-2)) }
    }
}

/// The single argument of a JIT-invoked setter.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct JitSetterCallArgs {
    pub _base: MutableHandleValue,
}

impl JitSetterCallArgs {
    pub fn new(base: MutableHandleValue) -> Self {
        Self { _base: base }
    }

    /// # Panics
    ///
    /// Panics unless `i == 0`.
    #[inline]
    pub fn get(&self, i: u32) -> HandleValue {
        assert!(i == 0, "setters take exactly one argument");
        self._base.handle()
    }
}

#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(std::mem::size_of::<CallArgs>() == 16);
    assert!(std::mem::align_of::<CallArgs>() == 8);
    assert!(std::mem::size_of::<JitMethodCallArgs>() == 16);
    assert!(std::mem::align_of::<JitMethodCallArgs>() == 8);
};

#[cfg(target_pointer_width = "32")]
const _: () = {
    assert!(std::mem::size_of::<CallArgs>() == 12);
    assert!(std::mem::align_of::<CallArgs>() == 4);
    assert!(std::mem::size_of::<JitMethodCallArgs>() == 12);
    assert!(std::mem::align_of::<JitMethodCallArgs>() == 4);
};

// The used-rval marker sits right after the flag byte: 13 on 64-bit, 9 on 32-bit.
#[cfg(feature = "debug-engine")]
const _: () = {
    let marker = std::mem::size_of::<usize>() + 5;
    assert!(std::mem::offset_of!(CallArgs, want_used_rval_) == marker);
    assert!(std::mem::offset_of!(JitMethodCallArgs, want_used_rval_) == marker);
};
