//! Engine-owned types that are only ever handled through pointers.
//!
//! None of these can be constructed, moved or inspected from Rust; their layout is private
//! to the engine. They exist so that pointer types on the boundary are distinct.

macro_rules! opaque_types {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
                _pinned: ::std::marker::PhantomData<(*mut u8, ::std::marker::PhantomPinned)>,
            }
        )*
    };
}

opaque_types! {
    /// Per-process engine runtime.
    JSRuntime;
    /// A compartment: the unit of same-origin isolation.
    JSCompartment;
    /// A GC tracer passed to trace hooks.
    JSTracer;
    /// A string, possibly a rope.
    JSString;
    /// A linear, flat string.
    JSFlatString;
    /// A script object.
    JSObject;
    /// A function object.
    JSFunction;
    /// A compiled script.
    JSScript;
    /// A `Symbol` primitive.
    Symbol;
    /// JIT metadata attached to native functions.
    JSJitInfo;
}
