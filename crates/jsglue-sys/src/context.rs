//! Context and zone handles.
//!
//! A context is created and destroyed by the engine. Embedders only ever see the
//! [`ContextFriendFields`] prefix, which the engine guarantees to sit at offset zero of
//! every context. Likewise a [`Zone`] begins with its [`shadow::Zone`] view.
//!
//! Every function taking a context requires that the context is live and owned by the
//! calling thread.

use std::os::raw::c_void;
use std::ptr;

use crate::opaque::{JSCompartment, JSRuntime, JSTracer};
use crate::rooting::Rooted;

/// Kinds of GC roots, one stack-root list per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum RootKind {
    BaseShape = 0,
    JitCode = 1,
    LazyScript = 2,
    Object = 3,
    ObjectGroup = 4,
    Script = 5,
    Scope = 6,
    Shape = 7,
    String = 8,
    Symbol = 9,
    Id = 10,
    Value = 11,
    Traceable = 12,
}

impl RootKind {
    /// Number of root kinds.
    pub const LIMIT: usize = 13;
}

/// Heads of the per-kind stack root lists.
pub type StackRoots = [*mut Rooted<*mut c_void>; RootKind::LIMIT];

/// Root lists owned by a context with no zone entered.
#[derive(Debug)]
#[repr(C)]
pub struct RootLists {
    pub stack_roots_: StackRoots,
}

impl RootLists {
    pub const fn new() -> Self {
        Self {
            stack_roots_: [ptr::null_mut(); RootKind::LIMIT],
        }
    }
}

impl Default for RootLists {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields of a context readable without engine internals.
#[derive(Debug)]
#[repr(C)]
pub struct ContextFriendFields {
    pub runtime_: *mut JSRuntime,
    pub compartment_: *mut JSCompartment,
    pub zone_: *mut Zone,
    pub roots: RootLists,
}

/// An execution context.
///
/// Real contexts are engine allocations that merely start with [`ContextFriendFields`];
/// this type exposes only that prefix.
#[derive(Debug)]
#[repr(C)]
pub struct JSContext {
    friend: ContextFriendFields,
}

impl JSContext {
    /// A context with no compartment or zone entered.
    ///
    /// Engines hand out contexts themselves; this exists for hosts that embed a stand-in
    /// runtime, such as test harnesses.
    pub fn new(runtime: *mut JSRuntime) -> Self {
        Self {
            friend: ContextFriendFields {
                runtime_: runtime,
                compartment_: ptr::null_mut(),
                zone_: ptr::null_mut(),
                roots: RootLists::new(),
            },
        }
    }

    /// Enter `zone`, or leave any zone when null.
    pub fn set_zone(&mut self, zone: *mut Zone) {
        self.friend.zone_ = zone;
    }
}

/// The friend fields of `cx`.
///
/// # Safety
///
/// `cx` must be a live context.
#[inline]
pub unsafe fn friend_fields(cx: *mut JSContext) -> *mut ContextFriendFields {
    cx as *mut ContextFriendFields
}

/// The runtime `cx` belongs to.
///
/// # Safety
///
/// `cx` must be a live context.
#[inline]
pub unsafe fn get_runtime(cx: *mut JSContext) -> *mut JSRuntime {
    (*friend_fields(cx)).runtime_
}

/// An engine memory region. Only reachable through pointers; see [`shadow::Zone`].
#[repr(C)]
pub struct Zone {
    _private: [u8; 0],
    _pinned: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

impl Zone {
    /// View `zone` through its public prefix.
    ///
    /// # Safety
    ///
    /// `zone` must be non-null and point to a live zone.
    #[inline]
    pub unsafe fn as_shadow_zone(zone: *mut Zone) -> *mut shadow::Zone {
        zone as *mut shadow::Zone
    }
}

pub mod shadow {
    //! Public prefixes of engine-private types.

    use super::*;

    /// The introspectable prefix of a [`Zone`](super::Zone).
    #[derive(Debug)]
    #[repr(C)]
    pub struct Zone {
        pub runtime_: *mut JSRuntime,
        pub barrier_tracer_: *mut JSTracer,
        pub needs_incremental_barrier_: bool,
        pub stack_roots_: StackRoots,
    }

    impl Zone {
        /// A zone prefix with barriers off and empty root lists.
        pub fn new(runtime: *mut JSRuntime, barrier_tracer: *mut JSTracer) -> Self {
            Self {
                runtime_: runtime,
                barrier_tracer_: barrier_tracer,
                needs_incremental_barrier_: false,
                stack_roots_: [ptr::null_mut(); RootKind::LIMIT],
            }
        }

        pub fn needs_incremental_barrier(&self) -> bool {
            self.needs_incremental_barrier_
        }

        /// The zone this prefix belongs to.
        #[inline]
        pub fn as_zone(this: *mut Zone) -> *mut super::Zone {
            this as *mut super::Zone
        }
    }
}
