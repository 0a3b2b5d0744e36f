//! Stack rooting for GC things held in Rust locals.
//!
//! A [`Rooted`] links itself into the root list of its kind, found on the context's
//! current zone or, when no zone is entered, on the context itself. Lists are strictly
//! LIFO.

use std::os::raw::c_void;
use std::ptr;

use crate::context::{self, JSContext, RootKind, Zone};
use crate::id::{jsid, PropertyDescriptor};
use crate::opaque::{JSFlatString, JSFunction, JSObject, JSScript, JSString, Symbol};
use crate::value::Value;

/// Maps a rootable Rust type to its root list.
pub trait GcRootKind {
    const KIND: RootKind;
}

impl GcRootKind for *mut JSObject {
    const KIND: RootKind = RootKind::Object;
}

impl GcRootKind for *mut JSFunction {
    const KIND: RootKind = RootKind::Object;
}

impl GcRootKind for *mut JSString {
    const KIND: RootKind = RootKind::String;
}

impl GcRootKind for *mut JSFlatString {
    const KIND: RootKind = RootKind::String;
}

impl GcRootKind for *mut Symbol {
    const KIND: RootKind = RootKind::Symbol;
}

impl GcRootKind for *mut JSScript {
    const KIND: RootKind = RootKind::Script;
}

impl GcRootKind for Value {
    const KIND: RootKind = RootKind::Value;
}

impl GcRootKind for jsid {
    const KIND: RootKind = RootKind::Id;
}

impl GcRootKind for PropertyDescriptor {
    const KIND: RootKind = RootKind::Traceable;
}

/// A GC thing registered as a stack root while linked.
#[derive(Debug)]
#[repr(C)]
pub struct Rooted<T> {
    pub stack: *mut *mut Rooted<*mut c_void>,
    pub prev: *mut Rooted<*mut c_void>,
    pub ptr: T,
}

impl<T> Rooted<T> {
    /// A root holding `initial` that is not yet linked anywhere.
    pub fn new_unrooted(initial: T) -> Self {
        Self {
            stack: ptr::null_mut(),
            prev: ptr::null_mut(),
            ptr: initial,
        }
    }

    pub fn is_linked(&self) -> bool {
        !self.stack.is_null()
    }

    /// Push onto `cx`'s root list for `T`.
    ///
    /// # Safety
    ///
    /// `cx` must be live and owned by the calling thread, and `self` must not move until
    /// [`remove_from_root_stack`](Self::remove_from_root_stack) is called.
    pub unsafe fn add_to_root_stack(&mut self, cx: *mut JSContext)
    where
        T: GcRootKind,
    {
        let friend = context::friend_fields(cx);
        let zone = (*friend).zone_;
        let roots = if zone.is_null() {
            &mut (*friend).roots.stack_roots_
        } else {
            &mut (*Zone::as_shadow_zone(zone)).stack_roots_
        };

        let stack: *mut *mut Rooted<*mut c_void> = &mut roots[T::KIND as usize];
        self.stack = stack;
        self.prev = *stack;
        *stack = self as *mut Self as *mut Rooted<*mut c_void>;
    }

    /// Pop from the root list this root was pushed onto.
    ///
    /// # Safety
    ///
    /// The context or zone that owns the list must still be live.
    ///
    /// # Panics
    ///
    /// Panics if this root is not linked or is not the top of its list.
    pub unsafe fn remove_from_root_stack(&mut self) {
        assert!(self.is_linked(), "root is not linked");
        assert!(
            *self.stack == self as *mut Self as *mut Rooted<*mut c_void>,
            "roots must be removed in LIFO order"
        );
        *self.stack = self.prev;
        self.stack = ptr::null_mut();
        self.prev = ptr::null_mut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::shadow;

    fn head(cx: &JSContext, kind: RootKind) -> *mut Rooted<*mut c_void> {
        let friend = cx as *const JSContext as *const context::ContextFriendFields;
        unsafe { (*friend).roots.stack_roots_[kind as usize] }
    }

    #[test]
    fn roots_link_into_context_lists() {
        let mut cx = JSContext::new(ptr::null_mut());
        let mut outer = Rooted::new_unrooted(Value::int32(1));
        let mut inner = Rooted::new_unrooted(Value::int32(2));

        unsafe {
            outer.add_to_root_stack(&mut cx);
            inner.add_to_root_stack(&mut cx);
        }
        assert!(outer.is_linked());
        assert_eq!(head(&cx, RootKind::Value) as usize, &inner as *const _ as usize);
        assert_eq!(inner.prev as usize, &outer as *const _ as usize);

        unsafe {
            inner.remove_from_root_stack();
            outer.remove_from_root_stack();
        }
        assert!(head(&cx, RootKind::Value).is_null());
        assert!(!outer.is_linked());
    }

    #[test]
    fn roots_prefer_the_entered_zone() {
        let mut shadow_zone = shadow::Zone::new(ptr::null_mut(), ptr::null_mut());
        let mut cx = JSContext::new(ptr::null_mut());
        cx.set_zone(shadow::Zone::as_zone(&mut shadow_zone));

        let mut root = Rooted::new_unrooted(ptr::null_mut::<JSObject>());
        unsafe { root.add_to_root_stack(&mut cx) };

        let zone_head = shadow_zone.stack_roots_[RootKind::Object as usize];
        assert_eq!(zone_head as usize, &root as *const _ as usize);
        assert!(head(&cx, RootKind::Object).is_null());

        unsafe { root.remove_from_root_stack() };
        assert!(shadow_zone.stack_roots_[RootKind::Object as usize].is_null());
    }

    #[test]
    fn ids_and_descriptors_have_their_own_lists() {
        let mut cx = JSContext::new(ptr::null_mut());
        let mut id = Rooted::new_unrooted(jsid::default());
        let mut desc = Rooted::new_unrooted(PropertyDescriptor::default());

        unsafe {
            id.add_to_root_stack(&mut cx);
            desc.add_to_root_stack(&mut cx);
        }
        assert!(id.ptr.is_void());
        assert_eq!(head(&cx, RootKind::Id) as usize, &id as *const _ as usize);
        assert_eq!(head(&cx, RootKind::Traceable) as usize, &desc as *const _ as usize);
        assert!(desc.prev.is_null());
        assert!(head(&cx, RootKind::Value).is_null());

        unsafe {
            desc.remove_from_root_stack();
            id.remove_from_root_stack();
        }
        assert!(head(&cx, RootKind::Id).is_null());
        assert!(head(&cx, RootKind::Traceable).is_null());
    }

    #[test]
    #[should_panic(expected = "LIFO")]
    fn out_of_order_removal_panics() {
        let mut cx = JSContext::new(ptr::null_mut());
        let mut first = Rooted::new_unrooted(ptr::null_mut::<JSString>());
        let mut second = Rooted::new_unrooted(ptr::null_mut::<JSString>());
        unsafe {
            first.add_to_root_stack(&mut cx);
            second.add_to_root_stack(&mut cx);
            first.remove_from_root_stack();
        }
    }

    #[test]
    #[should_panic(expected = "not linked")]
    fn removing_an_unlinked_root_panics() {
        let mut root = Rooted::new_unrooted(Value::int32(1));
        unsafe { root.remove_from_root_stack() };
    }
}
