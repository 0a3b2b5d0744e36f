//! Handles: pointers to rooted locations.
//!
//! A handle does not root anything itself; it asserts that whatever it points at is
//! already rooted for as long as the handle is used.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr;

use crate::opaque::JSObject;
use crate::value::Value;

static NULL_VALUE: Value = Value::null();
static UNDEFINED_VALUE: Value = Value::undefined();
const NULL_OBJECT: *mut JSObject = ptr::null_mut();

/// Read-only reference to a rooted `T`.
#[derive(Debug)]
#[repr(C)]
pub struct Handle<T> {
    pub ptr: *const T,
    _marker: PhantomData<T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Handle<T> {
    /// Wrap a pointer to a location that is already rooted.
    ///
    /// # Safety
    ///
    /// `ptr` must stay valid and rooted while the handle is in use.
    pub const unsafe fn from_marked_location(ptr: *const T) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> T
    where
        T: Copy,
    {
        unsafe { *self.ptr }
    }
}

impl<T> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.ptr }
    }
}

/// Mutable reference to a rooted `T`.
#[derive(Debug)]
#[repr(C)]
pub struct MutableHandle<T> {
    pub ptr: *mut T,
    _marker: PhantomData<T>,
}

impl<T> Clone for MutableHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MutableHandle<T> {}

impl<T> MutableHandle<T> {
    /// # Safety
    ///
    /// `ptr` must stay valid and rooted while the handle is in use.
    pub const unsafe fn from_marked_location(ptr: *mut T) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// A read-only handle to the same location.
    pub fn handle(&self) -> Handle<T> {
        unsafe { Handle::from_marked_location(self.ptr) }
    }

    pub fn get(&self) -> T
    where
        T: Copy,
    {
        unsafe { *self.ptr }
    }

    pub fn set(&self, v: T)
    where
        T: Copy,
    {
        unsafe { *self.ptr = v }
    }
}

impl<T> Deref for MutableHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.ptr }
    }
}

impl<T> DerefMut for MutableHandle<T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.ptr }
    }
}

pub type HandleValue = Handle<Value>;
pub type MutableHandleValue = MutableHandle<Value>;
pub type HandleObject = Handle<*mut JSObject>;

impl Handle<Value> {
    pub fn null() -> HandleValue {
        unsafe { Handle::from_marked_location(&NULL_VALUE) }
    }

    pub fn undefined() -> HandleValue {
        unsafe { Handle::from_marked_location(&UNDEFINED_VALUE) }
    }
}

impl Handle<*mut JSObject> {
    pub fn null() -> HandleObject {
        unsafe { Handle::from_marked_location(&NULL_OBJECT) }
    }
}

/// A borrowed run of rooted values.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct HandleValueArray {
    pub length_: usize,
    pub elements_: *const Value,
}

impl HandleValueArray {
    /// # Safety
    ///
    /// Every value in `values` must be rooted while the array is in use.
    pub unsafe fn from_rooted_slice(values: &[Value]) -> Self {
        Self {
            length_: values.len(),
            elements_: values.as_ptr(),
        }
    }

    pub const fn empty() -> Self {
        Self {
            length_: 0,
            elements_: ptr::null(),
        }
    }

    pub fn len(&self) -> usize {
        self.length_
    }

    pub fn is_empty(&self) -> bool {
        self.length_ == 0
    }

    /// The value at `i`, if in range.
    pub fn get(&self, i: usize) -> Option<HandleValue> {
        if i < self.length_ {
            Some(unsafe { Handle::from_marked_location(self.elements_.add(i)) })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_handles() {
        assert!(HandleValue::null().is_null());
        assert!(HandleValue::undefined().get().is_undefined());
        assert!(HandleObject::null().get().is_null());
    }

    #[test]
    fn mutable_handle_writes_through() {
        let mut slot = Value::int32(1);
        let handle = unsafe { MutableHandleValue::from_marked_location(&mut slot) };
        handle.set(Value::int32(5));
        assert_eq!(handle.handle().get().to_int32(), 5);
        assert_eq!(slot, Value::int32(5));
    }

    #[test]
    fn value_array_bounds() {
        let values = [Value::int32(1), Value::boolean(true)];
        let array = unsafe { HandleValueArray::from_rooted_slice(&values) };
        assert_eq!(array.len(), 2);
        assert!(array.get(1).unwrap().is_boolean());
        assert!(array.get(2).is_none());
        assert!(HandleValueArray::empty().is_empty());
    }
}
