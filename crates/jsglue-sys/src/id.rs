//! Property keys.
//!
//! A [`jsid`] is a pointer-sized word whose low three bits are a tag: zero for an atom
//! pointer, a set low bit for a non-negative int, `0b100` for a symbol pointer. The void
//! id means "no property" and is what a fresh id holds.

use std::fmt;

use crate::context::JSContext;
use crate::handle::{Handle, MutableHandleValue};
use crate::opaque::{JSObject, JSString, Symbol};
use crate::value::Value;

const TYPE_STRING: usize = 0x0;
const TYPE_INT: usize = 0x1;
const TYPE_VOID: usize = 0x2;
const TYPE_SYMBOL: usize = 0x4;
const TYPE_MASK: usize = 0x7;

/// Largest int an id can carry inline.
pub const JSID_INT_MAX: i32 = i32::MAX;

/// A property key.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct jsid {
    pub asBits: usize,
}

/// The id naming no property.
pub const JSID_VOID: jsid = jsid { asBits: TYPE_VOID };
/// Placeholder id for empty hash entries.
pub const JSID_EMPTY: jsid = jsid { asBits: TYPE_SYMBOL };

impl jsid {
    /// An int id, or `None` for negative ints.
    pub const fn int(i: i32) -> Option<Self> {
        if i < 0 {
            return None;
        }
        Some(Self {
            asBits: ((i as usize) << 1) | TYPE_INT,
        })
    }

    /// # Safety
    ///
    /// `s` must be an atom, and atoms are at least 8-byte aligned.
    pub unsafe fn string(s: *mut JSString) -> Self {
        debug_assert_eq!(s as usize & TYPE_MASK, 0, "misaligned atom");
        Self { asBits: s as usize }
    }

    /// # Safety
    ///
    /// `sym` must be a live, 8-byte aligned symbol.
    pub unsafe fn symbol(sym: *mut Symbol) -> Self {
        debug_assert_eq!(sym as usize & TYPE_MASK, 0, "misaligned symbol");
        Self {
            asBits: sym as usize | TYPE_SYMBOL,
        }
    }

    pub const fn is_void(&self) -> bool {
        self.asBits == TYPE_VOID
    }

    pub const fn is_empty(&self) -> bool {
        self.asBits == TYPE_SYMBOL
    }

    pub const fn is_int(&self) -> bool {
        self.asBits & TYPE_INT != 0
    }

    pub const fn is_string(&self) -> bool {
        self.asBits & TYPE_MASK == TYPE_STRING
    }

    pub const fn is_symbol(&self) -> bool {
        self.asBits & TYPE_MASK == TYPE_SYMBOL && !self.is_empty()
    }

    /// The int payload; only meaningful when [`is_int`](Self::is_int).
    pub const fn to_int(&self) -> i32 {
        (self.asBits >> 1) as u32 as i32
    }

    pub fn to_atom(&self) -> *mut JSString {
        debug_assert!(self.is_string());
        self.asBits as *mut JSString
    }

    pub fn to_symbol(&self) -> *mut Symbol {
        debug_assert!(self.is_symbol());
        (self.asBits & !TYPE_MASK) as *mut Symbol
    }
}

impl Default for jsid {
    fn default() -> Self {
        JSID_VOID
    }
}

impl fmt::Debug for jsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_void() {
            write!(f, "jsid(void)")
        } else if self.is_empty() {
            write!(f, "jsid(empty)")
        } else if self.is_int() {
            write!(f, "jsid({})", self.to_int())
        } else if self.is_symbol() {
            write!(f, "jsid(symbol {:#x})", self.to_symbol() as usize)
        } else {
            write!(f, "jsid(atom {:#x})", self.asBits)
        }
    }
}

pub type HandleId = Handle<jsid>;

/// Outcome of a property operation, either success or an error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ObjectOpResult {
    pub code_: usize,
}

impl ObjectOpResult {
    pub const OK: usize = 0;

    pub const fn succeeded(&self) -> bool {
        self.code_ == Self::OK
    }
}

pub type JSGetterOp = unsafe extern "C" fn(
    cx: *mut JSContext,
    obj: Handle<*mut JSObject>,
    id: HandleId,
    vp: MutableHandleValue,
) -> bool;

pub type JSSetterOp = unsafe extern "C" fn(
    cx: *mut JSContext,
    obj: Handle<*mut JSObject>,
    id: HandleId,
    vp: MutableHandleValue,
    result: *mut ObjectOpResult,
) -> bool;

/// A property's attributes, accessors and value, as returned by descriptor lookups.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct PropertyDescriptor {
    pub obj: *mut JSObject,
    pub attrs: u32,
    pub getter: Option<JSGetterOp>,
    pub setter: Option<JSSetterOp>,
    pub value: Value,
}

impl Default for PropertyDescriptor {
    fn default() -> Self {
        Self {
            obj: std::ptr::null_mut(),
            attrs: 0,
            getter: None,
            setter: None,
            value: Value::undefined(),
        }
    }
}

impl PropertyDescriptor {
    /// Whether a lookup found nothing.
    pub fn is_absent(&self) -> bool {
        self.obj.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn fresh_ids_are_void() {
        let id = jsid::default();
        assert!(id.is_void());
        assert!(!id.is_int() && !id.is_string() && !id.is_symbol());
        assert_eq!(id, JSID_VOID);
        assert_eq!(format!("{id:?}"), "jsid(void)");
    }

    #[test]
    fn int_ids_keep_their_value() {
        for i in [0, 1, 42, JSID_INT_MAX] {
            let id = jsid::int(i).unwrap();
            assert!(id.is_int());
            assert_eq!(id.to_int(), i);
        }
        assert!(jsid::int(-1).is_none());
    }

    #[test]
    fn pointer_ids_are_tagged() {
        let atom = 0x7f00_b000usize as *mut JSString;
        let id = unsafe { jsid::string(atom) };
        assert!(id.is_string() && !id.is_int());
        assert_eq!(id.to_atom(), atom);

        let sym = 0x7f00_c000usize as *mut Symbol;
        let id = unsafe { jsid::symbol(sym) };
        assert!(id.is_symbol() && !id.is_string());
        assert_eq!(id.to_symbol(), sym);

        assert!(JSID_EMPTY.is_empty() && !JSID_EMPTY.is_symbol());
    }

    #[test]
    fn id_is_pointer_sized() {
        assert_eq!(mem::size_of::<jsid>(), mem::size_of::<usize>());
        assert_eq!(mem::align_of::<jsid>(), mem::align_of::<usize>());
    }

    #[test]
    fn default_descriptor_is_absent() {
        let desc = PropertyDescriptor::default();
        assert!(desc.is_absent());
        assert!(desc.getter.is_none() && desc.setter.is_none());
        assert!(desc.value.is_undefined());
    }
}
