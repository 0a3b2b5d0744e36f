//! The engine's tagged value.
//!
//! A [`Value`] is a 64-bit discriminated union. On 64-bit targets the tag occupies the top
//! 17 bits and pointers live in the low 47 ("punbox"). On 32-bit targets the upper word
//! is the tag and the lower word the payload ("nunbox"). Every bit pattern below the
//! smallest tag is a double, so NaNs are canonicalised on the way in.

use std::fmt;

use crate::opaque::{JSObject, JSString, Symbol};

/// Discriminant stored in a value's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Double = 0x00,
    Int32 = 0x01,
    Undefined = 0x02,
    Boolean = 0x03,
    Magic = 0x04,
    String = 0x05,
    Symbol = 0x06,
    PrivateGcThing = 0x07,
    Null = 0x08,
    Object = 0x0c,
}

impl ValueType {
    fn from_type_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0x00 => Self::Double,
            0x01 => Self::Int32,
            0x02 => Self::Undefined,
            0x03 => Self::Boolean,
            0x04 => Self::Magic,
            0x05 => Self::String,
            0x06 => Self::Symbol,
            0x07 => Self::PrivateGcThing,
            0x08 => Self::Null,
            0x0c => Self::Object,
            _ => return None,
        })
    }
}

/// Reason carried by a magic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum JSWhyMagic {
    ElementsHole = 0,
    NoIterValue = 1,
    GeneratorClosing = 2,
    NoConstant = 3,
    ThisPoison = 4,
    ArgPoison = 5,
    SerializeNoNode = 6,
    LazyArguments = 7,
    OptimizedArguments = 8,
    IsConstructing = 9,
}

#[cfg(target_pointer_width = "64")]
mod encoding {
    use super::ValueType;

    const TAG_SHIFT: u64 = 47;
    const TAG_MAX_DOUBLE: u32 = 0x1_FFF0;
    const SHIFTED_TAG_MAX_DOUBLE: u64 = ((TAG_MAX_DOUBLE as u64) << TAG_SHIFT) | 0xFFFF_FFFF;

    pub(super) const PAYLOAD_MASK: u64 = (1 << TAG_SHIFT) - 1;

    pub(super) const fn pack(ty: ValueType, payload: u64) -> u64 {
        (((TAG_MAX_DOUBLE | ty as u32) as u64) << TAG_SHIFT) | (payload & PAYLOAD_MASK)
    }

    pub(super) const fn is_double(bits: u64) -> bool {
        bits <= SHIFTED_TAG_MAX_DOUBLE
    }

    pub(super) const fn type_bits(bits: u64) -> u8 {
        ((bits >> TAG_SHIFT) as u32 & 0xF) as u8
    }

    pub(super) const fn has_type(bits: u64, ty: ValueType) -> bool {
        (bits >> TAG_SHIFT) as u32 == TAG_MAX_DOUBLE | ty as u32
    }
}

#[cfg(target_pointer_width = "32")]
mod encoding {
    use super::ValueType;

    const TAG_CLEAR: u32 = 0xFFFF_FF80;

    pub(super) const PAYLOAD_MASK: u64 = 0xFFFF_FFFF;

    pub(super) const fn pack(ty: ValueType, payload: u64) -> u64 {
        (((TAG_CLEAR | ty as u32) as u64) << 32) | (payload & PAYLOAD_MASK)
    }

    pub(super) const fn is_double(bits: u64) -> bool {
        (bits >> 32) as u32 <= TAG_CLEAR
    }

    pub(super) const fn type_bits(bits: u64) -> u8 {
        ((bits >> 32) as u32 & 0x7F) as u8
    }

    pub(super) const fn has_type(bits: u64, ty: ValueType) -> bool {
        (bits >> 32) as u32 == TAG_CLEAR | ty as u32
    }
}

const CANONICAL_NAN_BITS: u64 = 0x7FF8_0000_0000_0000;

/// A dynamically-typed script value.
///
/// Two values compare equal iff their bit patterns are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C, align(8))]
pub struct Value {
    bits: u64,
}

impl Value {
    /// Reinterpret raw bits as a value. The bits must come from another `Value`.
    #[inline]
    pub const fn from_raw_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// The raw 64-bit representation.
    #[inline]
    pub const fn as_raw_bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub const fn undefined() -> Self {
        Self::from_raw_bits(encoding::pack(ValueType::Undefined, 0))
    }

    #[inline]
    pub const fn null() -> Self {
        Self::from_raw_bits(encoding::pack(ValueType::Null, 0))
    }

    #[inline]
    pub const fn boolean(b: bool) -> Self {
        Self::from_raw_bits(encoding::pack(ValueType::Boolean, b as u64))
    }

    #[inline]
    pub const fn int32(i: i32) -> Self {
        Self::from_raw_bits(encoding::pack(ValueType::Int32, i as u32 as u64))
    }

    /// A double value. NaN payloads collapse to the canonical NaN.
    #[inline]
    pub fn double(d: f64) -> Self {
        if d.is_nan() {
            Self::from_raw_bits(CANONICAL_NAN_BITS)
        } else {
            Self::from_raw_bits(d.to_bits())
        }
    }

    #[inline]
    pub fn string(s: *mut JSString) -> Self {
        Self::from_gc_pointer(ValueType::String, s as usize)
    }

    #[inline]
    pub fn object(obj: *mut JSObject) -> Self {
        Self::from_gc_pointer(ValueType::Object, obj as usize)
    }

    #[inline]
    pub fn symbol(sym: *mut Symbol) -> Self {
        Self::from_gc_pointer(ValueType::Symbol, sym as usize)
    }

    #[inline]
    pub const fn magic(why: JSWhyMagic) -> Self {
        Self::from_raw_bits(encoding::pack(ValueType::Magic, why as u32 as u64))
    }

    #[inline]
    fn from_gc_pointer(ty: ValueType, addr: usize) -> Self {
        debug_assert_eq!(
            addr as u64 & !encoding::PAYLOAD_MASK,
            0,
            "gc pointer does not fit in the payload"
        );
        Self::from_raw_bits(encoding::pack(ty, addr as u64))
    }

    /// The discriminant of this value.
    pub fn value_type(&self) -> ValueType {
        if encoding::is_double(self.bits) {
            return ValueType::Double;
        }
        // Unknown tags can only come from `from_raw_bits`.
        ValueType::from_type_bits(encoding::type_bits(self.bits))
            .unwrap_or(ValueType::PrivateGcThing)
    }

    #[inline]
    pub const fn is_undefined(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Undefined)
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Null)
    }

    #[inline]
    pub const fn is_null_or_undefined(&self) -> bool {
        self.is_null() || self.is_undefined()
    }

    #[inline]
    pub const fn is_boolean(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Boolean)
    }

    #[inline]
    pub const fn is_int32(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Int32)
    }

    #[inline]
    pub const fn is_double(&self) -> bool {
        encoding::is_double(self.bits)
    }

    #[inline]
    pub const fn is_number(&self) -> bool {
        self.is_int32() || self.is_double()
    }

    #[inline]
    pub const fn is_string(&self) -> bool {
        encoding::has_type(self.bits, ValueType::String)
    }

    #[inline]
    pub const fn is_symbol(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Symbol)
    }

    #[inline]
    pub const fn is_object(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Object)
    }

    #[inline]
    pub const fn is_magic(&self) -> bool {
        encoding::has_type(self.bits, ValueType::Magic)
    }

    /// Whether this is the magic value for `why`.
    #[inline]
    pub const fn is_magic_why(&self, why: JSWhyMagic) -> bool {
        self.is_magic() && (self.bits & encoding::PAYLOAD_MASK) as u32 == why as u32
    }

    /// Read the int32 payload without looking at the tag.
    ///
    /// The result is meaningless unless [`is_int32`](Self::is_int32) holds.
    #[inline]
    pub const fn to_int32(&self) -> i32 {
        self.bits as u32 as i32
    }

    /// Checked counterpart of [`to_int32`](Self::to_int32).
    #[inline]
    pub const fn try_to_int32(&self) -> Option<i32> {
        if self.is_int32() {
            Some(self.to_int32())
        } else {
            None
        }
    }

    /// Read the double payload. Meaningless unless [`is_double`](Self::is_double) holds.
    #[inline]
    pub fn to_double(&self) -> f64 {
        f64::from_bits(self.bits)
    }

    /// Either numeric representation as a double.
    #[inline]
    pub fn to_number(&self) -> f64 {
        if self.is_int32() {
            f64::from(self.to_int32())
        } else {
            self.to_double()
        }
    }

    #[inline]
    pub const fn to_boolean(&self) -> bool {
        self.bits & 1 != 0
    }

    #[inline]
    pub fn to_string(&self) -> *mut JSString {
        self.gc_pointer() as *mut JSString
    }

    #[inline]
    pub fn to_object(&self) -> *mut JSObject {
        self.gc_pointer() as *mut JSObject
    }

    #[inline]
    pub fn to_symbol(&self) -> *mut Symbol {
        self.gc_pointer() as *mut Symbol
    }

    #[inline]
    fn gc_pointer(&self) -> usize {
        (self.bits & encoding::PAYLOAD_MASK) as usize
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::undefined()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type() {
            ValueType::Double => write!(f, "Value::double({})", self.to_double()),
            ValueType::Int32 => write!(f, "Value::int32({})", self.to_int32()),
            ValueType::Undefined => write!(f, "Value::undefined()"),
            ValueType::Null => write!(f, "Value::null()"),
            ValueType::Boolean => write!(f, "Value::boolean({})", self.to_boolean()),
            ValueType::Magic => write!(f, "Value::magic({})", self.bits as u32),
            ValueType::String => write!(f, "Value::string({:#x})", self.gc_pointer()),
            ValueType::Symbol => write!(f, "Value::symbol({:#x})", self.gc_pointer()),
            ValueType::Object => write!(f, "Value::object({:#x})", self.gc_pointer()),
            ValueType::PrivateGcThing => write!(f, "Value({:#018x})", self.bits),
        }
    }
}
