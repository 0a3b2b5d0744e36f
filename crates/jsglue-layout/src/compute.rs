//! C++ record layout for mirror schemas.
//!
//! Follows the Itanium C++ ABI for the constructs mirrors use: natural alignment capped
//! at the word size, pointer = word size, bitfields allocated in memory order within a
//! storage unit of their declared type and never straddling an alignment unit of that
//! type, and a non-bitfield member starting at the next byte that satisfies its
//! alignment.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::schema::{MirrorSchema, OpaqueType, Variant};

/// Byte order of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endianness {
    Little,
    Big,
}

/// The properties of a target that layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Target {
    /// Pointer width in bits (32 or 64).
    pub word_bits: u32,
    pub endian: Endianness,
}

impl Target {
    /// 64-bit little-endian.
    pub const LP64: Target = Target::new(64, Endianness::Little);
    /// 32-bit little-endian.
    pub const ILP32: Target = Target::new(32, Endianness::Little);

    pub const fn new(word_bits: u32, endian: Endianness) -> Self {
        Self { word_bits, endian }
    }

    /// The target this crate was compiled for.
    pub fn host() -> Self {
        let endian = if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        };
        Self::new(usize::BITS, endian)
    }

    pub fn word_bytes(&self) -> u64 {
        u64::from(self.word_bits / 8)
    }

    /// Reject word sizes layout is not defined for.
    pub fn validate(&self) -> Result<()> {
        match self.word_bits {
            32 | 64 => Ok(()),
            word_bits => Err(LayoutError::UnsupportedWordSize { word_bits }),
        }
    }
}

/// Size and alignment of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeSize {
    /// Size in bytes.
    pub size_bytes: u64,
    /// Required alignment in bytes.
    pub alignment_bytes: u64,
}

/// A resolved C++ type spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub size: TypeSize,
    /// Integral types may be bitfields.
    pub integral: bool,
}

fn scalar(bytes: u64, target: Target, integral: bool) -> ResolvedType {
    ResolvedType {
        size: TypeSize {
            size_bytes: bytes,
            alignment_bytes: bytes.min(target.word_bytes()),
        },
        integral,
    }
}

/// Resolve a C++ type spelling against the builtin scalars and the declared opaque types.
pub fn resolve_type(spelling: &str, types: &[OpaqueType], target: Target) -> Result<ResolvedType> {
    target.validate()?;
    let spelling = spelling.trim();
    if spelling.ends_with('*') {
        return Ok(scalar(target.word_bytes(), target, false));
    }

    let word = target.word_bytes();
    let resolved = match spelling {
        "bool" | "char" | "signed char" | "unsigned char" | "int8_t" | "uint8_t" => scalar(1, target, true),
        "short" | "unsigned short" | "int16_t" | "uint16_t" | "char16_t" => scalar(2, target, true),
        "int" | "unsigned" | "unsigned int" | "int32_t" | "uint32_t" | "char32_t" => scalar(4, target, true),
        "long" | "unsigned long" | "size_t" | "intptr_t" | "uintptr_t" => scalar(word, target, true),
        "long long" | "unsigned long long" | "int64_t" | "uint64_t" => scalar(8, target, true),
        "float" => scalar(4, target, false),
        "double" => scalar(8, target, false),
        other => match types.iter().find(|t| t.name == other) {
            Some(opaque) => ResolvedType {
                size: TypeSize {
                    size_bytes: opaque.size,
                    alignment_bytes: opaque.align,
                },
                integral: false,
            },
            None => {
                return Err(LayoutError::UnknownType {
                    field: String::new(),
                    ty: other.to_string(),
                })
            }
        },
    };
    Ok(resolved)
}

/// Where one field landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldPlacement {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Offset from the start of the record, in bits, in memory order.
    pub offset_bits: u64,
    /// Width in bits.
    pub size_bits: u64,
    pub bitfield: bool,
}

impl FieldPlacement {
    /// Offset of the byte holding the field's first bit.
    pub fn byte_offset(&self) -> u64 {
        self.offset_bits / 8
    }

    /// Mask of a bitfield within its byte, or `None` for ordinary fields and bitfields
    /// spanning more than one byte.
    ///
    /// Memory-order bit 0 is the least significant bit on little-endian targets and the
    /// most significant bit on big-endian ones.
    pub fn byte_mask(&self, target: Target) -> Option<u8> {
        if !self.bitfield {
            return None;
        }
        let start = self.offset_bits % 8;
        if start + self.size_bits > 8 {
            return None;
        }
        let ones = ((1u16 << self.size_bits) - 1) as u8;
        let shift = match target.endian {
            Endianness::Little => start,
            Endianness::Big => 8 - start - self.size_bits,
        };
        Some(ones << shift)
    }
}

/// Computed layout of a mirror under one variant on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Layout {
    pub mirror: String,
    pub variant: String,
    pub target: Target,
    /// Size in bytes, including tail padding.
    pub size: u64,
    /// Alignment in bytes.
    pub align: u64,
    pub fields: Vec<FieldPlacement>,
}

impl Layout {
    pub fn field(&self, name: &str) -> Option<&FieldPlacement> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Round `value` up to a multiple of `align`.
pub(crate) fn align_up(value: u64, align: u64) -> u64 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align) * align
}

/// Lay out `schema` with the fields active under `variant`.
pub fn compute_layout(
    schema: &MirrorSchema,
    types: &[OpaqueType],
    variant: &Variant,
    target: Target,
) -> Result<Layout> {
    target.validate()?;
    let mut offset_bits: u64 = 0;
    let mut max_align: u64 = 1;
    let mut fields = Vec::new();

    for field in schema.active_fields(variant) {
        let resolved = resolve_type(&field.ty, types, target).map_err(|e| match e {
            LayoutError::UnknownType { ty, .. } => LayoutError::UnknownType {
                field: field.name.clone(),
                ty,
            },
            other => other,
        })?;
        let TypeSize {
            size_bytes,
            alignment_bytes,
        } = resolved.size;

        let placement = match field.bits {
            None => {
                offset_bits = align_up(offset_bits, alignment_bytes * 8);
                let start = offset_bits;
                offset_bits += size_bytes * 8;
                FieldPlacement {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    offset_bits: start,
                    size_bits: size_bytes * 8,
                    bitfield: false,
                }
            }
            Some(width) => {
                let width = u64::from(width);
                if !resolved.integral {
                    return Err(LayoutError::InvalidField {
                        field: field.name.clone(),
                        detail: format!("bitfield of non-integral type '{}'", field.ty),
                    });
                }
                if width == 0 || width > size_bytes * 8 {
                    return Err(LayoutError::InvalidField {
                        field: field.name.clone(),
                        detail: format!("bit width {width} outside 1..={}", size_bytes * 8),
                    });
                }
                let unit = alignment_bytes * 8;
                if offset_bits / unit != (offset_bits + width - 1) / unit {
                    offset_bits = align_up(offset_bits, unit);
                }
                let start = offset_bits;
                offset_bits += width;
                FieldPlacement {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    offset_bits: start,
                    size_bits: width,
                    bitfield: true,
                }
            }
        };
        max_align = max_align.max(alignment_bytes);
        fields.push(placement);
    }

    let size = align_up(offset_bits.div_ceil(8), max_align);
    tracing::trace!(
        mirror = %schema.name,
        variant = %variant.name,
        word_bits = target.word_bits,
        size,
        align = max_align,
        "computed layout"
    );

    Ok(Layout {
        mirror: schema.name.clone(),
        variant: variant.name.clone(),
        target,
        size,
        align: max_align,
        fields,
    })
}
