//! Source emitters for mirrors.
//!
//! [`emit_cpp_replacement`] writes the replacement class that bindgen reads in place of
//! the real declaration. [`emit_rust_mirror`] writes the `#[repr(C)]` struct for one
//! variant, with adjacent bitfields collapsed into byte units and mask accessors.

use crate::compute::{compute_layout, FieldPlacement, Layout, Target};
use crate::error::Result;
use crate::schema::{MirrorSchema, OpaqueType, Variant};

/// The C++ replacement class for `schema`, preceded by its bindgen annotation.
pub fn emit_cpp_replacement(schema: &MirrorSchema) -> String {
    let mut out = String::new();
    out.push_str("/**\n");
    out.push_str(&format!(" * <div rustbindgen replaces=\"{}\"></div>\n", schema.replaces));
    out.push_str(" */\n");
    out.push('\n');

    let stack = if schema.stack_class { "MOZ_STACK_CLASS " } else { "" };
    out.push_str(&format!("class {stack}{}\n", schema.name));
    out.push_str("{\n");
    out.push_str(&format!("  {}:\n", schema.access));

    let mut open_guard = None;
    for field in &schema.fields {
        if field.guard != open_guard {
            if open_guard.is_some() {
                out.push_str("#endif\n");
            }
            if let Some(guard) = &field.guard {
                out.push_str(&format!("{}\n", guard.directive()));
            }
            open_guard = field.guard.clone();
        }
        match field.bits {
            Some(bits) => {
                out.push_str(&format!("    {} {}:{bits};\n", field.ty, field.name));
            }
            None => {
                out.push_str(&format!("    {} {};\n", field.ty, field.name));
            }
        }
    }
    if open_guard.is_some() {
        out.push_str("#endif\n");
    }
    out.push_str("};\n");
    out
}

/// Rust spelling of a C++ type. Namespaced and opaque types keep their last path
/// segment and are expected to be in scope where the output is included.
pub fn rust_type(spelling: &str) -> String {
    let spelling = spelling.trim();
    if let Some(pointee) = spelling.strip_suffix('*') {
        let pointee = pointee.trim();
        let (constness, pointee) = match pointee.strip_prefix("const ") {
            Some(rest) => ("const", rest),
            None => ("mut", pointee),
        };
        let inner = match pointee {
            "void" => "::std::os::raw::c_void".to_string(),
            other => rust_type(other),
        };
        return format!("*{constness} {inner}");
    }
    let scalar = match spelling {
        "bool" => "bool",
        "char" | "signed char" | "int8_t" => "i8",
        "unsigned char" | "uint8_t" => "u8",
        "short" | "int16_t" => "i16",
        "unsigned short" | "uint16_t" | "char16_t" => "u16",
        "int" | "int32_t" => "i32",
        "unsigned" | "unsigned int" | "uint32_t" | "char32_t" => "u32",
        "long" | "intptr_t" => "isize",
        "unsigned long" | "size_t" | "uintptr_t" => "usize",
        "long long" | "int64_t" => "i64",
        "unsigned long long" | "uint64_t" => "u64",
        "float" => "f32",
        "double" => "f64",
        other => return other.rsplit("::").next().unwrap_or(other).to_string(),
    };
    scalar.to_string()
}

/// `ignoresReturnValue_` -> `ignores_return_value`.
fn accessor_name(field: &str) -> String {
    let mut out = String::new();
    for c in field.trim_end_matches('_').chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// A run of adjacent bitfields sharing storage bytes.
struct BitfieldUnit<'a> {
    index: usize,
    first_byte: u64,
    bytes: u64,
    fields: Vec<&'a FieldPlacement>,
}

impl BitfieldUnit<'_> {
    fn rust_type(&self) -> String {
        if self.bytes == 1 {
            "u8".to_string()
        } else {
            format!("[u8; {}]", self.bytes)
        }
    }

    fn byte_expr(&self, field: &FieldPlacement) -> String {
        if self.bytes == 1 {
            format!("self._bitfield_{}", self.index)
        } else {
            format!("self._bitfield_{}[{}]", self.index, field.byte_offset() - self.first_byte)
        }
    }
}

enum Member<'a> {
    Field(&'a FieldPlacement),
    Bits(BitfieldUnit<'a>),
}

fn group_members(layout: &Layout) -> Vec<Member<'_>> {
    let mut members: Vec<Member<'_>> = Vec::new();
    let mut units = 0;
    for field in &layout.fields {
        if !field.bitfield {
            members.push(Member::Field(field));
            continue;
        }
        let first_byte = field.byte_offset();
        let end_byte = (field.offset_bits + field.size_bits).div_ceil(8);
        if let Some(Member::Bits(unit)) = members.last_mut() {
            if first_byte <= unit.first_byte + unit.bytes {
                unit.bytes = unit.bytes.max(end_byte - unit.first_byte);
                unit.fields.push(field);
                continue;
            }
        }
        units += 1;
        members.push(Member::Bits(BitfieldUnit {
            index: units,
            first_byte,
            bytes: end_byte - first_byte,
            fields: vec![field],
        }));
    }
    members
}

/// The `#[repr(C)]` Rust struct for `schema` under `variant` on `target`.
///
/// The output ends with `const` assertions on size and alignment, so a stale mirror fails
/// to compile rather than misreading memory.
pub fn emit_rust_mirror(
    schema: &MirrorSchema,
    types: &[OpaqueType],
    variant: &Variant,
    target: Target,
) -> Result<String> {
    let layout = compute_layout(schema, types, variant, target)?;
    let name = rust_type(&schema.replaces);
    let members = group_members(&layout);

    let mut out = String::new();
    out.push_str(&format!(
        "/// Mirror of `{}` ({} variant, {}-bit).\n",
        schema.replaces, variant.name, target.word_bits
    ));
    out.push_str("#[derive(Debug)]\n");
    out.push_str("#[repr(C)]\n");
    out.push_str(&format!("pub struct {name} {{\n"));
    for member in &members {
        match member {
            Member::Field(field) => {
                out.push_str(&format!("    pub {}: {},\n", field.name, rust_type(&field.ty)));
            }
            Member::Bits(unit) => {
                let names: Vec<&str> = unit.fields.iter().map(|f| f.name.as_str()).collect();
                out.push_str(&format!("    /// {}\n", names.join(", ")));
                out.push_str(&format!("    pub _bitfield_{}: {},\n", unit.index, unit.rust_type()));
            }
        }
    }
    out.push_str("}\n");

    let units: Vec<&BitfieldUnit<'_>> = members
        .iter()
        .filter_map(|m| match m {
            Member::Bits(unit) => Some(unit),
            Member::Field(_) => None,
        })
        .collect();
    if !units.is_empty() {
        out.push('\n');
        out.push_str(&format!("impl {name} {{\n"));
        let mut first = true;
        for unit in units {
            for field in &unit.fields {
                let Some(mask) = field.byte_mask(target) else {
                    out.push_str(&format!("    // {} spans bytes; no accessor.\n", field.name));
                    continue;
                };
                if !first {
                    out.push('\n');
                }
                first = false;
                write_accessors(&mut out, unit, field, mask);
            }
        }
        out.push_str("}\n");
    }

    out.push('\n');
    out.push_str("const _: () = {\n");
    out.push_str(&format!("    assert!(::std::mem::size_of::<{name}>() == {});\n", layout.size));
    out.push_str(&format!("    assert!(::std::mem::align_of::<{name}>() == {});\n", layout.align));
    out.push_str("};\n");

    tracing::debug!(mirror = %schema.name, variant = %variant.name, "emitted Rust mirror");
    Ok(out)
}

fn write_accessors(out: &mut String, unit: &BitfieldUnit<'_>, field: &FieldPlacement, mask: u8) {
    let getter = accessor_name(&field.name);
    let byte = unit.byte_expr(field);
    let ty = rust_type(&field.ty);
    let shift = mask.trailing_zeros();

    out.push_str("    #[inline]\n");
    if ty == "bool" {
        out.push_str(&format!("    pub fn {getter}(&self) -> bool {{\n"));
        out.push_str(&format!("        {byte} & {mask:#04x} != 0\n"));
        out.push_str("    }\n");
        out.push('\n');
        out.push_str("    #[inline]\n");
        out.push_str(&format!("    pub fn set_{getter}(&mut self, value: bool) {{\n"));
        out.push_str("        if value {\n");
        out.push_str(&format!("            {byte} |= {mask:#04x};\n"));
        out.push_str("        } else {\n");
        out.push_str(&format!("            {byte} &= !{mask:#04x};\n"));
        out.push_str("        }\n");
        out.push_str("    }\n");
    } else {
        out.push_str(&format!("    pub fn {getter}(&self) -> {ty} {{\n"));
        out.push_str(&format!("        (({byte} & {mask:#04x}) >> {shift}) as {ty}\n"));
        out.push_str("    }\n");
        out.push('\n');
        out.push_str("    #[inline]\n");
        out.push_str(&format!("    pub fn set_{getter}(&mut self, value: {ty}) {{\n"));
        out.push_str(&format!(
            "        {byte} = ({byte} & !{mask:#04x}) | (((value as u8) << {shift}) & {mask:#04x});\n"
        ));
        out.push_str("    }\n");
    }
}
