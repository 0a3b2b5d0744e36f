//! Parser for the function declarations that make up the exported surface.
//!
//! Covers C scalar and stdint types, `const`, pointers, variadics and namespaced C++
//! class names such as `JS::Value` or `JS::shadow::Zone`. Does not handle references,
//! templates, function pointers or array parameters.

use std::fmt;

use crate::error::{AbiError, Result};

/// A C or C++ type as written in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CType {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SizeT,
    /// Pointer to another type.
    Pointer(Box<CType>),
    /// Const-qualified type.
    Const(Box<CType>),
    /// A class, struct or typedef name, possibly namespace-qualified.
    Named(String),
}

impl CType {
    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.strip_const(), CType::Pointer(_))
    }

    /// Strip const qualifiers from the outer level.
    pub fn strip_const(&self) -> &CType {
        match self {
            CType::Const(inner) => inner.strip_const(),
            other => other,
        }
    }

    /// The pointee of a pointer type.
    pub fn pointee(&self) -> Option<&CType> {
        match self.strip_const() {
            CType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether this is `Name*` for the given class name.
    pub fn is_pointer_to(&self, name: &str) -> bool {
        matches!(self.pointee().map(CType::strip_const), Some(CType::Named(n)) if n == name)
    }

    fn keyword(word: &str) -> Option<CType> {
        let ty = match word {
            "void" => CType::Void,
            "bool" | "_Bool" => CType::Bool,
            "char" => CType::Char,
            "short" => CType::Short,
            "int" => CType::Int,
            "float" => CType::Float,
            "double" => CType::Double,
            "int8_t" => CType::Int8,
            "int16_t" => CType::Int16,
            "int32_t" => CType::Int32,
            "int64_t" => CType::Int64,
            "uint8_t" => CType::UInt8,
            "uint16_t" => CType::UInt16,
            "uint32_t" => CType::UInt32,
            "uint64_t" => CType::UInt64,
            "size_t" => CType::SizeT,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Bool => write!(f, "bool"),
            CType::Char => write!(f, "char"),
            CType::SignedChar => write!(f, "signed char"),
            CType::UnsignedChar => write!(f, "unsigned char"),
            CType::Short => write!(f, "short"),
            CType::UnsignedShort => write!(f, "unsigned short"),
            CType::Int => write!(f, "int"),
            CType::UnsignedInt => write!(f, "unsigned int"),
            CType::Long => write!(f, "long"),
            CType::UnsignedLong => write!(f, "unsigned long"),
            CType::LongLong => write!(f, "long long"),
            CType::UnsignedLongLong => write!(f, "unsigned long long"),
            CType::Float => write!(f, "float"),
            CType::Double => write!(f, "double"),
            CType::Int8 => write!(f, "int8_t"),
            CType::Int16 => write!(f, "int16_t"),
            CType::Int32 => write!(f, "int32_t"),
            CType::Int64 => write!(f, "int64_t"),
            CType::UInt8 => write!(f, "uint8_t"),
            CType::UInt16 => write!(f, "uint16_t"),
            CType::UInt32 => write!(f, "uint32_t"),
            CType::UInt64 => write!(f, "uint64_t"),
            CType::SizeT => write!(f, "size_t"),
            CType::Pointer(inner) => write!(f, "{inner}*"),
            CType::Const(inner) => write!(f, "const {inner}"),
            CType::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CParam {
    pub param_type: CType,
    /// Parameter name; empty if unnamed.
    pub name: String,
}

/// A parsed function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSignature {
    pub return_type: CType,
    pub name: String,
    /// Parameters, excluding a trailing `...`.
    pub parameters: Vec<CParam>,
    pub is_variadic: bool,
}

impl CSignature {
    /// Parse a declaration such as `"JS::shadow::Zone* JS_AsShadowZone(JS::Zone* zone)"`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim().trim_end_matches(';').trim_end();
        if input.is_empty() {
            return Err(invalid("empty signature"));
        }
        let open = input.find('(').ok_or_else(|| invalid("missing '('"))?;
        if !input.ends_with(')') {
            return Err(invalid("missing ')'"));
        }

        let (return_type, name) = Declarator::parse(&input[..open], true)?;
        if name.is_empty() {
            return Err(invalid("missing function name"));
        }

        let params = input[open + 1..input.len() - 1].trim();
        let mut parameters = Vec::new();
        let mut is_variadic = false;
        if !params.is_empty() && params != "void" {
            let parts: Vec<&str> = params.split(',').map(str::trim).collect();
            for (i, part) in parts.iter().enumerate() {
                if *part == "..." {
                    if i + 1 != parts.len() {
                        return Err(invalid("'...' must be the last parameter"));
                    }
                    is_variadic = true;
                    continue;
                }
                let (param_type, name) = Declarator::parse(part, false)?;
                if param_type.is_void() {
                    return Err(invalid(&format!("parameter '{part}' has type void")));
                }
                parameters.push(CParam { param_type, name });
            }
        }

        Ok(CSignature {
            return_type,
            name,
            parameters,
            is_variadic,
        })
    }

    /// Parameter types in order.
    pub fn parameter_types(&self) -> Vec<&CType> {
        self.parameters.iter().map(|p| &p.param_type).collect()
    }
}

impl fmt::Display for CSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.param_type)?;
            if !param.name.is_empty() {
                write!(f, " {}", param.name)?;
            }
        }
        if self.is_variadic {
            if !self.parameters.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

fn invalid(detail: &str) -> AbiError {
    AbiError::InvalidCSignature {
        detail: detail.to_string(),
    }
}

fn is_identifier(tok: &str) -> bool {
    let mut chars = tok.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_qualified_name(tok: &str) -> bool {
    tok.split("::").all(is_identifier)
}

/// Splits on whitespace, keeping `*` and `&` as separate tokens.
fn tokenize(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for part in s.split_whitespace() {
        let mut rest = part;
        while let Some(pos) = rest.find(['*', '&']) {
            if pos > 0 {
                tokens.push(&rest[..pos]);
            }
            tokens.push(&rest[pos..pos + 1]);
            rest = &rest[pos + 1..];
        }
        if !rest.is_empty() {
            tokens.push(rest);
        }
    }
    tokens
}

/// Cursor over the tokens of one `type name` fragment.
struct Declarator<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Declarator<'a> {
    /// Parse `type [name]`. With `require_name`, the trailing identifier is mandatory.
    fn parse(fragment: &'a str, require_name: bool) -> Result<(CType, String)> {
        let mut cursor = Declarator {
            tokens: tokenize(fragment),
            pos: 0,
        };
        if cursor.tokens.is_empty() {
            return Err(invalid("expected type"));
        }
        let base = cursor.base_type()?;
        let ty = cursor.pointers(base)?;
        let name = match cursor.next() {
            Some(tok) if is_identifier(tok) => tok.to_string(),
            Some(tok) => return Err(invalid(&format!("unexpected '{tok}' in '{fragment}'"))),
            None if require_name => return Err(invalid("missing function name")),
            None => String::new(),
        };
        if let Some(extra) = cursor.next() {
            return Err(invalid(&format!("unexpected '{extra}' after '{name}'")));
        }
        Ok((ty, name))
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, word: &str) -> bool {
        if self.peek() == Some(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn base_type(&mut self) -> Result<CType> {
        let is_const = self.eat("const");
        // Elaborated type specifiers add nothing here.
        let _ = self.eat("struct") || self.eat("class");

        let ty = if self.eat("unsigned") {
            self.sized_integer(true)
        } else if self.eat("signed") {
            self.sized_integer(false)
        } else if matches!(self.peek(), Some("short" | "long")) {
            self.sized_integer(false)
        } else {
            let tok = self.next().ok_or_else(|| invalid("expected type"))?;
            match CType::keyword(tok) {
                Some(ty) => ty,
                None if is_qualified_name(tok) => CType::Named(tok.to_string()),
                None => return Err(invalid(&format!("unknown type '{tok}'"))),
            }
        };

        let trailing_const = self.eat("const");
        Ok(if is_const || trailing_const {
            CType::Const(Box::new(ty))
        } else {
            ty
        })
    }

    /// The integer named after an optional `signed`/`unsigned`.
    fn sized_integer(&mut self, unsigned: bool) -> CType {
        let pick = |s: CType, u: CType| if unsigned { u } else { s };
        if self.eat("char") {
            return pick(CType::SignedChar, CType::UnsignedChar);
        }
        if self.eat("short") {
            self.eat("int");
            return pick(CType::Short, CType::UnsignedShort);
        }
        if self.eat("long") {
            let ty = if self.eat("long") {
                pick(CType::LongLong, CType::UnsignedLongLong)
            } else {
                pick(CType::Long, CType::UnsignedLong)
            };
            self.eat("int");
            return ty;
        }
        self.eat("int");
        pick(CType::Int, CType::UnsignedInt)
    }

    fn pointers(&mut self, mut ty: CType) -> Result<CType> {
        loop {
            match self.peek() {
                Some("*") => {
                    self.pos += 1;
                    ty = CType::Pointer(Box::new(ty));
                    if self.eat("const") {
                        ty = CType::Const(Box::new(ty));
                    }
                }
                Some("&") => return Err(invalid("reference types are not supported")),
                _ => return Ok(ty),
            }
        }
    }
}
