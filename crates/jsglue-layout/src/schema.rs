//! Mirror file model: opaque types, build variants and mirror schemas.
//!
//! Mirror files are TOML. A file declares the schema `version`, any opaque `[[type]]`
//! entries the mirrors refer to, the `[[variant]]` build configurations guards are
//! evaluated under, and the `[[mirror]]` entries themselves.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::{resolve_type, Target};
use crate::error::{LayoutError, Result};

/// Mirror schema version understood by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// A parsed mirror file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MirrorFile {
    /// Schema version; must equal [`SCHEMA_VERSION`].
    pub version: u32,
    /// Engine types with a fixed size that mirrors may embed.
    #[serde(default, rename = "type")]
    pub types: Vec<OpaqueType>,
    /// Build variants.
    #[serde(default, rename = "variant")]
    pub variants: Vec<Variant>,
    /// Mirror schemas.
    #[serde(default, rename = "mirror")]
    pub mirrors: Vec<MirrorSchema>,
}

/// An engine type known only by size and alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpaqueType {
    /// Fully qualified C++ name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Alignment in bytes.
    pub align: u64,
}

/// A named set of preprocessor defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub defines: Vec<String>,
}

impl Variant {
    /// Whether `flag` is defined in this variant.
    pub fn defines(&self, flag: &str) -> bool {
        self.defines.iter().any(|d| d == flag)
    }
}

/// Member access of a replacement class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Protected => write!(f, "protected"),
            Access::Private => write!(f, "private"),
        }
    }
}

/// Hand-written structural stand-in for one engine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MirrorSchema {
    /// Name of the replacement class.
    pub name: String,
    /// Fully qualified C++ type this mirror replaces.
    pub replaces: String,
    #[serde(default)]
    pub access: Access,
    /// Emit the class as `MOZ_STACK_CLASS`.
    #[serde(default)]
    pub stack_class: bool,
    /// Fields in declaration order.
    #[serde(rename = "field")]
    pub fields: Vec<MirrorField>,
    /// Recorded sizes per variant and word size.
    #[serde(default, rename = "expect")]
    pub expectations: Vec<SizeExpectation>,
    /// Pinned hex SHA-256 of the field list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl MirrorSchema {
    /// Fields present under `variant`, in declaration order.
    pub fn active_fields<'a>(&'a self, variant: &'a Variant) -> impl Iterator<Item = &'a MirrorField> + 'a {
        self.fields.iter().filter(move |f| f.is_active(variant))
    }

    /// The expectation recorded for `variant` at `word_bits`, if any.
    pub fn expectation(&self, variant: &str, word_bits: u32) -> Option<&SizeExpectation> {
        self.expectations
            .iter()
            .find(|e| e.variant == variant && e.word_bits == word_bits)
    }
}

/// One field of a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MirrorField {
    pub name: String,
    /// C++ type spelling, e.g. `JS::Value*` or `unsigned`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Bit width when the field is a bitfield.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<u32>,
    /// Preprocessor condition the field exists under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
}

impl MirrorField {
    pub fn is_active(&self, variant: &Variant) -> bool {
        self.guard.as_ref().map_or(true, |g| g.is_active(variant))
    }
}

/// `FLAG` (present when defined) or `!FLAG` (present when not defined).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Guard {
    pub flag: String,
    pub negated: bool,
}

impl Guard {
    pub fn parse(s: &str) -> Result<Guard> {
        let (negated, flag) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let valid = !flag.is_empty()
            && !flag.starts_with(|c: char| c.is_ascii_digit())
            && flag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(LayoutError::InvalidGuard { guard: s.to_string() });
        }
        Ok(Guard {
            flag: flag.to_string(),
            negated,
        })
    }

    pub fn is_active(&self, variant: &Variant) -> bool {
        variant.defines(&self.flag) != self.negated
    }

    /// The opening preprocessor directive for this guard.
    pub fn directive(&self) -> String {
        if self.negated {
            format!("#ifndef {}", self.flag)
        } else {
            format!("#ifdef {}", self.flag)
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!{}", self.flag)
        } else {
            write!(f, "{}", self.flag)
        }
    }
}

impl TryFrom<String> for Guard {
    type Error = LayoutError;

    fn try_from(s: String) -> Result<Guard> {
        Guard::parse(&s)
    }
}

impl From<Guard> for String {
    fn from(g: Guard) -> String {
        g.to_string()
    }
}

/// Recorded size and alignment for one variant at one word size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SizeExpectation {
    pub variant: String,
    pub word_bits: u32,
    pub size: u64,
    pub align: u64,
}

/// A validation issue found in a mirror file.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl MirrorFile {
    /// Parse a mirror file from a TOML string.
    pub fn parse(toml_str: &str) -> Result<MirrorFile> {
        let file: MirrorFile = toml::from_str(toml_str)?;
        if file.version != SCHEMA_VERSION {
            return Err(LayoutError::UnsupportedVersion {
                found: file.version,
                expected: SCHEMA_VERSION,
            });
        }
        tracing::debug!(
            mirrors = file.mirrors.len(),
            variants = file.variants.len(),
            "parsed mirror file"
        );
        Ok(file)
    }

    /// Load a mirror file from disk.
    pub fn load(path: &Path) -> Result<MirrorFile> {
        if !path.exists() {
            return Err(LayoutError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// Validate a mirror file for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_mirror_file(file: &MirrorFile) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut error = |message: String| {
        issues.push(ValidationIssue {
            severity: "error",
            message,
        })
    };

    let mut seen_variants = HashSet::new();
    for variant in &file.variants {
        if !seen_variants.insert(variant.name.as_str()) {
            error(format!("variant '{}' is declared twice", variant.name));
        }
    }
    if file.variants.is_empty() {
        error("no build variants declared".into());
    }
    let declared_flags: HashSet<&str> = file
        .variants
        .iter()
        .flat_map(|v| v.defines.iter().map(String::as_str))
        .collect();

    for ty in &file.types {
        if ty.align == 0 || !ty.align.is_power_of_two() {
            error(format!("type '{}' has alignment {}, not a power of two", ty.name, ty.align));
        }
    }

    let mut seen_mirrors = HashSet::new();
    for mirror in &file.mirrors {
        let name = &mirror.name;
        if !seen_mirrors.insert(name.as_str()) {
            error(format!("mirror '{name}' is declared twice"));
        }
        if mirror.fields.is_empty() {
            error(format!("mirror '{name}' has no fields"));
        }

        for field in &mirror.fields {
            if let Some(guard) = &field.guard {
                if !declared_flags.contains(guard.flag.as_str()) {
                    error(format!(
                        "field '{name}.{}' is guarded by '{}', which no variant defines",
                        field.name, guard.flag
                    ));
                }
            }

            // Word size does not change which types resolve or whether they are integral.
            match resolve_type(&field.ty, &file.types, Target::LP64) {
                Err(_) => error(format!("field '{name}.{}' has unknown type '{}'", field.name, field.ty)),
                Ok(resolved) => {
                    if let Some(bits) = field.bits {
                        if !resolved.integral {
                            error(format!(
                                "field '{name}.{}' is a bitfield of non-integral type '{}'",
                                field.name, field.ty
                            ));
                        } else if bits == 0 || u64::from(bits) > resolved.size.size_bytes * 8 {
                            error(format!(
                                "field '{name}.{}' has bit width {bits}, outside 1..={}",
                                field.name,
                                resolved.size.size_bytes * 8
                            ));
                        }
                    }
                }
            }
        }

        for variant in &file.variants {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for field in mirror.active_fields(variant) {
                *counts.entry(field.name.as_str()).or_default() += 1;
            }
            let mut duplicates: Vec<&str> = counts.into_iter().filter(|(_, n)| *n > 1).map(|(f, _)| f).collect();
            duplicates.sort_unstable();
            for field in duplicates {
                error(format!(
                    "mirror '{name}' declares field '{field}' more than once under variant '{}'",
                    variant.name
                ));
            }
        }

        for expect in &mirror.expectations {
            if file.variant(&expect.variant).is_none() {
                error(format!(
                    "mirror '{name}' has an expectation for unknown variant '{}'",
                    expect.variant
                ));
            }
            if expect.word_bits != 32 && expect.word_bits != 64 {
                error(format!(
                    "mirror '{name}' has an expectation for {}-bit words (expected 32 or 64)",
                    expect.word_bits
                ));
            }
        }

        if let Some(pinned) = &mirror.fingerprint {
            if pinned.len() != 64 || !pinned.chars().all(|c| c.is_ascii_hexdigit()) {
                error(format!("mirror '{name}' has a malformed fingerprint '{pinned}'"));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
