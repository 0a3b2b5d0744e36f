//! Binding-generator configuration (`bindings.toml`).
//!
//! Describes what bindgen should generate from the engine headers: the input header,
//! allowlists, opaque and blocklisted types, and the clang arguments for each build
//! variant.

use std::path::Path;

use serde::{Deserialize, Serialize};

use jsglue_layout::{MirrorRegistry, Variant};

use crate::error::{AbiError, Result};
use crate::export::ExportManifest;

/// Configuration shipped with this crate.
pub const BUILTIN_BINDINGS: &str = include_str!("../bindings.toml");

/// Engine statics `jsglue-sys` stands in for; bindgen must still emit them.
pub const REQUIRED_VARS: [&str; 3] = ["JS::NullHandleValue", "JS::UndefinedHandleValue", "JSID_VOID"];

/// bindgen settings for the engine headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingConfig {
    /// Path of the generated input header, relative to the project root.
    pub header: String,
    /// Engine headers the input header includes.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Enum name patterns translated as Rust enums.
    #[serde(default)]
    pub rustified_enums: Vec<String>,
    /// Arguments passed to clang for every variant.
    #[serde(default)]
    pub clang_args: Vec<String>,
    /// Extra arguments when targeting MSVC.
    #[serde(default)]
    pub msvc_clang_args: Vec<String>,
    /// Types that get `unsafe impl Sync`.
    #[serde(default)]
    pub sync_types: Vec<String>,
    #[serde(default)]
    pub allowlist_types: Vec<String>,
    #[serde(default)]
    pub allowlist_functions: Vec<String>,
    /// Variable and constant name patterns.
    #[serde(default)]
    pub allowlist_vars: Vec<String>,
    /// Types bindgen emits as byte blobs.
    #[serde(default)]
    pub opaque_types: Vec<String>,
    /// Types bindgen never emits.
    #[serde(default)]
    pub blocklist_types: Vec<String>,
}

/// A validation issue found in a binding configuration.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Whether `name` matches an allowlist `pattern`. Only `.*` is treated specially.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let mut pieces = pattern.split(".*");
    let Some(first) = pieces.next() else {
        return false;
    };
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };
    let pieces: Vec<&str> = pieces.collect();
    let Some((last, middle)) = pieces.split_last() else {
        return rest.is_empty();
    };
    for piece in middle {
        match rest.find(piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

impl BindingConfig {
    /// Parse a configuration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let config: BindingConfig = toml::from_str(input)?;
        Ok(config)
    }

    /// Load a configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AbiError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The configuration embedded in this crate.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_BINDINGS)
    }

    /// clang arguments for `variant`: the base arguments, then one `-D` per define,
    /// then the MSVC extras when `msvc` is set.
    pub fn clang_args(&self, variant: &Variant, msvc: bool) -> Vec<String> {
        let mut args = self.clang_args.clone();
        args.extend(variant.defines.iter().map(|d| format!("-D{d}")));
        if msvc {
            args.extend(self.msvc_clang_args.iter().cloned());
        }
        args
    }

    /// [`clang_args`](Self::clang_args) for a variant looked up by name.
    pub fn clang_args_for(&self, registry: &MirrorRegistry, variant: &str, msvc: bool) -> Result<Vec<String>> {
        let variant = registry.variant(variant).ok_or_else(|| AbiError::UnknownVariant {
            name: variant.to_string(),
        })?;
        Ok(self.clang_args(variant, msvc))
    }

    /// Validate against `registry` and `manifest`, folding errors into one. Warnings are
    /// logged and do not fail.
    pub fn validated(self, registry: &MirrorRegistry, manifest: &ExportManifest) -> Result<Self> {
        let Err(issues) = validate_config(&self, registry, manifest) else {
            return Ok(self);
        };
        let mut errors = Vec::new();
        for issue in issues {
            if issue.severity == "error" {
                errors.push(issue.message);
            } else {
                tracing::warn!("{}", issue.message);
            }
        }
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(AbiError::InvalidConfig {
                detail: errors.join("; "),
            })
        }
    }

    /// The full bindgen command line for `variant`: builder flags, the input header, `--`,
    /// then the clang arguments.
    pub fn bindgen_args(&self, variant: &Variant, msvc: bool) -> Vec<String> {
        let mut args = vec!["--enable-cxx-namespaces".to_string(), "--generate-inline-functions".to_string()];
        let mut push_all = |flag: &str, values: &[String]| {
            for value in values {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        };
        push_all("--rustified-enum", &self.rustified_enums);
        push_all("--allowlist-type", &self.allowlist_types);
        push_all("--allowlist-var", &self.allowlist_vars);
        push_all("--allowlist-function", &self.allowlist_functions);
        push_all("--opaque-type", &self.opaque_types);
        push_all("--blocklist-type", &self.blocklist_types);
        for ty in &self.sync_types {
            args.push("--raw-line".to_string());
            args.push(format!("unsafe impl Sync for {ty} {{}}"));
        }
        args.push(self.header.clone());
        args.push("--".to_string());
        args.extend(self.clang_args(variant, msvc));
        args
    }

    /// [`bindgen_args`](Self::bindgen_args) for a variant looked up by name.
    pub fn bindgen_args_for(&self, registry: &MirrorRegistry, variant: &str, msvc: bool) -> Result<Vec<String>> {
        let variant = registry.variant(variant).ok_or_else(|| AbiError::UnknownVariant {
            name: variant.to_string(),
        })?;
        Ok(self.bindgen_args(variant, msvc))
    }

    pub fn allows_type(&self, name: &str) -> bool {
        self.allowlist_types.iter().any(|p| pattern_matches(p, name))
    }

    pub fn allows_function(&self, name: &str) -> bool {
        self.allowlist_functions.iter().any(|p| pattern_matches(p, name))
    }

    pub fn allows_var(&self, name: &str) -> bool {
        self.allowlist_vars.iter().any(|p| pattern_matches(p, name))
    }
}

/// Check a configuration against the mirrors and exports it must cover.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_config(
    config: &BindingConfig,
    registry: &MirrorRegistry,
    manifest: &ExportManifest,
) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if config.header.trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "header path is empty".into(),
        });
    }

    for ty in &config.opaque_types {
        if config.blocklist_types.contains(ty) {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("type '{ty}' is both opaque and blocklisted"),
            });
        }
    }

    for mirror in registry.iter() {
        if !config.allows_type(&mirror.replaces) {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!(
                    "mirror '{}' replaces '{}', which is not in allowlist-types",
                    mirror.name, mirror.replaces
                ),
            });
        }
    }

    for symbol in manifest.symbols() {
        if !config.allows_function(symbol) {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("export '{symbol}' is not in allowlist-functions"),
            });
        }
    }

    for (key, patterns) in [
        ("rustified-enums", &config.rustified_enums),
        ("allowlist-vars", &config.allowlist_vars),
    ] {
        for (i, pattern) in patterns.iter().enumerate() {
            if pattern.trim().is_empty() {
                issues.push(ValidationIssue {
                    severity: "error",
                    message: format!("{key} has an empty pattern"),
                });
            } else if patterns[..i].contains(pattern) {
                issues.push(ValidationIssue {
                    severity: "warning",
                    message: format!("{key} lists '{pattern}' more than once"),
                });
            }
        }
    }

    if config.rustified_enums.is_empty() {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "rustified-enums is empty; engine enums will be emitted as constants".into(),
        });
    }

    for var in REQUIRED_VARS {
        if !config.allows_var(var) {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("'{var}' is not in allowlist-vars"),
            });
        }
    }

    for ty in &config.sync_types {
        if !config.allows_type(ty) {
            issues.push(ValidationIssue {
                severity: "warning",
                message: format!("sync type '{ty}' is not in allowlist-types and will not be generated"),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
