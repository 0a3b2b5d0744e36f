//! Export manifest (`exports.toml`) parsing and validation.
//!
//! The manifest lists every inline engine function the glue turns into a real symbol,
//! with its C++ declaration, how the body forwards to the engine, and what the caller
//! must guarantee.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::csig::{CSignature, CType};
use crate::error::{AbiError, Result};

/// Manifest shipped with this crate.
pub const BUILTIN_EXPORTS: &str = include_str!("../exports.toml");

/// The declared export surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExportManifest {
    /// Header the generated glue source includes.
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default, rename = "export")]
    pub exports: Vec<Export>,
}

fn default_header() -> String {
    "jsglue.hpp".to_string()
}

/// One re-exported function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Export {
    /// Linker symbol; must equal the declared function name.
    pub symbol: String,
    /// C++ declaration.
    pub signature: String,
    pub forward: Forward,
    #[serde(default)]
    pub precondition: Precondition,
    /// Exposed for tests and diagnostics rather than production callers.
    #[serde(default)]
    pub testing_only: bool,
}

/// How the generated body reaches the engine primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Forward {
    /// Default-construct `ty`, passing the context when `with_context`.
    DefaultConstruct {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default, rename = "with-context")]
        with_context: bool,
    },
    /// Return `function(args...)`.
    Construct { function: String },
    /// Return `arg.method()` for a boolean test.
    Predicate { method: String },
    /// Return `arg.method()` without checking; `checked_by` names the guarding predicate.
    UncheckedRead {
        method: String,
        #[serde(rename = "checked-by")]
        checked_by: String,
    },
    /// Return `function(handle)`, a pointer reinterpretation.
    Reinterpret { function: String },
}

impl Forward {
    pub fn kind(&self) -> &'static str {
        match self {
            Forward::DefaultConstruct { .. } => "default-construct",
            Forward::Construct { .. } => "construct",
            Forward::Predicate { .. } => "predicate",
            Forward::UncheckedRead { .. } => "unchecked-read",
            Forward::Reinterpret { .. } => "reinterpret",
        }
    }
}

/// What the caller must guarantee. Violations are undefined behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precondition {
    #[default]
    None,
    /// Handle argument is non-null and live.
    NonNullHandle,
    /// Context argument is live and owned by the calling thread.
    ThreadOwnedContext,
    /// The `checked-by` predicate holds for the argument.
    PredicateHolds,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Precondition::None => "none",
            Precondition::NonNullHandle => "non-null-handle",
            Precondition::ThreadOwnedContext => "thread-owned-context",
            Precondition::PredicateHolds => "predicate-holds",
        };
        write!(f, "{s}")
    }
}

/// A validation issue found in a manifest.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Symbol the issue concerns; empty for manifest-wide issues.
    pub symbol: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.symbol, self.message)
        }
    }
}

impl ExportManifest {
    /// Parse a manifest from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let manifest: ExportManifest = toml::from_str(input)?;
        tracing::debug!(exports = manifest.exports.len(), "parsed export manifest");
        Ok(manifest)
    }

    /// Parse a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AbiError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The manifest embedded in this crate.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_EXPORTS)
    }

    pub fn get(&self, symbol: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.symbol == symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(|e| e.symbol.as_str())
    }

    /// Every export paired with its parsed declaration.
    pub fn signatures(&self) -> Result<Vec<(&Export, CSignature)>> {
        self.exports
            .iter()
            .map(|e| Ok((e, CSignature::parse(&e.signature)?)))
            .collect()
    }

    /// Validate, folding all issues into one error.
    pub fn validated(self) -> Result<Self> {
        match validate_manifest(&self) {
            Ok(()) => Ok(self),
            Err(issues) => Err(AbiError::InvalidManifest {
                detail: issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
            }),
        }
    }
}

/// Validate a manifest for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_manifest(manifest: &ExportManifest) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut issue = |symbol: &str, message: String| {
        issues.push(ValidationIssue {
            symbol: symbol.to_string(),
            message,
        })
    };

    let mut seen = HashSet::new();
    let mut parsed: HashMap<&str, CSignature> = HashMap::new();
    for export in &manifest.exports {
        if !seen.insert(export.symbol.as_str()) {
            issue(&export.symbol, "declared more than once".into());
            continue;
        }
        match CSignature::parse(&export.signature) {
            Ok(sig) => {
                parsed.insert(export.symbol.as_str(), sig);
            }
            Err(e) => issue(&export.symbol, e.to_string()),
        }
    }

    for export in &manifest.exports {
        let symbol = export.symbol.as_str();
        let Some(sig) = parsed.get(symbol) else {
            continue;
        };

        if sig.name != export.symbol {
            issue(symbol, format!("declaration names '{}'", sig.name));
        }
        if sig.is_variadic {
            issue(symbol, "variadic functions cannot be forwarded".into());
        }
        if sig.parameters.iter().any(|p| p.name.is_empty()) {
            issue(symbol, "every parameter needs a name to forward".into());
        }

        match &export.forward {
            Forward::DefaultConstruct { ty, with_context } => {
                if sig.return_type != CType::Named(ty.clone()) {
                    issue(symbol, format!("returns '{}' but constructs '{ty}'", sig.return_type));
                }
                if *with_context {
                    let takes_context = sig.parameters.len() == 1 && sig.parameters[0].param_type.is_pointer_to("JSContext");
                    if !takes_context {
                        issue(symbol, "context constructors take exactly one JSContext*".into());
                    }
                    if export.precondition != Precondition::ThreadOwnedContext {
                        issue(symbol, "context constructors require 'thread-owned-context'".into());
                    }
                } else if !sig.parameters.is_empty() {
                    issue(symbol, "default constructors take no parameters".into());
                }
            }
            Forward::Construct { .. } => {
                if sig.return_type.is_void() {
                    issue(symbol, "constructors must return a value".into());
                }
            }
            Forward::Predicate { .. } => {
                if sig.return_type != CType::Bool {
                    issue(symbol, "predicates return bool".into());
                }
                if sig.parameters.len() != 1 {
                    issue(symbol, "predicates take exactly one parameter".into());
                }
            }
            Forward::UncheckedRead { checked_by, .. } => {
                if sig.parameters.len() != 1 {
                    issue(symbol, "unchecked reads take exactly one parameter".into());
                }
                if export.precondition != Precondition::PredicateHolds {
                    issue(symbol, "unchecked reads require 'predicate-holds'".into());
                }
                let predicate = manifest.get(checked_by);
                match (predicate, parsed.get(checked_by.as_str())) {
                    (Some(p), Some(psig)) if matches!(p.forward, Forward::Predicate { .. }) => {
                        if psig.parameter_types() != sig.parameter_types() {
                            issue(symbol, format!("parameters differ from predicate '{checked_by}'"));
                        }
                        if psig.return_type != CType::Bool {
                            issue(symbol, format!("predicate '{checked_by}' does not return bool"));
                        }
                    }
                    _ => issue(symbol, format!("checked-by '{checked_by}' is not a predicate export")),
                }
            }
            Forward::Reinterpret { .. } => {
                let one_pointer = sig.parameters.len() == 1 && sig.parameters[0].param_type.is_pointer();
                if !one_pointer || !sig.return_type.is_pointer() {
                    issue(symbol, "reinterpretations map one pointer to a pointer".into());
                }
                if export.precondition != Precondition::NonNullHandle {
                    issue(symbol, "reinterpretations require 'non-null-handle'".into());
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(manifest: &ExportManifest) -> Vec<String> {
        match validate_manifest(manifest) {
            Ok(()) => Vec::new(),
            Err(issues) => issues.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn builtin_manifest_is_valid() {
        let manifest = ExportManifest::builtin().unwrap().validated().unwrap();
        assert_eq!(manifest.header, "jsglue.hpp");
        assert_eq!(manifest.exports.len(), 6);

        let read = manifest.get("JS_ValueToInt32").unwrap();
        assert!(read.testing_only);
        assert_eq!(read.precondition, Precondition::PredicateHolds);
        assert_eq!(
            read.forward,
            Forward::UncheckedRead {
                method: "toInt32".into(),
                checked_by: "JS_ValueIsInt32".into()
            }
        );
    }

    #[test]
    fn forward_kinds_deserialize() {
        let manifest = ExportManifest::builtin().unwrap();
        let kinds: Vec<_> = manifest.exports.iter().map(|e| e.forward.kind()).collect();
        assert_eq!(
            kinds,
            [
                "default-construct",
                "default-construct",
                "reinterpret",
                "construct",
                "predicate",
                "unchecked-read"
            ]
        );
        assert_eq!(
            manifest.get("JS_NewOwningCompileOptions").unwrap().forward,
            Forward::DefaultConstruct {
                ty: "JS::OwningCompileOptions".into(),
                with_context: true
            }
        );
    }

    #[test]
    fn symbol_must_match_declaration() {
        let mut manifest = ExportManifest::builtin().unwrap();
        manifest.exports[3].symbol = "JS_MakeInt32".into();
        let errors = messages(&manifest);
        assert!(errors.iter().any(|e| e.contains("declaration names 'JS_Int32Value'")), "{errors:?}");
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let mut manifest = ExportManifest::builtin().unwrap();
        let dup = manifest.exports[0].clone();
        manifest.exports.push(dup);
        assert!(messages(&manifest).iter().any(|e| e.contains("more than once")));
    }

    #[test]
    fn unchecked_read_needs_matching_predicate() {
        let mut manifest = ExportManifest::builtin().unwrap();
        manifest.exports.retain(|e| e.symbol != "JS_ValueIsInt32");
        let errors = messages(&manifest);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("JS_ValueToInt32: checked-by"));

        let mut manifest = ExportManifest::builtin().unwrap();
        for export in &mut manifest.exports {
            if export.symbol == "JS_ValueIsInt32" {
                export.signature = "bool JS_ValueIsInt32(int32_t value)".into();
            }
        }
        assert!(messages(&manifest).iter().any(|e| e.contains("parameters differ")));
    }

    #[test]
    fn preconditions_are_enforced() {
        let mut manifest = ExportManifest::builtin().unwrap();
        for export in &mut manifest.exports {
            export.precondition = Precondition::None;
        }
        let errors = messages(&manifest);
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("thread-owned-context")));
        assert!(errors.iter().any(|e| e.contains("non-null-handle")));
        assert!(errors.iter().any(|e| e.contains("predicate-holds")));
    }

    #[test]
    fn variadic_and_unnamed_parameters() {
        let manifest = ExportManifest::parse(
            r#"
[[export]]
symbol = "JS_Log"
signature = "JS::Value JS_Log(int32_t, ...)"
forward = { kind = "construct", function = "js::Log" }
"#,
        )
        .unwrap();
        let errors = messages(&manifest);
        assert!(errors.iter().any(|e| e.contains("variadic")));
        assert!(errors.iter().any(|e| e.contains("needs a name")));
    }

    #[test]
    fn unknown_forward_kind_fails_to_parse() {
        let err = ExportManifest::parse(
            r#"
[[export]]
symbol = "JS_X"
signature = "int JS_X()"
forward = { kind = "teleport" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AbiError::Toml(_)));
    }
}
