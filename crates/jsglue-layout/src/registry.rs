//! The set of mirrors a build relies on, and checks of their recorded layouts.

use std::path::Path;

use serde::Serialize;

use crate::compute::{compute_layout, Layout, Target};
use crate::error::{LayoutError, Result};
use crate::fingerprint::fingerprint;
use crate::schema::{validate_mirror_file, MirrorFile, MirrorSchema, OpaqueType, Variant};

/// Mirrors shipped with this crate.
pub const BUILTIN_MIRRORS: &str = include_str!("../mirrors.toml");

/// A validated mirror file.
#[derive(Debug, Clone)]
pub struct MirrorRegistry {
    file: MirrorFile,
}

/// Result of checking one mirror under one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckOutcome {
    pub mirror: String,
    pub variant: String,
    pub word_bits: u32,
    pub size: u64,
    pub align: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_align: Option<u64>,
}

impl CheckOutcome {
    /// No expectation is recorded for this variant and word size.
    pub fn is_unchecked(&self) -> bool {
        self.expected_size.is_none()
    }

    pub fn is_drift(&self) -> bool {
        self.expected_size.is_some_and(|s| s != self.size) || self.expected_align.is_some_and(|a| a != self.align)
    }
}

impl MirrorRegistry {
    /// The mirrors embedded in this crate.
    pub fn builtin() -> Result<Self> {
        Self::from_mirror_file(MirrorFile::parse(BUILTIN_MIRRORS)?)
    }

    /// Load and validate a mirror file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_mirror_file(MirrorFile::load(path)?)
    }

    /// Validate an already parsed mirror file.
    pub fn from_mirror_file(file: MirrorFile) -> Result<Self> {
        if let Err(issues) = validate_mirror_file(&file) {
            for issue in &issues {
                tracing::debug!(severity = issue.severity, "{}", issue.message);
            }
            let detail = issues
                .iter()
                .filter(|i| i.severity == "error")
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if !detail.is_empty() {
                return Err(LayoutError::Validation { detail });
            }
        }
        Ok(Self { file })
    }

    pub fn file(&self) -> &MirrorFile {
        &self.file
    }

    pub fn get(&self, name: &str) -> Option<&MirrorSchema> {
        self.file.mirrors.iter().find(|m| m.name == name)
    }

    /// The mirror replacing the C++ type `replaces`.
    pub fn by_replaced(&self, replaces: &str) -> Option<&MirrorSchema> {
        self.file.mirrors.iter().find(|m| m.replaces == replaces)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MirrorSchema> {
        self.file.mirrors.iter()
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.file.variant(name)
    }

    pub fn variants(&self) -> &[Variant] {
        &self.file.variants
    }

    pub fn types(&self) -> &[OpaqueType] {
        &self.file.types
    }

    /// Lay out mirror `mirror` under variant `variant`.
    pub fn compute(&self, mirror: &str, variant: &str, target: Target) -> Result<Layout> {
        let schema = self.get(mirror).ok_or_else(|| LayoutError::UnknownMirror {
            name: mirror.to_string(),
        })?;
        let variant = self.variant(variant).ok_or_else(|| LayoutError::UnknownVariant {
            name: variant.to_string(),
        })?;
        compute_layout(schema, &self.file.types, variant, target)
    }

    /// Lay out every mirror under every variant and pair the results with the recorded
    /// expectations for `target`'s word size.
    pub fn check_report(&self, target: Target) -> Result<Vec<CheckOutcome>> {
        let mut outcomes = Vec::new();
        for schema in self.iter() {
            for variant in self.variants() {
                let layout = compute_layout(schema, &self.file.types, variant, target)?;
                let expected = schema.expectation(&variant.name, target.word_bits);
                outcomes.push(CheckOutcome {
                    mirror: schema.name.clone(),
                    variant: variant.name.clone(),
                    word_bits: target.word_bits,
                    size: layout.size,
                    align: layout.align,
                    expected_size: expected.map(|e| e.size),
                    expected_align: expected.map(|e| e.align),
                });
            }
        }
        Ok(outcomes)
    }

    /// Compare every pinned fingerprint with the current field list.
    pub fn verify_fingerprints(&self) -> Result<()> {
        for schema in self.iter() {
            let Some(pinned) = &schema.fingerprint else {
                continue;
            };
            let computed = fingerprint(schema)?;
            if !pinned.eq_ignore_ascii_case(&computed) {
                return Err(LayoutError::FingerprintMismatch {
                    mirror: schema.name.clone(),
                    pinned: pinned.clone(),
                    computed,
                });
            }
        }
        Ok(())
    }

    /// Fail on the first pinned fingerprint or recorded size that no longer holds.
    pub fn check(&self, target: Target) -> Result<()> {
        self.verify_fingerprints()?;
        for outcome in self.check_report(target)? {
            if outcome.is_unchecked() {
                tracing::warn!(
                    mirror = %outcome.mirror,
                    variant = %outcome.variant,
                    word_bits = outcome.word_bits,
                    "no layout expectation recorded"
                );
                continue;
            }
            if outcome.is_drift() {
                return Err(LayoutError::LayoutDrift {
                    detail: format!(
                        "computed size {} align {}, recorded size {} align {}",
                        outcome.size,
                        outcome.align,
                        outcome.expected_size.unwrap_or_default(),
                        outcome.expected_align.unwrap_or_default()
                    ),
                    mirror: outcome.mirror,
                    variant: outcome.variant,
                    word_bits: outcome.word_bits,
                });
            }
        }
        tracing::debug!(word_bits = target.word_bits, "mirror layouts match their expectations");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_loads() {
        let registry = MirrorRegistry::builtin().unwrap();
        let names: Vec<_> = registry.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["CallArgsReplacement", "JSJitMethodCallArgsReplacement"]);
        assert_eq!(
            registry.by_replaced("JSJitMethodCallArgs").unwrap().name,
            "JSJitMethodCallArgsReplacement"
        );
        assert!(registry.variant("debug").unwrap().defines("JS_DEBUG"));
    }

    #[test]
    fn builtin_mirrors_differ_only_in_marker_type() {
        let registry = MirrorRegistry::builtin().unwrap();
        let call = registry.get("CallArgsReplacement").unwrap();
        let jit = registry.get("JSJitMethodCallArgsReplacement").unwrap();
        assert_eq!(call.fields.len(), jit.fields.len());
        for (a, b) in call.fields.iter().zip(&jit.fields) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.bits, b.bits);
            assert_eq!(a.guard, b.guard);
        }
        assert_eq!(call.fields[4].ty, "JS::detail::IncludeUsedRval");
        assert_eq!(jit.fields[4].ty, "JS::detail::NoUsedRval");
    }

    #[test]
    fn builtin_expectations_hold_on_both_word_sizes() {
        let registry = MirrorRegistry::builtin().unwrap();
        registry.check(Target::LP64).unwrap();
        registry.check(Target::ILP32).unwrap();

        let report = registry.check_report(Target::LP64).unwrap();
        assert_eq!(report.len(), 4);
        assert!(report.iter().all(|o| !o.is_drift() && !o.is_unchecked()));
    }

    #[test]
    fn debug_variant_places_the_marker() {
        let registry = MirrorRegistry::builtin().unwrap();
        let layout = registry.compute("CallArgsReplacement", "debug", Target::LP64).unwrap();
        assert_eq!(layout.field("wantUsedRval_").unwrap().byte_offset(), 13);
        let layout = registry.compute("CallArgsReplacement", "release", Target::LP64).unwrap();
        assert!(layout.field("wantUsedRval_").is_none());
    }

    #[test]
    fn unknown_names() {
        let registry = MirrorRegistry::builtin().unwrap();
        assert!(matches!(
            registry.compute("Nope", "release", Target::LP64),
            Err(LayoutError::UnknownMirror { .. })
        ));
        assert!(matches!(
            registry.compute("CallArgsReplacement", "profile", Target::LP64),
            Err(LayoutError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn zero_word_size_is_an_error() {
        let registry = MirrorRegistry::builtin().unwrap();
        let target = Target::new(0, crate::compute::Endianness::Little);
        assert!(matches!(
            registry.compute("CallArgsReplacement", "release", target),
            Err(LayoutError::UnsupportedWordSize { word_bits: 0 })
        ));
        assert!(registry.check_report(target).is_err());
    }

    #[test]
    fn edited_field_list_breaks_fingerprint() {
        let mut file = MirrorFile::parse(BUILTIN_MIRRORS).unwrap();
        file.mirrors[0].fields[1].ty = "unsigned short".into();
        let registry = MirrorRegistry::from_mirror_file(file).unwrap();
        let err = registry.check(Target::LP64).unwrap_err();
        assert!(matches!(err, LayoutError::FingerprintMismatch { mirror, .. } if mirror == "CallArgsReplacement"));
    }

    #[test]
    fn wrong_expectation_is_drift() {
        let mut file = MirrorFile::parse(BUILTIN_MIRRORS).unwrap();
        file.mirrors[1].expectations[0].size = 24;
        let registry = MirrorRegistry::from_mirror_file(file).unwrap();
        let err = registry.check(Target::LP64).unwrap_err();
        match err {
            LayoutError::LayoutDrift {
                mirror,
                variant,
                word_bits,
                ..
            } => {
                assert_eq!(mirror, "JSJitMethodCallArgsReplacement");
                assert_eq!(variant, "release");
                assert_eq!(word_bits, 64);
            }
            other => panic!("expected drift, got {other}"),
        }
    }

    #[test]
    fn invalid_file_is_rejected() {
        let mut file = MirrorFile::parse(BUILTIN_MIRRORS).unwrap();
        file.variants.clear();
        let err = MirrorRegistry::from_mirror_file(file).unwrap_err();
        assert!(matches!(err, LayoutError::Validation { .. }));
    }
}
