//! Error types for mirror loading, layout computation and checking.

use std::path::PathBuf;

/// Errors that can occur while loading or checking layout mirrors.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error while fingerprinting.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading a mirror file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mirror file not found.
    #[error("mirror file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The file declares a schema version this crate does not understand.
    #[error("unsupported mirror schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Layout is only defined for 32- and 64-bit targets.
    #[error("unsupported word size {word_bits} (expected 32 or 64)")]
    UnsupportedWordSize { word_bits: u32 },

    /// A field names a type that is neither built in nor declared.
    #[error("unknown type '{ty}' in field '{field}'")]
    UnknownType { field: String, ty: String },

    /// A field declaration that cannot be laid out.
    #[error("invalid field '{field}': {detail}")]
    InvalidField { field: String, detail: String },

    /// A guard whose string form is malformed.
    #[error("invalid guard '{guard}'")]
    InvalidGuard { guard: String },

    /// No mirror with this name.
    #[error("unknown mirror '{name}'")]
    UnknownMirror { name: String },

    /// No build variant with this name.
    #[error("unknown build variant '{name}'")]
    UnknownVariant { name: String },

    /// Structural problems found by validation.
    #[error("invalid mirror file: {detail}")]
    Validation {
        /// All error-severity issues, joined.
        detail: String,
    },

    /// Computed layout disagrees with the recorded expectation.
    #[error("layout drift in '{mirror}' ({variant}, {word_bits}-bit): {detail}")]
    LayoutDrift {
        mirror: String,
        variant: String,
        word_bits: u32,
        detail: String,
    },

    /// Field list changed without updating the pinned fingerprint.
    #[error("fingerprint mismatch in '{mirror}': pinned {pinned}, computed {computed}")]
    FingerprintMismatch {
        mirror: String,
        pinned: String,
        computed: String,
    },
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
