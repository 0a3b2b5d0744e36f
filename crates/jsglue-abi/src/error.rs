//! Error types for manifests, configuration and generation.

use std::path::PathBuf;

/// Errors that can occur while loading or generating ABI artifacts.
#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    /// Failed to parse a C or C++ function declaration.
    #[error("invalid C signature: {detail}")]
    InvalidCSignature { detail: String },

    /// An export manifest that fails validation.
    #[error("invalid export manifest: {detail}")]
    InvalidManifest { detail: String },

    /// A binding configuration that fails validation.
    #[error("invalid binding configuration: {detail}")]
    InvalidConfig { detail: String },

    /// Build variant not declared by the mirror registry.
    #[error("unknown build variant '{name}'")]
    UnknownVariant { name: String },

    /// Mirror registry error.
    #[error("layout error: {0}")]
    Layout(#[from] jsglue_layout::LayoutError),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
}

/// Result type alias for ABI operations.
pub type Result<T> = std::result::Result<T, AbiError>;
