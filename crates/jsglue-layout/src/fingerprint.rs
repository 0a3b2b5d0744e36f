//! Content fingerprints of mirror field lists.
//!
//! A fingerprint is the SHA-256 of the compact JSON encoding of a mirror's fields. Pinning
//! it in the mirror file turns any edit to the field list into a check failure until the
//! pin, the expectations and the Rust mirror struct are updated together.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::schema::MirrorSchema;

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute the SHA-256 content hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> Result<ContentHash> {
    let json = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(hasher.finalize().into())
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex fingerprint of `schema`'s field list.
pub fn fingerprint(schema: &MirrorSchema) -> Result<String> {
    Ok(hash_hex(&content_hash(&schema.fields)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MirrorField, MirrorSchema};

    fn schema(names: &[&str]) -> MirrorSchema {
        MirrorSchema {
            name: "M".into(),
            replaces: "ns::M".into(),
            access: Default::default(),
            stack_class: false,
            fields: names
                .iter()
                .map(|n| MirrorField {
                    name: n.to_string(),
                    ty: "int".into(),
                    bits: None,
                    guard: None,
                })
                .collect(),
            expectations: Vec::new(),
            fingerprint: None,
        }
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = fingerprint(&schema(&["a"])).unwrap();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn field_order_matters() {
        let ab = fingerprint(&schema(&["a", "b"])).unwrap();
        let ba = fingerprint(&schema(&["b", "a"])).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(ab, fingerprint(&schema(&["a", "b"])).unwrap());
    }

    #[test]
    fn metadata_does_not_affect_fingerprint() {
        let mut renamed = schema(&["a"]);
        renamed.name = "Other".into();
        renamed.replaces = "ns::Other".into();
        assert_eq!(fingerprint(&renamed).unwrap(), fingerprint(&schema(&["a"])).unwrap());
    }
}
