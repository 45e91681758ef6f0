//! Persisted record type.

use serde::{Deserialize, Serialize};

/// A stored client entry.
///
/// Serialized as `{"phone": "<hex>", "data": null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Hex-encoded ciphertext of the phone number
    #[serde(rename = "phone")]
    pub cipher_phone: String,

    /// Reserved for an asymmetric envelope; never populated, carried through unchanged
    #[serde(rename = "data", default)]
    pub aux: Option<serde_json::Value>,
}

impl Record {
    /// Create a record holding only the phone ciphertext.
    pub fn new(cipher_phone: impl Into<String>) -> Self {
        Self {
            cipher_phone: cipher_phone.into(),
            aux: None,
        }
    }
}
