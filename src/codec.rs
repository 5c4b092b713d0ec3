//! Payload encoding for vibe options.
//!
//! Option payloads are typed only at the API boundary. Inside the database
//! they are opaque byte blobs produced by a [`PayloadCodec`]; readers must
//! decode with the same codec and a compatible type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeDBError};

/// Encoding used for option payload blobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadCodec {
    /// JSON via `serde_json`. Self-describing and readable in a hex dump.
    #[default]
    Json,

    /// bincode. Compact, but not self-describing: the reader's type must
    /// match the writer's exactly.
    Bincode,
}

impl PayloadCodec {
    /// Encodes a payload value to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VibeDBError::Payload`] if the value cannot be serialized.
    pub fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        match self {
            Self::Json => serde_json::to_vec(value).map_err(|e| VibeDBError::payload(e.to_string())),
            Self::Bincode => {
                bincode::serialize(value).map_err(|e| VibeDBError::payload(e.to_string()))
            }
        }
    }

    /// Decodes a payload blob into `V`.
    ///
    /// # Errors
    ///
    /// Returns [`VibeDBError::Payload`] if the bytes are not a valid `V`.
    pub fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V> {
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| VibeDBError::payload(e.to_string()))
            }
            Self::Bincode => {
                bincode::deserialize(bytes).map_err(|e| VibeDBError::payload(e.to_string()))
            }
        }
    }
}
