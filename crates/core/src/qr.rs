//! QR payload codec.
//!
//! Payloads are plaintext JSON carrying the identity of the ticket they were
//! issued for. There is no signature; integrity is checked by matching the
//! decoded fields against the ticket row the scanner claims to present.

use serde::{Deserialize, Serialize};

use crate::codes::RejectCode;
use crate::types::{DbId, Timestamp};

/// Decoded QR payload.
///
/// Immutable after issuance: the bytes stored on the ticket row are the
/// source of truth and are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub issued_at: Timestamp,
    pub version: String,
    pub algorithm: String,
}

/// Why a QR payload failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QrDecodeError {
    /// The bytes are not valid UTF-8 or not valid JSON at all.
    #[error("QR payload is not readable")]
    Corrupted,
    /// The bytes parse as JSON but do not have the expected shape.
    #[error("QR payload has an invalid format")]
    InvalidFormat,
}

impl QrDecodeError {
    /// The reject code this decode failure maps to on the wire.
    pub fn reject_code(self) -> RejectCode {
        match self {
            QrDecodeError::Corrupted => RejectCode::CorruptedQrCode,
            QrDecodeError::InvalidFormat => RejectCode::InvalidQrFormat,
        }
    }
}

/// Serialize a payload to the bytes stored on the ticket row.
pub fn encode(payload: &QrPayload) -> Vec<u8> {
    // QrPayload has no map keys that can fail to serialize.
    serde_json::to_vec(payload).expect("QR payload serialization cannot fail")
}

/// Decode stored payload bytes.
///
/// Distinguishes unreadable bytes ([`QrDecodeError::Corrupted`]) from
/// well-formed JSON of the wrong shape ([`QrDecodeError::InvalidFormat`]),
/// because the two map to different wire codes.
pub fn decode(bytes: &[u8]) -> Result<QrPayload, QrDecodeError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|_| QrDecodeError::Corrupted)?;
    serde_json::from_value(value).map_err(|_| QrDecodeError::InvalidFormat)
}
