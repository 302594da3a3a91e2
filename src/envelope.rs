//! Signed envelope construction for the ingestion wire format.
//!
//! The envelope is a typed record with a fixed field list; `serde_json`
//! serializes struct fields in declaration order, which makes the
//! serialization canonical. Signing is a two-pass protocol:
//!
//! 1. serialize with `signature` set to 64 `'0'` characters (the
//!    HMAC-SHA256 output length in hex);
//! 2. compute HMAC-SHA256 over exactly those bytes and hex-encode it;
//! 3. substitute the real signature and re-serialize.
//!
//! A verifier reverses the substitution: zero the signature field,
//! re-serialize, and recompute the MAC. Any change to field order or
//! formatting breaks verification, so the payload shape lives here and
//! nowhere else.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Hex length of an HMAC-SHA256 signature (32 bytes).
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Envelope format version understood by the ingestion service.
const PROTECTED_VERSION: &str = "v1";
/// MAC algorithm identifier.
const PROTECTED_ALGORITHM: &str = "HS256";

// ---------------------------------------------------------------------------
// SignError
// ---------------------------------------------------------------------------

/// Errors raised while signing or verifying an envelope.
#[derive(Debug, Error)]
pub enum SignError {
    /// The signing key was rejected by the MAC implementation.
    #[error("invalid signing key: {0}")]
    Key(String),

    /// The envelope could not be (de)serialized.
    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The embedded signature is not valid hex of the expected length.
    #[error("malformed signature field: {0}")]
    MalformedSignature(String),

    /// Recomputing the MAC did not reproduce the embedded signature.
    #[error("envelope signature mismatch")]
    Mismatch,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Protected header: format version and MAC algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protected {
    pub ver: String,
    pub alg: String,
}

/// One sensor description inside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub units: String,
}

/// Envelope payload: device identity plus the sampled values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub device_name: String,
    pub device_type: String,
    pub interval_ms: f64,
    pub sensors: Vec<Sensor>,
    pub values: Vec<f32>,
}

/// The full signed record. Field order is the canonical serialization
/// order — do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub protected: Protected,
    pub signature: String,
    pub payload: Payload,
}

/// An envelope together with the exact JSON body to put on the wire.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub envelope: Envelope,
    /// Serialization of `envelope` with the real signature in place.
    pub body: String,
}

// ---------------------------------------------------------------------------
// EnvelopeBuilder
// ---------------------------------------------------------------------------

/// Builds signed envelopes for one device identity.
///
/// Holds the pre-shared HMAC key and the device fields; everything else
/// comes in per call.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    hmac_key: Vec<u8>,
    device_name: String,
    device_type: String,
}

impl EnvelopeBuilder {
    pub fn new(
        hmac_key: impl Into<Vec<u8>>,
        device_name: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            hmac_key: hmac_key.into(),
            device_name: device_name.into(),
            device_type: device_type.into(),
        }
    }

    /// Wrap `values` in a signed envelope.
    ///
    /// `interval_ms` is the sampling interval of `values` in milliseconds
    /// (0.0625 for 16 kHz audio).
    pub fn build(&self, values: Vec<f32>, interval_ms: f64) -> Result<SignedEnvelope, SignError> {
        let mut envelope = Envelope {
            protected: Protected {
                ver: PROTECTED_VERSION.into(),
                alg: PROTECTED_ALGORITHM.into(),
            },
            signature: "0".repeat(SIGNATURE_HEX_LEN),
            payload: Payload {
                device_name: self.device_name.clone(),
                device_type: self.device_type.clone(),
                interval_ms,
                sensors: vec![Sensor {
                    name: "audio".into(),
                    units: "wav".into(),
                }],
                values,
            },
        };

        // Pass 1: MAC over the zero-signature serialization.
        let unsigned = serde_json::to_vec(&envelope)?;
        let mut mac = HmacSha256::new_from_slice(&self.hmac_key)
            .map_err(|e| SignError::Key(e.to_string()))?;
        mac.update(&unsigned);
        let signature = hex::encode(mac.finalize().into_bytes());

        // Pass 2: substitute and re-serialize.
        envelope.signature = signature;
        let body = serde_json::to_string(&envelope)?;

        Ok(SignedEnvelope { envelope, body })
    }
}

// ---------------------------------------------------------------------------
// verify_envelope
// ---------------------------------------------------------------------------

/// Check the embedded signature of a serialized envelope.
///
/// Reproduces the builder's zero-signature serialization from the received
/// body and recomputes the MAC with `key`.
///
/// # Errors
///
/// [`SignError::Mismatch`] when the signature does not check out;
/// serialization or signature-format variants when the body is malformed.
pub fn verify_envelope(body: &str, key: &[u8]) -> Result<(), SignError> {
    let mut envelope: Envelope = serde_json::from_str(body)?;

    let claimed = hex::decode(&envelope.signature)
        .map_err(|e| SignError::MalformedSignature(e.to_string()))?;
    if envelope.signature.len() != SIGNATURE_HEX_LEN {
        return Err(SignError::MalformedSignature(format!(
            "expected {SIGNATURE_HEX_LEN} hex characters, got {}",
            envelope.signature.len()
        )));
    }

    envelope.signature = "0".repeat(SIGNATURE_HEX_LEN);
    let unsigned = serde_json::to_vec(&envelope)?;

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SignError::Key(e.to_string()))?;
    mac.update(&unsigned);
    mac.verify_slice(&claimed).map_err(|_| SignError::Mismatch)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
