//! Signed transaction envelope.
//!
//! The envelope is `{"body": <body JSON>, "signature": "<base64>"}` where
//! the signature covers exactly the canonical body bytes. The body is held
//! as raw JSON so the bytes transmitted are the bytes that were signed.

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::canonical::to_canonical_vec;
use super::types::Payload;
use crate::error::{LbcError, LbcResult};
use crate::keys::Keypair;

/// A body paired with an ed25519 signature over its canonical bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTx {
    body: Box<RawValue>,
    /// Standard base64 (padded)
    signature: String,
}

impl SignedTx {
    /// Encode `payload` canonically and sign it.
    ///
    /// The payload is validated first; nothing is signed if it is rejected.
    pub fn sign<P: Payload>(keypair: &Keypair, payload: &P) -> LbcResult<Self> {
        payload.validate()?;
        let bytes = to_canonical_vec(payload)?;
        let signature = keypair.sign(&bytes);
        let text = String::from_utf8(bytes).map_err(|e| LbcError::Encoding(e.to_string()))?;
        let body = RawValue::from_string(text).map_err(|e| LbcError::Encoding(e.to_string()))?;

        tracing::debug!(
            kind = P::LABEL,
            len = body.get().len(),
            "signed transaction body"
        );

        Ok(Self {
            body,
            signature: STANDARD.encode(signature.to_bytes()),
        })
    }

    /// The exact bytes covered by the signature.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.get().as_bytes()
    }

    /// The signature as base64.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Decode the body into a typed payload and validate it.
    pub fn payload<P: Payload>(&self) -> LbcResult<P> {
        let payload: P = serde_json::from_str(self.body.get())
            .map_err(|e| LbcError::InvalidInput(format!("decode {} body: {e}", P::LABEL)))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Check the signature against `key`.
    pub fn verify(&self, key: &VerifyingKey) -> LbcResult<()> {
        let raw = STANDARD
            .decode(&self.signature)
            .map_err(|e| LbcError::InvalidInput(format!("signature is not base64: {e}")))?;
        let signature = Signature::from_slice(&raw)
            .map_err(|e| LbcError::InvalidInput(format!("malformed signature: {e}")))?;
        key.verify(self.body_bytes(), &signature)
            .map_err(|_| LbcError::InvalidInput("signature does not match body".to_string()))
    }

    /// Serialize the envelope. These bytes are the transaction.
    pub fn to_vec(&self) -> LbcResult<Vec<u8>> {
        to_canonical_vec(self)
    }

    /// Envelope bytes as standard base64, the form carried in RPC params.
    pub fn to_base64(&self) -> LbcResult<String> {
        Ok(STANDARD.encode(self.to_vec()?))
    }

    /// Parse envelope bytes. The body is kept verbatim.
    pub fn from_slice(bytes: &[u8]) -> LbcResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| LbcError::InvalidInput(format!("decode envelope: {e}")))
    }

    /// Parse a base64-encoded envelope.
    pub fn from_base64(encoded: &str) -> LbcResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| LbcError::InvalidInput(format!("envelope is not base64: {e}")))?;
        Self::from_slice(&bytes)
    }
}
