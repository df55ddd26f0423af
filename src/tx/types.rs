//! Transaction body types.
//!
//! Each body carries an explicit `type` discriminator as its first field and
//! serializes its fields in declaration order. Optional fields are encoded
//! as `null`, never omitted, so the signed bytes are unambiguous.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LbcError, LbcResult};
use crate::keys::Keypair;
use crate::shared::new_entity_id;

/// Body discriminator.
///
/// `Commiter` keeps the ledger's spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Commiter,
    Beneficiary,
    Promise,
    Commitment,
}

impl BodyKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commiter => "commiter",
            Self::Beneficiary => "beneficiary",
            Self::Promise => "promise",
            Self::Commitment => "commitment",
        }
    }
}

impl std::fmt::Display for BodyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value that can be signed into an envelope.
pub trait Payload: Serialize + DeserializeOwned {
    /// Short name used in logs.
    const LABEL: &'static str;

    /// Structural checks run before signing and after decoding.
    fn validate(&self) -> LbcResult<()>;
}

fn expect_kind(actual: BodyKind, expected: BodyKind) -> LbcResult<()> {
    if actual != expected {
        return Err(LbcError::InvalidInput(format!(
            "body type is {:?}, expected {:?}",
            actual.as_str(),
            expected.as_str()
        )));
    }
    Ok(())
}

// ============================================================================
// Identity
// ============================================================================

/// Identity registration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommiterBody {
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// `commiter:<base64 pubkey>`
    pub id: String,
    pub name: String,
    /// Public key (standard base64)
    pub commiter_pubkey: String,
}

impl CommiterBody {
    /// Identity body for the given keypair. The id is derived from the key.
    pub fn for_keypair(name: impl Into<String>, keypair: &Keypair) -> Self {
        Self {
            kind: BodyKind::Commiter,
            id: keypair.identity_id(),
            name: name.into(),
            commiter_pubkey: keypair.public_key_base64(),
        }
    }
}

impl Payload for CommiterBody {
    const LABEL: &'static str = "commiter";

    fn validate(&self) -> LbcResult<()> {
        expect_kind(self.kind, BodyKind::Commiter)
    }
}

// ============================================================================
// Beneficiary
// ============================================================================

/// Beneficiary creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryBody {
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// `beneficiary:<uuid>`
    pub id: String,
    pub name: String,
}

impl BeneficiaryBody {
    /// Create a beneficiary with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: BodyKind::Beneficiary,
            id: new_entity_id("beneficiary"),
            name: name.into(),
        }
    }
}

impl Payload for BeneficiaryBody {
    const LABEL: &'static str = "beneficiary";

    fn validate(&self) -> LbcResult<()> {
        expect_kind(self.kind, BodyKind::Beneficiary)
    }
}

// ============================================================================
// Promise
// ============================================================================

/// Promise body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseBody {
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// `promise:<uuid>`
    pub id: String,
    pub text: String,
    /// Unix seconds (UTC)
    pub due: i64,
    pub beneficiary_id: String,
    /// Parent promise, encoded as `null` when absent
    pub parent_promise_id: Option<String>,
}

impl PromiseBody {
    /// Create a root promise with a freshly generated id.
    pub fn new(text: impl Into<String>, due: i64, beneficiary_id: impl Into<String>) -> Self {
        Self {
            kind: BodyKind::Promise,
            id: new_entity_id("promise"),
            text: text.into(),
            due,
            beneficiary_id: beneficiary_id.into(),
            parent_promise_id: None,
        }
    }

    /// Attach this promise under a parent promise.
    pub fn with_parent(mut self, parent_promise_id: impl Into<String>) -> Self {
        self.parent_promise_id = Some(parent_promise_id.into());
        self
    }
}

impl Payload for PromiseBody {
    const LABEL: &'static str = "promise";

    fn validate(&self) -> LbcResult<()> {
        expect_kind(self.kind, BodyKind::Promise)
    }
}

// ============================================================================
// Commitment
// ============================================================================

/// Commitment body: an identity committing to a promise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentBody {
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// `commitment:<uuid>`
    pub id: String,
    pub promise_id: String,
    pub commiter_id: String,
    /// Unix seconds (UTC)
    pub due: i64,
}

impl CommitmentBody {
    /// Create a commitment to `promise` by `commiter_id`.
    pub fn for_promise(promise: &PromiseBody, commiter_id: impl Into<String>, due: i64) -> Self {
        Self {
            kind: BodyKind::Commitment,
            id: new_entity_id("commitment"),
            promise_id: promise.id.clone(),
            commiter_id: commiter_id.into(),
            due,
        }
    }
}

impl Payload for CommitmentBody {
    const LABEL: &'static str = "commitment";

    fn validate(&self) -> LbcResult<()> {
        expect_kind(self.kind, BodyKind::Commitment)
    }
}

// ============================================================================
// Composite: promise + commitment
// ============================================================================

/// A promise and its originating commitment, signed and submitted as one
/// atomic unit.
///
/// Both members are always present and the commitment always references
/// the promise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeBody {
    pub promise: PromiseBody,
    pub commitment: CommitmentBody,
}

impl CompositeBody {
    /// Bind a promise and commitment.
    ///
    /// # Errors
    ///
    /// Returns [`LbcError::InvalidInput`] if the commitment does not
    /// reference the promise.
    pub fn new(promise: PromiseBody, commitment: CommitmentBody) -> LbcResult<Self> {
        let body = Self {
            promise,
            commitment,
        };
        body.validate()?;
        Ok(body)
    }
}

impl Payload for CompositeBody {
    const LABEL: &'static str = "promise+commitment";

    fn validate(&self) -> LbcResult<()> {
        self.promise.validate()?;
        self.commitment.validate()?;
        if self.commitment.promise_id != self.promise.id {
            return Err(LbcError::InvalidInput(format!(
                "commitment {} references promise {}, expected {}",
                self.commitment.id, self.commitment.promise_id, self.promise.id
            )));
        }
        Ok(())
    }
}
