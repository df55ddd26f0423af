//! Transaction bodies, canonical encoding, and signed envelopes.

pub mod canonical;
pub mod envelope;
pub mod types;

pub use canonical::{to_canonical_vec, HtmlSafeFormatter};
pub use envelope::SignedTx;
pub use types::{
    BeneficiaryBody, BodyKind, CommiterBody, CommitmentBody, CompositeBody, Payload, PromiseBody,
};
