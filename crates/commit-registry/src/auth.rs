//! Authorization of on-behalf-of submissions.
//!
//! A caller committing for itself is always authorized. A caller committing for
//! someone else must present a proof. How the proof is checked depends on the
//! committer's account kind:
//!
//! - **Simple accounts** (the default) sign the authorization digest with the
//!   Ed25519 key their [`AccountId`] is derived from.
//! - **Programmatic accounts** are registered with the gate and decide for
//!   themselves through a [`ProgrammaticAccount`] callback.
//!
//! The gate does not implement any signature scheme for programmatic accounts;
//! it only enforces that a verifier said yes before a record is written.

use std::collections::HashMap;
use std::sync::Arc;

use commit_registry_types::{AccountId, Commitment, ExtraData};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use tracing::{debug, warn};

use crate::error::{AuthFailure, RegistryError, RegistryResult};

const AUTHORIZATION_DOMAIN: &[u8] = b"commit-registry-authorize-v1:";

/// Everything an on-behalf-of authorization is bound to.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizationRequest<'a> {
    pub caller: &'a AccountId,
    pub committer: &'a AccountId,
    pub commitment: &'a Commitment,
    pub extra_data: &'a ExtraData,
}

impl AuthorizationRequest<'_> {
    /// Domain-separated digest that proofs sign over.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(AUTHORIZATION_DOMAIN);
        hasher.update(self.caller.as_bytes());
        hasher.update(self.committer.as_bytes());
        hasher.update(self.commitment.as_bytes());
        hasher.update(&(self.extra_data.len() as u64).to_le_bytes());
        hasher.update(self.extra_data.as_bytes());
        *hasher.finalize().as_bytes()
    }
}

/// Proof that the committer agreed to a submission made by someone else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationProof {
    /// Ed25519 signature over [`AuthorizationRequest::digest`].
    Signature {
        public_key: [u8; 32],
        signature: Vec<u8>,
    },
    /// Opaque bytes handed to a programmatic account's callback.
    Callback(Vec<u8>),
}

impl AuthorizationProof {
    /// Sign a request as the simple account controlled by `key`.
    pub fn sign(key: &SigningKey, request: &AuthorizationRequest<'_>) -> Self {
        let signature = key.sign(&request.digest());
        Self::Signature {
            public_key: key.verifying_key().to_bytes(),
            signature: signature.to_bytes().to_vec(),
        }
    }
}

/// Callback implemented by programmatic accounts to approve submissions.
pub trait ProgrammaticAccount: Send + Sync {
    fn authorize(&self, request: &AuthorizationRequest<'_>, digest: &[u8; 32], proof: &[u8])
        -> bool;
}

/// Account kinds the gate can verify for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountKind {
    Simple,
    Programmatic,
}

/// Verifier capability selected from the committer's account metadata.
pub enum AccountVerifier {
    DirectSignature,
    Callback(Arc<dyn ProgrammaticAccount>),
}

impl AccountVerifier {
    pub fn verify(
        &self,
        request: &AuthorizationRequest<'_>,
        proof: &AuthorizationProof,
    ) -> Result<(), AuthFailure> {
        let digest = request.digest();
        match (self, proof) {
            (
                AccountVerifier::DirectSignature,
                AuthorizationProof::Signature {
                    public_key,
                    signature,
                },
            ) => verify_signature(request.committer, &digest, public_key, signature),
            (AccountVerifier::Callback(account), AuthorizationProof::Callback(bytes)) => {
                if account.authorize(request, &digest, bytes) {
                    Ok(())
                } else {
                    Err(AuthFailure::Rejected)
                }
            }
            _ => Err(AuthFailure::WrongProofKind),
        }
    }
}

fn verify_signature(
    committer: &AccountId,
    digest: &[u8; 32],
    public_key: &[u8; 32],
    signature: &[u8],
) -> Result<(), AuthFailure> {
    if !committer.is_controlled_by(public_key) {
        return Err(AuthFailure::KeyMismatch);
    }
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| AuthFailure::MalformedProof(format!("public key: {}", e)))?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| AuthFailure::MalformedProof(format!("signature: {}", e)))?;
    verifying_key
        .verify_strict(digest, &signature)
        .map_err(|_| AuthFailure::BadSignature)
}

/// Enforces that on-behalf-of submissions are authorized before recording.
#[derive(Default)]
pub struct AuthorizationGate {
    programmatic: HashMap<AccountId, Arc<dyn ProgrammaticAccount>>,
}

impl AuthorizationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `account` as programmatic, verified through `callback`.
    pub fn register_programmatic(
        &mut self,
        account: AccountId,
        callback: Arc<dyn ProgrammaticAccount>,
    ) {
        debug!(account = %account, "Programmatic account registered");
        self.programmatic.insert(account, callback);
    }

    /// Revert `account` to a simple account. Returns whether it was registered.
    pub fn deregister(&mut self, account: &AccountId) -> bool {
        self.programmatic.remove(account).is_some()
    }

    pub fn account_kind(&self, account: &AccountId) -> AccountKind {
        if self.programmatic.contains_key(account) {
            AccountKind::Programmatic
        } else {
            AccountKind::Simple
        }
    }

    pub fn verifier_for(&self, account: &AccountId) -> AccountVerifier {
        match self.programmatic.get(account) {
            Some(callback) => AccountVerifier::Callback(Arc::clone(callback)),
            None => AccountVerifier::DirectSignature,
        }
    }

    /// Authorize a submission. Fails closed.
    pub fn authorize(
        &self,
        request: &AuthorizationRequest<'_>,
        proof: Option<&AuthorizationProof>,
    ) -> RegistryResult<()> {
        if request.caller == request.committer {
            return Ok(());
        }

        let result = match proof {
            None => Err(AuthFailure::MissingProof),
            Some(proof) => self.verifier_for(request.committer).verify(request, proof),
        };

        result.map_err(|reason| {
            warn!(
                caller = %request.caller,
                committer = %request.committer,
                reason = %reason,
                "On-behalf-of submission refused"
            );
            RegistryError::Unauthorized {
                caller: *request.caller,
                committer: *request.committer,
                reason,
            }
        })
    }
}
