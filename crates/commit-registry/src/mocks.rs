use std::sync::atomic::{AtomicUsize, Ordering};

use crate::auth::{AuthorizationRequest, ProgrammaticAccount};

/// Mock programmatic account for testing.
///
/// Can be configured to approve everything, deny everything, or approve only
/// a specific proof payload. Counts how often it was consulted.
pub struct MockProgrammaticAccount {
    expected: Option<Vec<u8>>,
    approve: bool,
    calls: AtomicUsize,
}

impl MockProgrammaticAccount {
    /// Create an account that approves every proof.
    pub fn approve_all() -> Self {
        Self {
            expected: None,
            approve: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create an account that rejects every proof.
    pub fn deny_all() -> Self {
        Self {
            expected: None,
            approve: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create an account that approves exactly `proof`.
    pub fn accepting(proof: &[u8]) -> Self {
        Self {
            expected: Some(proof.to_vec()),
            approve: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProgrammaticAccount for MockProgrammaticAccount {
    fn authorize(
        &self,
        _request: &AuthorizationRequest<'_>,
        _digest: &[u8; 32],
        proof: &[u8],
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.expected {
            Some(expected) => expected.as_slice() == proof,
            None => self.approve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commit_registry_types::{AccountId, Commitment, ExtraData};

    #[test]
    fn mock_decisions() {
        let a = AccountId::from_bytes([1; 32]);
        let c = Commitment::from_bytes([2; 32]);
        let e = ExtraData::empty();
        let request = AuthorizationRequest {
            caller: &a,
            committer: &a,
            commitment: &c,
            extra_data: &e,
        };
        let digest = request.digest();

        let approve = MockProgrammaticAccount::approve_all();
        assert!(approve.authorize(&request, &digest, b"anything"));
        assert_eq!(approve.calls(), 1);

        assert!(!MockProgrammaticAccount::deny_all().authorize(&request, &digest, b""));

        let exact = MockProgrammaticAccount::accepting(b"sig");
        assert!(exact.authorize(&request, &digest, b"sig"));
        assert!(!exact.authorize(&request, &digest, b"gis"));
        assert_eq!(exact.calls(), 2);
    }
}
