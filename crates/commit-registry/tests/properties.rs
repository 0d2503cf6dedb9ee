//! Property tests: ordering, facade equivalence, duplicate policy and
//! authorization hold for arbitrary call sequences.

use std::sync::Arc;

use commit_registry::{
    AccountId, AuthorizationProof, CallContext, Commitment, CommitmentRegistry, EventJournal,
    ExtraData, OrderingMode, RegistryConfig, RegistryError,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A call: (caller seed, commitment seed, time hint).
fn arb_calls() -> impl Strategy<Value = Vec<(u8, u8, u64)>> {
    prop::collection::vec((0u8..4, any::<u8>(), 0u64..40), 1..60)
}

fn arb_mode() -> impl Strategy<Value = OrderingMode> {
    prop_oneof![Just(OrderingMode::Strict), Just(OrderingMode::Weak)]
}

fn account(seed: u8) -> AccountId {
    AccountId::from_bytes([seed; 32])
}

fn commitment(seed: u8) -> Commitment {
    Commitment::from_bytes([seed; 32])
}

fn tolerant(mode: OrderingMode) -> RegistryConfig {
    RegistryConfig {
        ordering: mode,
        // Hints are drawn from 0..40, so regressions are always absorbed.
        max_regression_ticks: 64,
        ..RegistryConfig::default()
    }
}

proptest! {
    #[test]
    fn timepoints_are_monotonic(mode in arb_mode(), calls in arb_calls()) {
        let mut registry = CommitmentRegistry::new(tolerant(mode));
        let mut accepted = Vec::new();

        for (caller, c, hint) in calls {
            match registry.commit(&CallContext::new(account(caller), hint), commitment(c)) {
                Ok(tp) => accepted.push(tp),
                Err(RegistryError::DuplicateCommitment { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }

        for pair in accepted.windows(2) {
            match mode {
                OrderingMode::Strict => prop_assert!(pair[0] < pair[1]),
                OrderingMode::Weak => prop_assert!(pair[0] <= pair[1]),
            }
        }
    }

    #[test]
    fn commit_equals_commit_from_self(calls in arb_calls()) {
        let minimal_journal = Arc::new(EventJournal::new());
        let general_journal = Arc::new(EventJournal::new());
        let mut minimal = CommitmentRegistry::new(tolerant(OrderingMode::Strict));
        let mut general = CommitmentRegistry::new(tolerant(OrderingMode::Strict));
        minimal.add_emitter(minimal_journal.clone());
        general.add_emitter(general_journal.clone());

        for (caller, c, hint) in calls {
            let ctx = CallContext::new(account(caller), hint);
            let a = minimal.commit(&ctx, commitment(c));
            let b = general.commit_from(&ctx, ctx.caller, commitment(c), ExtraData::empty(), None);
            prop_assert_eq!(a, b);
        }

        prop_assert_eq!(minimal.snapshot(), general.snapshot());
        prop_assert_eq!(minimal_journal.events(), general_journal.events());
    }

    #[test]
    fn store_wide_duplicates_never_change_state(calls in arb_calls()) {
        let mut registry = CommitmentRegistry::new(tolerant(OrderingMode::Strict));

        for (caller, c, hint) in calls {
            let before = registry.snapshot();
            let seen = registry.lookup(&commitment(c)).is_some();
            let result = registry.commit(&CallContext::new(account(caller), hint), commitment(c));
            if seen {
                let is_duplicate = matches!(result, Err(RegistryError::DuplicateCommitment { .. }));
                prop_assert!(is_duplicate);
                prop_assert_eq!(registry.snapshot(), before);
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }

    #[test]
    fn forged_proofs_are_rejected(
        committer in 4u8..8,
        caller in 0u8..4,
        c in any::<u8>(),
        sig in prop::collection::vec(any::<u8>(), 0..80),
        key in any::<[u8; 32]>(),
    ) {
        let journal = Arc::new(EventJournal::new());
        let mut registry = CommitmentRegistry::new(RegistryConfig::default());
        registry.add_emitter(journal.clone());

        let proof = AuthorizationProof::Signature { public_key: key, signature: sig };
        let result = registry.commit_from(
            &CallContext::new(account(caller), 1),
            account(committer),
            commitment(c),
            ExtraData::empty(),
            Some(&proof),
        );

        let is_unauthorized = matches!(result, Err(RegistryError::Unauthorized { .. }));
        prop_assert!(is_unauthorized);
        prop_assert!(registry.is_empty());
        prop_assert!(journal.is_empty());
    }
}
