use std::collections::{BTreeMap, BTreeSet, HashMap};

use commit_registry_types::{AccountId, Commitment, CommitmentRecord, ExtraData, Timepoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{ClockState, OrderingClock};
use crate::config::{DuplicatePolicy, MissingRemoval, OrderingMode};
use crate::error::{RegistryError, RegistryResult};

/// Duplicate and removal rules applied by a [`CommitmentStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorePolicy {
    pub duplicates: DuplicatePolicy,
    /// Keep removed keys reserved so they cannot be recorded again
    pub retain_history: bool,
    pub missing_removal: MissingRemoval,
}

/// Filter for querying stored records.
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    pub committer: Option<AccountId>,
    pub time_range: Option<(Timepoint, Timepoint)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_committer(mut self, committer: AccountId) -> Self {
        self.committer = Some(committer);
        self
    }

    /// Inclusive on both ends.
    pub fn with_time_range(mut self, from: Timepoint, to: Timepoint) -> Self {
        self.time_range = Some((from, to));
        self
    }

    pub fn matches(&self, record: &CommitmentRecord) -> bool {
        if let Some(ref committer) = self.committer {
            if record.committer != *committer {
                return false;
            }
        }

        if let Some((ref from, ref to)) = self.time_range {
            if record.timepoint < *from || record.timepoint > *to {
                return false;
            }
        }

        true
    }
}

/// Serializable image of the store: the persisted state layout.
///
/// `records` is the acceptance order; restoring replays it in that order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Live records in acceptance order
    pub records: Vec<CommitmentRecord>,
    /// Keys reserved by `retain_history`
    pub retired: Vec<RetiredKey>,
    pub clock: ClockState,
}

/// A removed `(committer, commitment)` pair kept for historical uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RetiredKey {
    pub commitment: Commitment,
    pub committer: AccountId,
}

/// Authoritative mapping of accepted commitments to their records.
///
/// Records are immutable once stored; the only mutation is whole-record removal.
/// The store owns the ordering clock so that timepoint assignment and insertion
/// happen in one step.
pub struct CommitmentStore {
    /// Live records keyed by acceptance sequence
    log: BTreeMap<u64, CommitmentRecord>,
    /// Acceptance sequences per commitment value, oldest first. Under
    /// store-wide policy each list holds at most one entry.
    index: HashMap<Commitment, Vec<u64>>,
    next_seq: u64,
    retired: BTreeSet<RetiredKey>,
    clock: OrderingClock,
    policy: StorePolicy,
}

impl CommitmentStore {
    pub fn new(policy: StorePolicy, clock: OrderingClock) -> Self {
        Self {
            log: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
            retired: BTreeSet::new(),
            clock,
            policy,
        }
    }

    /// Rebuild a store from a snapshot, checking ordering and duplicate invariants.
    pub fn restore(
        policy: StorePolicy,
        mode: OrderingMode,
        max_regression: u64,
        snapshot: StoreSnapshot,
    ) -> RegistryResult<Self> {
        let clock = OrderingClock::restore(mode, max_regression, snapshot.clock);
        let mut store = Self::new(policy, clock);
        store.retired = snapshot.retired.into_iter().collect();

        let mut prev: Option<Timepoint> = None;
        for record in snapshot.records {
            if let Some(prev) = prev {
                let ordered = match mode {
                    OrderingMode::Strict => record.timepoint > prev,
                    OrderingMode::Weak => record.timepoint >= prev,
                };
                if !ordered {
                    return Err(RegistryError::InvalidSnapshot(format!(
                        "timepoint {} of {} breaks ordering after {}",
                        record.timepoint, record.commitment, prev
                    )));
                }
            }
            match store.clock.last() {
                Some(last) if record.timepoint <= last => {}
                _ => {
                    return Err(RegistryError::InvalidSnapshot(format!(
                        "timepoint {} of {} is ahead of the clock",
                        record.timepoint, record.commitment
                    )))
                }
            }
            if store.is_duplicate(&record.commitment, &record.committer) {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "duplicate commitment {} under {} policy",
                    record.commitment, policy.duplicates
                )));
            }
            prev = Some(record.timepoint);
            store.insert(record);
        }

        Ok(store)
    }

    /// Record a new commitment and assign its timepoint.
    ///
    /// Fails with `DuplicateCommitment` if the policy forbids the key, or with
    /// `ClockRegression` if the clock cannot order it. Neither failure changes state.
    pub fn record(
        &mut self,
        commitment: Commitment,
        committer: AccountId,
        extra_data: ExtraData,
        time_hint: u64,
    ) -> RegistryResult<&CommitmentRecord> {
        if self.is_duplicate(&commitment, &committer) {
            debug!(commitment = %commitment, committer = %committer, "Duplicate commitment rejected");
            return Err(RegistryError::DuplicateCommitment {
                commitment,
                committer,
                policy: self.policy.duplicates,
            });
        }

        let timepoint = self.clock.next(time_hint)?;
        let record = CommitmentRecord {
            commitment,
            committer,
            extra_data,
            timepoint,
        };
        Ok(self.insert(record))
    }

    fn insert(&mut self, record: CommitmentRecord) -> &CommitmentRecord {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.entry(record.commitment).or_default().push(seq);
        self.log.entry(seq).or_insert(record)
    }

    /// Live records for a commitment value, oldest first.
    fn records_for<'a>(
        &'a self,
        commitment: &Commitment,
    ) -> impl Iterator<Item = (u64, &'a CommitmentRecord)> + 'a {
        self.index
            .get(commitment)
            .into_iter()
            .flatten()
            .filter_map(|seq| self.log.get(seq).map(|record| (*seq, record)))
    }

    fn is_duplicate(&self, commitment: &Commitment, committer: &AccountId) -> bool {
        match self.policy.duplicates {
            DuplicatePolicy::StoreWide => {
                self.records_for(commitment).next().is_some()
                    || (self.policy.retain_history
                        && self.retired.iter().any(|k| k.commitment == *commitment))
            }
            DuplicatePolicy::PerCommitter => {
                self.records_for(commitment)
                    .any(|(_, r)| r.committer == *committer)
                    || (self.policy.retain_history
                        && self.retired.contains(&RetiredKey {
                            commitment: *commitment,
                            committer: *committer,
                        }))
            }
        }
    }

    /// Earliest live record for a commitment value.
    pub fn lookup(&self, commitment: &Commitment) -> Option<&CommitmentRecord> {
        self.records_for(commitment).next().map(|(_, record)| record)
    }

    /// The record a specific committer holds for a commitment value.
    pub fn lookup_by(
        &self,
        committer: &AccountId,
        commitment: &Commitment,
    ) -> Option<&CommitmentRecord> {
        self.records_for(commitment)
            .map(|(_, record)| record)
            .find(|r| r.committer == *committer)
    }

    /// Remove every record for a commitment value.
    ///
    /// Absent commitments yield `NotFound` or an empty list, per policy.
    pub fn remove(&mut self, commitment: &Commitment) -> RegistryResult<Vec<CommitmentRecord>> {
        match self.index.remove(commitment) {
            Some(seqs) => {
                let removed: Vec<CommitmentRecord> =
                    seqs.iter().filter_map(|seq| self.log.remove(seq)).collect();
                for record in &removed {
                    self.retire(record);
                }
                info!(commitment = %commitment, removed = removed.len(), "Commitment removed");
                Ok(removed)
            }
            None => self.missing(commitment).map(|()| Vec::new()),
        }
    }

    /// Remove the record one committer holds for a commitment value.
    pub fn remove_by(
        &mut self,
        committer: &AccountId,
        commitment: &Commitment,
    ) -> RegistryResult<Option<CommitmentRecord>> {
        let seq = self
            .records_for(commitment)
            .find(|(_, r)| r.committer == *committer)
            .map(|(seq, _)| seq);
        let removed = match seq {
            Some(seq) => {
                let emptied = match self.index.get_mut(commitment) {
                    Some(seqs) => {
                        seqs.retain(|s| *s != seq);
                        seqs.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.index.remove(commitment);
                }
                self.log.remove(&seq)
            }
            None => None,
        };

        match removed {
            Some(record) => {
                self.retire(&record);
                info!(commitment = %commitment, committer = %committer, "Commitment removed");
                Ok(Some(record))
            }
            None => self.missing(commitment).map(|()| None),
        }
    }

    fn retire(&mut self, record: &CommitmentRecord) {
        if self.policy.retain_history {
            self.retired.insert(RetiredKey {
                commitment: record.commitment,
                committer: record.committer,
            });
        }
    }

    fn missing(&self, commitment: &Commitment) -> RegistryResult<()> {
        match self.policy.missing_removal {
            MissingRemoval::Error => Err(RegistryError::NotFound(*commitment)),
            MissingRemoval::Ignore => {
                debug!(commitment = %commitment, "Removal of absent commitment ignored");
                Ok(())
            }
        }
    }

    /// Records matching a filter, in acceptance order (and so timepoint order).
    pub fn query(&self, filter: &RecordFilter) -> Vec<&CommitmentRecord> {
        self.log.values().filter(|r| filter.matches(r)).collect()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: self.log.values().cloned().collect(),
            retired: self.retired.iter().cloned().collect(),
            clock: self.clock.state(),
        }
    }

    pub fn clock(&self) -> &OrderingClock {
        &self.clock
    }

    pub fn policy(&self) -> StorePolicy {
        self.policy
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
