use std::sync::Arc;

use commit_registry_types::{
    AccountId, CommitEvent, Commitment, CommitmentRecord, ExtraData, InterfaceId,
    RegistryInterface, Timepoint,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::auth::{AuthorizationGate, AuthorizationProof, AuthorizationRequest};
use crate::clock::OrderingClock;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::events::{EventEmitter, EventFilter, EventRouter, SubscriptionId};
use crate::store::{CommitmentStore, RecordFilter, StorePolicy, StoreSnapshot};

/// Host-supplied facts about the current call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Account that submitted the call
    pub caller: AccountId,
    /// Coarse host time (e.g. a block height or macro-clock tick)
    pub time_hint: u64,
}

impl CallContext {
    pub fn new(caller: AccountId, time_hint: u64) -> Self {
        Self { caller, time_hint }
    }

    /// Context using the current UNIX second as the time hint.
    pub fn wall_clock(caller: AccountId) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            caller,
            time_hint: u64::try_from(now).unwrap_or(0),
        }
    }
}

/// Complete persisted registry state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub store: StoreSnapshot,
}

/// The commitment registry facade.
///
/// Composes the authorization gate, the store (with its ordering clock) and the
/// attached emitters. Every call runs to completion: either a record is stored
/// and published, or nothing changes.
///
/// The registry owns an [`EventRouter`] sized by `subscriber_capacity`; it is
/// always the first emitter, so [`CommitmentRegistry::subscribe`] works without
/// any wiring.
pub struct CommitmentRegistry {
    store: CommitmentStore,
    gate: AuthorizationGate,
    router: Arc<EventRouter>,
    emitters: Vec<Arc<dyn EventEmitter>>,
    config: RegistryConfig,
}

impl CommitmentRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        let clock = OrderingClock::with_max_regression(config.ordering, config.max_regression_ticks);
        let store = CommitmentStore::new(store_policy(&config), clock);
        Self::assemble(store, config)
    }

    /// Resume a registry from persisted state.
    pub fn restore(config: RegistryConfig, snapshot: RegistrySnapshot) -> RegistryResult<Self> {
        let store = CommitmentStore::restore(
            store_policy(&config),
            config.ordering,
            config.max_regression_ticks,
            snapshot.store,
        )?;
        info!(records = store.len(), "Registry restored from snapshot");
        Ok(Self::assemble(store, config))
    }

    fn assemble(store: CommitmentStore, config: RegistryConfig) -> Self {
        let router = Arc::new(EventRouter::new(config.subscriber_capacity));
        Self {
            store,
            gate: AuthorizationGate::new(),
            emitters: vec![router.clone() as Arc<dyn EventEmitter>],
            router,
            config,
        }
    }

    /// Subscribe to accepted-commitment events matching `filter`.
    ///
    /// Each subscriber buffers up to `subscriber_capacity` events; further
    /// events are dropped for that subscriber until it drains.
    pub fn subscribe(&self, filter: EventFilter) -> (SubscriptionId, mpsc::Receiver<CommitEvent>) {
        self.router.subscribe(filter)
    }

    pub fn unsubscribe(&self, id: &SubscriptionId) {
        self.router.unsubscribe(id);
    }

    /// The registry's own event router.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Attach an emitter. Each emitter sees every accepted commitment once.
    pub fn add_emitter(&mut self, emitter: Arc<dyn EventEmitter>) {
        self.emitters.push(emitter);
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Mutable gate access, for registering programmatic accounts.
    pub fn gate_mut(&mut self) -> &mut AuthorizationGate {
        &mut self.gate
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Minimal interface: commit on the caller's own behalf with no extra data.
    pub fn commit(&mut self, ctx: &CallContext, commitment: Commitment) -> RegistryResult<Timepoint> {
        self.require(RegistryInterface::Minimal)?;
        self.accept(ctx, ctx.caller, commitment, ExtraData::empty(), None)
    }

    /// General interface: commit on behalf of `from`, with extra data.
    ///
    /// When `from` differs from the caller, `proof` must satisfy the gate.
    pub fn commit_from(
        &mut self,
        ctx: &CallContext,
        from: AccountId,
        commitment: Commitment,
        extra_data: ExtraData,
        proof: Option<&AuthorizationProof>,
    ) -> RegistryResult<Timepoint> {
        self.require(RegistryInterface::General)?;
        self.accept(ctx, from, commitment, extra_data, proof)
    }

    fn require(&self, interface: RegistryInterface) -> RegistryResult<()> {
        if self.is_enabled(interface) {
            Ok(())
        } else {
            Err(RegistryError::InterfaceDisabled(interface))
        }
    }

    fn accept(
        &mut self,
        ctx: &CallContext,
        from: AccountId,
        commitment: Commitment,
        extra_data: ExtraData,
        proof: Option<&AuthorizationProof>,
    ) -> RegistryResult<Timepoint> {
        if extra_data.len() > self.config.max_extra_data_len {
            return Err(RegistryError::InvalidExtraData(format!(
                "{} bytes exceeds limit of {}",
                extra_data.len(),
                self.config.max_extra_data_len
            )));
        }

        let request = AuthorizationRequest {
            caller: &ctx.caller,
            committer: &from,
            commitment: &commitment,
            extra_data: &extra_data,
        };
        self.gate.authorize(&request, proof)?;

        let record = self
            .store
            .record(commitment, from, extra_data, ctx.time_hint)?;
        let event = CommitEvent::from(record);

        info!(
            commitment = %event.commitment,
            from = %event.from,
            caller = %ctx.caller,
            timepoint = %event.timepoint,
            "Commitment accepted"
        );

        for emitter in &self.emitters {
            emitter.publish(&event);
        }
        debug!(emitters = self.emitters.len(), "Commit event published");

        Ok(event.timepoint)
    }

    /// Earliest live record for a commitment value.
    pub fn lookup(&self, commitment: &Commitment) -> Option<&CommitmentRecord> {
        self.store.lookup(commitment)
    }

    pub fn lookup_by(
        &self,
        committer: &AccountId,
        commitment: &Commitment,
    ) -> Option<&CommitmentRecord> {
        self.store.lookup_by(committer, commitment)
    }

    pub fn query(&self, filter: &RecordFilter) -> Vec<&CommitmentRecord> {
        self.store.query(filter)
    }

    /// Delete every record for a commitment, typically right after a reveal
    /// consumed it.
    pub fn remove(&mut self, commitment: &Commitment) -> RegistryResult<Vec<CommitmentRecord>> {
        self.store.remove(commitment)
    }

    pub fn remove_by(
        &mut self,
        committer: &AccountId,
        commitment: &Commitment,
    ) -> RegistryResult<Option<CommitmentRecord>> {
        self.store.remove_by(committer, commitment)
    }

    /// Interface introspection.
    pub fn supports_interface(&self, id: &InterfaceId) -> bool {
        RegistryInterface::from_id(id).is_some_and(|i| self.is_enabled(i))
    }

    pub fn is_enabled(&self, interface: RegistryInterface) -> bool {
        match interface {
            RegistryInterface::Introspection => true,
            RegistryInterface::Minimal => self.config.interfaces.minimal,
            RegistryInterface::General => self.config.interfaces.general,
        }
    }

    pub fn last_timepoint(&self) -> Option<Timepoint> {
        self.store.clock().last()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            store: self.store.snapshot(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn store_policy(config: &RegistryConfig) -> StorePolicy {
    StorePolicy {
        duplicates: config.duplicate_policy,
        retain_history: config.retain_history,
        missing_removal: config.missing_removal,
    }
}
