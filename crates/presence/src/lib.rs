#![warn(missing_docs)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Online-resource tracking for the Warren channel server
//!
//! Implements:
//! - the registry of currently-online resources per bare address
//! - the domain trust gate applied to inbound presence updates
//! - re-assertion of durable node subscriptions at startup
//!
//! # Architecture
//!
//! Worker tasks call [`OnlineResources::update_status`] and
//! [`OnlineResources::resources_for`] concurrently, one caller per active
//! connection. Presence state lives in exactly one place, chosen at
//! construction: a sharded in-memory map, or the durable [`NodeStore`]. The
//! two are never consulted for the same operation.

mod config;
mod trust;

pub use config::{
    ConfigError, PresenceConfig, PERSIST_PRESENCE, SERVER_DOMAIN, TRUST_EXTERNAL_DOMAINS,
};
pub use trust::TrustPolicy;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use warren_store::{NodeStore, StoreError};
use warren_types::{Jid, PresenceKind, PresenceStanza};

/// Number of lock shards in the in-memory map.
///
/// Mutations for one bare address serialize on its shard; unrelated
/// addresses land on other shards and do not contend.
const SHARD_COUNT: usize = 16;

/// Result type alias for presence operations.
pub type PresenceResult<T> = Result<T, PresenceError>;

/// Errors surfaced by the presence registry.
///
/// In-memory operation never fails; every variant originates from the
/// durable store.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// A durable store call failed. No retry is attempted here; the caller
    /// decides whether to retry, degrade, or fail the enclosing request.
    #[error("durable presence operation failed: {0}")]
    Store(#[from] StoreError),
}

/// In-memory presence state: bare address -> online full addresses, in
/// insertion order, without duplicates.
struct ShardedPresenceMap {
    shards: Vec<RwLock<HashMap<Jid, Vec<Jid>>>>,
}

impl ShardedPresenceMap {
    fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
        }
    }

    fn shard(&self, bare: &Jid) -> &RwLock<HashMap<Jid, Vec<Jid>>> {
        let mut hasher = DefaultHasher::new();
        bare.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Insert a full address under its bare key. Returns false if it was
    /// already present.
    async fn set_online(&self, bare: Jid, full: Jid) -> bool {
        let mut shard = self.shard(&bare).write().await;
        let resources = shard.entry(bare).or_default();
        if resources.contains(&full) {
            return false;
        }
        resources.push(full);
        true
    }

    /// Remove a full address from its bare key. Returns false if it was not
    /// present.
    async fn set_offline(&self, bare: &Jid, full: &Jid) -> bool {
        let mut shard = self.shard(bare).write().await;
        let Some(resources) = shard.get_mut(bare) else {
            return false;
        };
        let before = resources.len();
        resources.retain(|candidate| candidate != full);
        let removed = resources.len() != before;
        if resources.is_empty() {
            shard.remove(bare);
        }
        removed
    }

    /// Snapshot of the online addresses for a bare key, in insertion order.
    /// The returned vector shares no storage with the map.
    async fn snapshot(&self, bare: &Jid) -> Vec<Jid> {
        let shard = self.shard(bare).read().await;
        shard.get(bare).cloned().unwrap_or_default()
    }
}

/// Where presence state lives. Selected once at construction; operations
/// match on the variant rather than re-reading a flag.
enum PresenceBacking {
    Memory(ShardedPresenceMap),
    Durable,
}

/// The registry of currently-online resources.
///
/// Holds the store handle in every mode: the re-subscription driver reads
/// listener state through it even when presence itself stays in memory.
pub struct OnlineResources {
    trust: TrustPolicy,
    store: Arc<dyn NodeStore>,
    backing: PresenceBacking,
}

impl OnlineResources {
    /// Build the registry from validated configuration and the durable
    /// store collaborator.
    pub fn new(config: &PresenceConfig, store: Arc<dyn NodeStore>) -> Self {
        let backing = if config.persist_presence() {
            PresenceBacking::Durable
        } else {
            PresenceBacking::Memory(ShardedPresenceMap::new())
        };
        Self {
            trust: TrustPolicy::from_config(config),
            store,
            backing,
        }
    }

    /// Apply an inbound presence update.
    ///
    /// `PresenceKind::Unavailable` takes the resource offline; every other
    /// kind marks it online. Updates without a resource, and updates from
    /// untrusted domains, are dropped without error. Re-adding a present
    /// resource and removing an absent one are no-ops.
    ///
    /// Only the durable path can fail; memory-mode updates always succeed.
    pub async fn update_status(&self, jid: &Jid, kind: &PresenceKind) -> PresenceResult<()> {
        if !jid.has_resource() {
            // Resource-less updates are meaningless here; the stanza layer
            // should not have forwarded one.
            debug!(%jid, "ignoring presence update without a resource");
            return Ok(());
        }
        if !self.trust.is_trusted(jid) {
            debug!(%jid, "dropping presence update from untrusted domain");
            return Ok(());
        }

        match (&self.backing, kind.signals_offline()) {
            (PresenceBacking::Memory(map), false) => {
                if map.set_online(jid.to_bare(), jid.clone()).await {
                    debug!(%jid, %kind, "resource came online");
                }
            }
            (PresenceBacking::Memory(map), true) => {
                if map.set_offline(&jid.to_bare(), jid).await {
                    debug!(%jid, "resource went offline");
                }
            }
            (PresenceBacking::Durable, false) => self.store.mark_online(jid).await?,
            (PresenceBacking::Durable, true) => self.store.mark_offline(jid).await?,
        }
        Ok(())
    }

    /// The addresses a stanza for `jid` should be routed to.
    ///
    /// A full address and a bare server address pass through as singletons:
    /// the caller already knows the target resource, or names a federation
    /// peer this layer treats as always reachable. A bare user address
    /// resolves to its online resources: a fresh, independently-mutable
    /// vector in insertion order, empty if none.
    pub async fn resources_for(&self, jid: &Jid) -> PresenceResult<Vec<Jid>> {
        if jid.has_resource() || jid.is_bare_server() {
            return Ok(vec![jid.clone()]);
        }
        match &self.backing {
            PresenceBacking::Memory(map) => Ok(map.snapshot(jid).await),
            PresenceBacking::Durable => Ok(self.store.online_resources(jid).await?),
        }
    }

    /// Re-assert recorded node subscriptions toward their listeners.
    ///
    /// Reads the durable listener set and appends one subscription-request
    /// stanza per listener to the outbound queue, in the order the store
    /// returned them. Delivery is the transport layer's job; this is a pure
    /// producer and never blocks on the queue.
    pub async fn resubscribe_node_listeners(
        &self,
        out: &mpsc::UnboundedSender<PresenceStanza>,
    ) -> PresenceResult<()> {
        let subscriptions = self.store.node_subscription_listeners().await?;
        for subscription in subscriptions {
            let listener = subscription.listener;
            if out.send(PresenceStanza::subscribe(listener.clone())).is_err() {
                // Receiver gone means the transport is shutting down.
                warn!(%listener, "outbound queue closed, stopping listener re-subscription");
                break;
            }
            debug!(%listener, "queued presence subscription request");
        }
        Ok(())
    }
}
