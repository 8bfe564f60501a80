#![warn(missing_docs)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Durable store contract for the Warren channel server
//!
//! The presence subsystem can delegate its online state to a persistence
//! backend instead of tracking it in memory. This crate fixes the abstract
//! contract that backend must satisfy; schema and transaction handling live
//! entirely behind it.

mod error;

pub use error::{StoreError, StoreResult};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use warren_types::Jid;

/// The state of a recorded node subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionState {
    /// The subscription handshake has completed.
    Subscribed,
    /// Awaiting approval.
    Pending,
    /// Subscribed but the node is not yet configured for the listener.
    Unconfigured,
    /// No subscription relationship.
    None,
}

impl SubscriptionState {
    /// Decode a wire token.
    ///
    /// Returns `None` for unknown tokens.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "subscribed" => Some(Self::Subscribed),
            "pending" => Some(Self::Pending),
            "unconfigured" => Some(Self::Unconfigured),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// The wire token for this state.
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Pending => "pending",
            Self::Unconfigured => "unconfigured",
            Self::None => "none",
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A durable record of an entity interested in presence-style notifications
/// for a publish-subscribe node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSubscription {
    /// The node the listener is subscribed to.
    pub node: String,
    /// The listener's address.
    pub listener: Jid,
    /// The recorded subscription state.
    pub state: SubscriptionState,
}

impl NodeSubscription {
    /// Create a subscription record.
    pub fn new(node: impl Into<String>, listener: Jid, state: SubscriptionState) -> Self {
        Self {
            node: node.into(),
            listener,
            state,
        }
    }
}

/// Abstract persistence backend for presence and subscription state.
///
/// The backend owns its own blocking and retry discipline; callers propagate
/// failures without retrying.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Record a resource-qualified address as online.
    async fn mark_online(&self, full: &Jid) -> StoreResult<()>;

    /// Record a resource-qualified address as offline.
    async fn mark_offline(&self, full: &Jid) -> StoreResult<()>;

    /// List the online resource-qualified addresses for a bare address.
    async fn online_resources(&self, bare: &Jid) -> StoreResult<Vec<Jid>>;

    /// List the entities recorded as subscribed to node presence
    /// notifications, in the `subscribed` state.
    async fn node_subscription_listeners(&self) -> StoreResult<Vec<NodeSubscription>>;
}
