#![warn(missing_docs)]

//! Core types for the Warren channel server
//!
//! This crate provides the fundamental types used throughout the server:
//! - `Jid`: a three-part address naming a user session, a bare user, or a server
//! - `PresenceKind`: the semantic value carried by a presence update
//! - `PresenceStanza`: the outbound presence message shape

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing a wire-format address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JidParseError {
    /// The input string was empty.
    #[error("address is empty")]
    Empty,
    /// An `@` was present but nothing preceded it.
    #[error("address `{0}` has an empty node before `@`")]
    EmptyNode(String),
    /// The domain part was missing or empty.
    #[error("address `{0}` has an empty domain")]
    EmptyDomain(String),
    /// A `/` was present but nothing followed it.
    #[error("address `{0}` has an empty resource after `/`")]
    EmptyResource(String),
}

/// A three-part address: `node@domain/resource`.
///
/// The node and resource parts are optional. An address without a resource is
/// "bare" and names a user (or, with no node either, a peer server) as a
/// whole; the resource distinguishes one simultaneous connection of the same
/// user.
///
/// Equality and hashing are structural over all three parts, so an address
/// parsed from the wire and one built field-by-field with identical contents
/// are interchangeable as map keys and in comparisons. Case normalization is
/// the stanza layer's concern and is not applied here.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jid {
    node: Option<String>,
    domain: String,
    resource: Option<String>,
}

impl Jid {
    /// Create a bare user address `node@domain`.
    pub fn bare(node: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            node: Some(node.into()),
            domain: domain.into(),
            resource: None,
        }
    }

    /// Create a server address `domain` (no node, no resource).
    pub fn server(domain: impl Into<String>) -> Self {
        Self {
            node: None,
            domain: domain.into(),
            resource: None,
        }
    }

    /// Create a full user address `node@domain/resource`.
    pub fn full(
        node: impl Into<String>,
        domain: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            node: Some(node.into()),
            domain: domain.into(),
            resource: Some(resource.into()),
        }
    }

    /// Parse a wire-format address.
    ///
    /// Accepted shapes: `node@domain/resource`, `node@domain`,
    /// `domain/resource`, `domain`.
    pub fn parse(s: &str) -> Result<Self, JidParseError> {
        if s.is_empty() {
            return Err(JidParseError::Empty);
        }

        let (head, resource) = match s.split_once('/') {
            Some((head, resource)) => {
                if resource.is_empty() {
                    return Err(JidParseError::EmptyResource(s.to_string()));
                }
                (head, Some(resource.to_string()))
            }
            None => (s, None),
        };

        let (node, domain) = match head.split_once('@') {
            Some((node, domain)) => {
                if node.is_empty() {
                    return Err(JidParseError::EmptyNode(s.to_string()));
                }
                (Some(node.to_string()), domain)
            }
            None => (None, head),
        };

        if domain.is_empty() {
            return Err(JidParseError::EmptyDomain(s.to_string()));
        }

        Ok(Self {
            node,
            domain: domain.to_string(),
            resource,
        })
    }

    /// The node (local) part, if any.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// The domain part.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The resource part, if any.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Whether this address carries a resource.
    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Whether this address names a peer server rather than a user
    /// (no node and no resource).
    pub fn is_bare_server(&self) -> bool {
        self.node.is_none() && self.resource.is_none()
    }

    /// The bare form of this address (resource dropped).
    pub fn to_bare(&self) -> Jid {
        Jid {
            node: self.node.clone(),
            domain: self.domain.clone(),
            resource: None,
        }
    }

    /// This address re-qualified with the given resource.
    pub fn with_resource(&self, resource: impl Into<String>) -> Jid {
        Jid {
            node: self.node.clone(),
            domain: self.domain.clone(),
            resource: Some(resource.into()),
        }
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(node) = &self.node {
            write!(f, "{}@", node)?;
        }
        write!(f, "{}", self.domain)?;
        if let Some(resource) = &self.resource {
            write!(f, "/{}", resource)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Jid({})", self)
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jid::parse(s)
    }
}

/// The semantic value carried by a presence update.
///
/// `Unavailable` is the single sentinel this subsystem interprets: it signals
/// a resource going offline. Every other kind signals the resource being
/// online, with protocol-specific nuance preserved but not interpreted
/// further. Unknown wire tokens round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceKind {
    /// Ordinary available presence.
    Available,
    /// The resource is going offline.
    Unavailable,
    /// Request to subscribe to an entity's presence.
    Subscribe,
    /// A presence subscription has been granted.
    Subscribed,
    /// Request to cancel a presence subscription.
    Unsubscribe,
    /// A presence subscription has been cancelled.
    Unsubscribed,
    /// Probe for an entity's current presence.
    Probe,
    /// Any other wire token, carried through untouched.
    Other(String),
}

impl PresenceKind {
    /// Decode a wire token. The empty token means available presence.
    pub fn from_wire(token: &str) -> Self {
        match token {
            "" | "available" => Self::Available,
            "unavailable" => Self::Unavailable,
            "subscribe" => Self::Subscribe,
            "subscribed" => Self::Subscribed,
            "unsubscribe" => Self::Unsubscribe,
            "unsubscribed" => Self::Unsubscribed,
            "probe" => Self::Probe,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this kind signals the resource going offline.
    pub fn signals_offline(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for PresenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Subscribe => "subscribe",
            Self::Subscribed => "subscribed",
            Self::Unsubscribe => "unsubscribe",
            Self::Unsubscribed => "unsubscribed",
            Self::Probe => "probe",
            Self::Other(token) => token,
        };
        write!(f, "{}", token)
    }
}

/// An outbound presence message.
///
/// Serialization to the wire is the stanza codec's job; this type only fixes
/// the shape handed to the outbound delivery queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceStanza {
    /// Recipient address.
    pub to: Jid,
    /// Sender address; `None` lets the server stamp its own address.
    pub from: Option<Jid>,
    /// The presence kind carried.
    pub kind: PresenceKind,
}

impl PresenceStanza {
    /// A subscription-request stanza addressed to `to`.
    pub fn subscribe(to: Jid) -> Self {
        Self {
            to,
            from: None,
            kind: PresenceKind::Subscribe,
        }
    }
}
