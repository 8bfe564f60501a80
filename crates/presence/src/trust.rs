//! Domain trust policy for presence updates.

use crate::config::PresenceConfig;
use warren_types::Jid;

/// Decides whether a presence update from a given address may mutate
/// registry state.
///
/// The gate runs before any mutation; it never gates queries, since queries
/// concern resources the server already chose to track or pass through.
/// Connection-level authentication happened before we ever see the update;
/// this is domain-level policy on top.
#[derive(Debug, Clone)]
pub struct TrustPolicy {
    server_domain: String,
    trust_external_domains: bool,
}

impl TrustPolicy {
    /// Build the policy from validated configuration.
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            server_domain: config.server_domain().to_string(),
            trust_external_domains: config.trust_external_domains(),
        }
    }

    /// Whether an update from this address is accepted.
    pub fn is_trusted(&self, jid: &Jid) -> bool {
        self.trust_external_domains || jid.domain() == self.server_domain
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn policy(trust_external: bool) -> TrustPolicy {
        let config = PresenceConfig::new("server1.com")
            .expect("config should build")
            .with_trust_external_domains(trust_external);
        TrustPolicy::from_config(&config)
    }

    #[test]
    fn test_local_domain_is_trusted() {
        let policy = policy(false);
        assert!(policy.is_trusted(&Jid::full("user", "server1.com", "laptop")));
        assert!(policy.is_trusted(&Jid::server("server1.com")));
    }

    #[test]
    fn test_external_domain_is_not_trusted_by_default() {
        let policy = policy(false);
        assert!(!policy.is_trusted(&Jid::full("user", "server2.com", "remote")));
    }

    #[test]
    fn test_subdomain_is_a_different_domain() {
        let policy = policy(false);
        assert!(!policy.is_trusted(&Jid::bare("user", "channels.server1.com")));
    }

    #[test]
    fn test_override_trusts_every_domain() {
        let policy = policy(true);
        assert!(policy.is_trusted(&Jid::full("user", "server2.com", "remote")));
        assert!(policy.is_trusted(&Jid::full("user", "server1.com", "laptop")));
    }
}
