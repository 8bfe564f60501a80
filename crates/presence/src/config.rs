//! Presence subsystem configuration.
//!
//! Read once at construction from the server's string-valued settings table.
//! A config value can only be obtained through a validating constructor, so
//! a missing server domain is a construction-time failure rather than a bad
//! value propagating into later logic.

use std::collections::HashMap;
use thiserror::Error;

/// Settings key naming the server's own domain. Required.
pub const SERVER_DOMAIN: &str = "server.domain";

/// Settings key for the external-domain trust override. Defaults to `"false"`.
pub const TRUST_EXTERNAL_DOMAINS: &str = "trust.external.domains";

/// Settings key selecting durable presence state over the in-memory map.
/// Defaults to `"false"`.
pub const PERSIST_PRESENCE: &str = "presence.persist";

/// Errors raised while validating presence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The `server.domain` setting is absent or empty.
    #[error("required setting `server.domain` is missing")]
    MissingServerDomain,
    /// A boolean-valued setting holds something other than true/false.
    #[error("setting `{key}` expects \"true\" or \"false\", got `{value}`")]
    InvalidBool {
        /// The offending settings key.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Validated presence configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    server_domain: String,
    trust_external_domains: bool,
    persist_presence: bool,
}

impl PresenceConfig {
    /// Create a configuration for the given server domain, with both
    /// toggles off.
    pub fn new(server_domain: impl Into<String>) -> Result<Self, ConfigError> {
        let server_domain = server_domain.into();
        if server_domain.is_empty() {
            return Err(ConfigError::MissingServerDomain);
        }
        Ok(Self {
            server_domain,
            trust_external_domains: false,
            persist_presence: false,
        })
    }

    /// Build a configuration from the server's settings table.
    ///
    /// Absent boolean keys default to off; present ones must parse.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let server_domain = settings
            .get(SERVER_DOMAIN)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingServerDomain)?;

        Ok(Self {
            server_domain: server_domain.clone(),
            trust_external_domains: bool_setting(settings, TRUST_EXTERNAL_DOMAINS)?,
            persist_presence: bool_setting(settings, PERSIST_PRESENCE)?,
        })
    }

    /// Accept presence updates from any domain, not only our own.
    pub fn with_trust_external_domains(mut self, trust: bool) -> Self {
        self.trust_external_domains = trust;
        self
    }

    /// Delegate presence state to the durable store instead of memory.
    pub fn with_persist_presence(mut self, persist: bool) -> Self {
        self.persist_presence = persist;
        self
    }

    /// The server's own domain.
    pub fn server_domain(&self) -> &str {
        &self.server_domain
    }

    /// Whether presence updates from non-local domains are accepted.
    pub fn trust_external_domains(&self) -> bool {
        self.trust_external_domains
    }

    /// Whether presence state lives in the durable store.
    pub fn persist_presence(&self) -> bool {
        self.persist_presence
    }
}

fn bool_setting(settings: &HashMap<String, String>, key: &'static str) -> Result<bool, ConfigError> {
    match settings.get(key) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(ConfigError::InvalidBool {
            key,
            value: value.clone(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_server_domain_fails_construction() {
        assert_eq!(
            PresenceConfig::from_settings(&HashMap::new()).map(|_| ()),
            Err(ConfigError::MissingServerDomain)
        );
        assert_eq!(
            PresenceConfig::new("").map(|_| ()),
            Err(ConfigError::MissingServerDomain)
        );
    }

    #[test]
    fn test_empty_server_domain_setting_fails_construction() {
        let result = PresenceConfig::from_settings(&settings(&[(SERVER_DOMAIN, "")]));
        assert_eq!(result.map(|_| ()), Err(ConfigError::MissingServerDomain));
    }

    #[test]
    fn test_toggles_default_off() {
        let config = PresenceConfig::from_settings(&settings(&[(SERVER_DOMAIN, "server1.com")]))
            .expect("config should build");
        assert_eq!(config.server_domain(), "server1.com");
        assert!(!config.trust_external_domains());
        assert!(!config.persist_presence());
    }

    #[test]
    fn test_boolean_settings_parse() {
        let config = PresenceConfig::from_settings(&settings(&[
            (SERVER_DOMAIN, "server1.com"),
            (TRUST_EXTERNAL_DOMAINS, "true"),
            (PERSIST_PRESENCE, "TRUE"),
        ]))
        .expect("config should build");
        assert!(config.trust_external_domains());
        assert!(config.persist_presence());
    }

    #[test]
    fn test_invalid_boolean_setting_is_rejected() {
        let result = PresenceConfig::from_settings(&settings(&[
            (SERVER_DOMAIN, "server1.com"),
            (PERSIST_PRESENCE, "yes"),
        ]));
        assert_eq!(
            result.map(|_| ()),
            Err(ConfigError::InvalidBool {
                key: PERSIST_PRESENCE,
                value: "yes".to_string(),
            })
        );
    }

    #[test]
    fn test_builder_toggles() {
        let config = PresenceConfig::new("server1.com")
            .expect("config should build")
            .with_trust_external_domains(true)
            .with_persist_presence(true);
        assert!(config.trust_external_domains());
        assert!(config.persist_presence());
    }
}
