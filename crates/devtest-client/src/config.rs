//! DevTest Registry connection settings.

use serde::{Deserialize, Serialize};

use crate::error::DevTestError;
use crate::Result;

/// Default Registry REST port.
pub const DEFAULT_PORT: u16 = 1505;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Registry connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry host name
    pub host: String,
    /// Registry REST port
    pub port: u16,
    /// Use https instead of http
    pub secured: bool,
    /// Basic-auth user (no auth when unset)
    pub username: Option<String>,
    pub password: Option<String>,
    /// Accept any server certificate
    pub trust_any_certificate: bool,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            host: String::new(),
            port: DEFAULT_PORT,
            secured: false,
            username: None,
            password: None,
            trust_any_certificate: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RegistryConfig {
    /// Create config for a specific registry
    pub fn new(host: &str, port: u16) -> Self {
        RegistryConfig {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    /// Create a new config from `DEVTEST_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        RegistryConfig {
            host: non_blank("DEVTEST_HOST").unwrap_or(defaults.host),
            port: non_blank("DEVTEST_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            secured: non_blank("DEVTEST_SECURED").is_some_and(|v| is_truthy(&v)),
            username: non_blank("DEVTEST_USERNAME"),
            password: lookup("DEVTEST_PASSWORD"),
            trust_any_certificate: non_blank("DEVTEST_TRUST_ANY_CERT")
                .is_some_and(|v| is_truthy(&v)),
            timeout_secs: non_blank("DEVTEST_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// Set basic-auth credentials
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn with_secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    pub fn with_trust_any_certificate(mut self, trust: bool) -> Self {
        self.trust_any_certificate = trust;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn protocol(&self) -> &'static str {
        if self.secured {
            "https"
        } else {
            "http"
        }
    }

    /// `{protocol}://{host}:{port}` without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol(), self.host.trim(), self.port)
    }

    /// Reject a config that cannot address a registry
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DevTestError::InvalidConfig("registry host is empty".into()));
        }
        if self.port == 0 {
            return Err(DevTestError::InvalidConfig("registry port is 0".into()));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.port, 1505);
        assert_eq!(config.protocol(), "http");
        assert!(config.username.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_values() {
        let config = RegistryConfig::from_lookup(lookup(&[
            ("DEVTEST_HOST", "registry.local"),
            ("DEVTEST_PORT", "1507"),
            ("DEVTEST_SECURED", "true"),
            ("DEVTEST_USERNAME", "admin"),
            ("DEVTEST_PASSWORD", "admin"),
            ("DEVTEST_TRUST_ANY_CERT", "1"),
            ("DEVTEST_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.host, "registry.local");
        assert_eq!(config.port, 1507);
        assert!(config.secured);
        assert!(config.trust_any_certificate);
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url(), "https://registry.local:1507");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_ignores_garbage() {
        let config = RegistryConfig::from_lookup(lookup(&[
            ("DEVTEST_HOST", "  "),
            ("DEVTEST_PORT", "not-a-port"),
            ("DEVTEST_SECURED", "nope"),
        ]));
        assert_eq!(config.host, "");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.secured);
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let err = RegistryConfig::new("h", 0).validate().unwrap_err();
        assert!(matches!(err, DevTestError::InvalidConfig(_)));
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::new("localhost", 1505)
            .with_credentials("u", "p")
            .with_secured(true)
            .with_trust_any_certificate(true)
            .with_timeout_secs(3);
        assert_eq!(config.password.as_deref(), Some("p"));
        assert_eq!(config.base_url(), "https://localhost:1505");
        assert_eq!(config.timeout_secs, 3);
    }
}
