//! Client configuration and the store it selects.

use std::path::PathBuf;
use std::time::Duration;

use lobbyist_auth::{
    CredentialKey, CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError,
};
use lobbyist_protocol::VersionDigest;
use lobbyist_sync::ObserverConfig;
use lobbyist_transport::HttpConfig;
use serde::{Deserialize, Serialize};

use crate::LobbyError;

/// Everything needed to connect to a lobby service.
///
/// `Default` targets a service on the local machine with the platform's
/// stock client identity. [`ClientConfig::from_env`] overrides individual
/// fields from `LOBBYIST_*` environment variables:
///
/// | Variable | Field |
/// |---|---|
/// | `LOBBYIST_BASE_URL` | `base_url` |
/// | `LOBBYIST_CLIENT_ID` | `client_id` |
/// | `LOBBYIST_CLIENT_SECRET` | `client_secret` |
/// | `LOBBYIST_CREDENTIALS` | `credentials_path` |
/// | `LOBBYIST_CONNECT_TIMEOUT_SECS` | `connect_timeout` |
/// | `LOBBYIST_RETRY_DELAY_MS` | `observer.retry_delay` |
/// | `LOBBYIST_RETRY_JITTER_MS` | `observer.retry_jitter` |
/// | `LOBBYIST_VERSION_DIGEST` | `version_digest` (`md5` or `sha256`) |
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,

    /// Where to persist credentials. `None` keeps them in memory for the
    /// lifetime of the process.
    pub credentials_path: Option<PathBuf>,

    pub connect_timeout: Duration,

    /// Digest the service fingerprints the sessions resource with.
    pub version_digest: VersionDigest,
    pub observer: ObserverConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            base_url: http.base_url,
            client_id: http.client_id,
            client_secret: http.client_secret,
            credentials_path: None,
            connect_timeout: http.connect_timeout,
            version_digest: http.version_digest,
            observer: ObserverConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    /// Returns [`LobbyError::Config`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, LobbyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `LOBBYIST_*` key. Empty values are ignored.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LobbyError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| -> Result<Option<u64>, LobbyError> {
            get(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map_err(|e| LobbyError::Config(format!("{key}={v}: {e}")))
                })
                .transpose()
        };

        let mut config = Self::default();
        if let Some(v) = get("LOBBYIST_BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = get("LOBBYIST_CLIENT_ID") {
            config.client_id = v;
        }
        if let Some(v) = get("LOBBYIST_CLIENT_SECRET") {
            config.client_secret = v;
        }
        if let Some(v) = get("LOBBYIST_CREDENTIALS") {
            config.credentials_path = Some(PathBuf::from(v));
        }
        if let Some(secs) = number("LOBBYIST_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = number("LOBBYIST_RETRY_DELAY_MS")? {
            config.observer.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = number("LOBBYIST_RETRY_JITTER_MS")? {
            config.observer.retry_jitter = Duration::from_millis(ms);
        }
        if let Some(v) = get("LOBBYIST_VERSION_DIGEST") {
            config.version_digest = v
                .parse()
                .map_err(|e| LobbyError::Config(format!("LOBBYIST_VERSION_DIGEST={v}: {e}")))?;
        }
        Ok(config)
    }

    /// The transport settings in this config.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            connect_timeout: self.connect_timeout,
            version_digest: self.version_digest,
        }
    }

    /// Opens the credential store this config asks for.
    pub fn open_store(&self) -> Result<ConfiguredStore, StoreError> {
        match &self.credentials_path {
            Some(path) => Ok(ConfiguredStore::File(FileCredentialStore::open(path)?)),
            None => Ok(ConfiguredStore::Memory(MemoryCredentialStore::new())),
        }
    }
}

/// The credential store selected by [`ClientConfig::open_store`].
#[derive(Debug)]
pub enum ConfiguredStore {
    Memory(MemoryCredentialStore),
    File(FileCredentialStore),
}

impl CredentialStore for ConfiguredStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        match self {
            Self::Memory(s) => s.get(key),
            Self::File(s) => s.get(key),
        }
    }

    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.set(key, value),
            Self::File(s) => s.set(key, value),
        }
    }

    fn clear(&mut self, key: CredentialKey) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.clear(key),
            Self::File(s) => s.clear(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_points_at_local_service() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:4242");
        assert_eq!(config.client_id, "bgp-client-name");
        assert!(config.credentials_path.is_none());
        assert_eq!(config.version_digest, VersionDigest::Md5);
    }

    #[test]
    fn test_from_lookup_overrides_fields() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("LOBBYIST_BASE_URL", "http://lobby:4242"),
            ("LOBBYIST_CREDENTIALS", "/tmp/creds.json"),
            ("LOBBYIST_CONNECT_TIMEOUT_SECS", "9"),
            ("LOBBYIST_RETRY_DELAY_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://lobby:4242");
        assert_eq!(config.credentials_path, Some(PathBuf::from("/tmp/creds.json")));
        assert_eq!(config.connect_timeout, Duration::from_secs(9));
        assert_eq!(config.observer.retry_delay, Duration::from_millis(250));
        assert_eq!(config.client_secret, "bgp-client-pw");
    }

    #[test]
    fn test_from_lookup_empty_value_is_ignored() {
        let config =
            ClientConfig::from_lookup(lookup(&[("LOBBYIST_BASE_URL", "  ")])).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:4242");
    }

    #[test]
    fn test_from_lookup_bad_number_is_config_error() {
        let result =
            ClientConfig::from_lookup(lookup(&[("LOBBYIST_RETRY_DELAY_MS", "soon")]));
        assert!(matches!(result, Err(LobbyError::Config(msg)) if msg.contains("LOBBYIST_RETRY_DELAY_MS")));
    }

    #[test]
    fn test_from_lookup_version_digest() {
        let config =
            ClientConfig::from_lookup(lookup(&[("LOBBYIST_VERSION_DIGEST", "sha256")])).unwrap();
        assert_eq!(config.version_digest, VersionDigest::Sha256);

        let bad = ClientConfig::from_lookup(lookup(&[("LOBBYIST_VERSION_DIGEST", "crc")]));
        assert!(matches!(bad, Err(LobbyError::Config(msg)) if msg.contains("LOBBYIST_VERSION_DIGEST")));
    }

    #[test]
    fn test_http_config_copies_connection_fields() {
        let config = ClientConfig {
            base_url: "http://lobby".into(),
            version_digest: VersionDigest::Sha256,
            ..ClientConfig::default()
        };
        let http = config.http_config();
        assert_eq!(http.base_url, "http://lobby");
        assert_eq!(http.version_digest, VersionDigest::Sha256);
    }

    #[test]
    fn test_open_store_with_path_is_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            credentials_path: Some(dir.path().join("creds.json")),
            ..ClientConfig::default()
        };

        let mut store = config.open_store().unwrap();
        assert!(matches!(store, ConfiguredStore::File(_)));
        store.set(CredentialKey::UserName, "maex").unwrap();
        assert!(dir.path().join("creds.json").exists());
    }
}
