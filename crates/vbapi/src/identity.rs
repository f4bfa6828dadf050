//! Client identity derived once from configuration.

use std::time::{SystemTime, UNIX_EPOCH};

use protocol::{md5_hex, HandshakeRequest, ProtocolError, Result};
use url::Url;

use crate::config::Config;

/// Files that hold a stable per-host machine identifier.
const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Immutable identity of this client for the lifetime of a session manager.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Scheme, host and port root used to scope cookies.
    pub base_url: String,
    /// Full RPC endpoint, normalized so that it always lies under `base_url`.
    pub api_url: String,
    /// Shared secret configured by the integrator.
    pub api_key: String,
    pub client_name: String,
    pub client_version: String,
    pub platform_name: String,
    pub platform_version: String,
    /// Fingerprint of client, platform, machine and start time.
    pub unique_id: String,
}

impl ClientIdentity {
    /// Derives the identity from configuration.
    pub fn derive(config: &Config) -> Result<Self> {
        Self::derive_with_machine_id(config, &machine_id())
    }

    fn derive_with_machine_id(config: &Config, machine_id: &str) -> Result<Self> {
        let endpoint = parse_endpoint(&config.api.url)?;
        let base_url = root_of(&endpoint)?;
        let started_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let unique_id = md5_hex(&format!(
            "{}{}{}{}{}{}",
            config.client.name,
            config.client.version,
            config.platform.name,
            config.platform.version,
            machine_id,
            started_ms
        ));

        Ok(Self {
            base_url,
            api_url: endpoint.to_string(),
            api_key: config.api.key.clone(),
            client_name: config.client.name.clone(),
            client_version: config.client.version.clone(),
            platform_name: config.platform.name.clone(),
            platform_version: config.platform.version.clone(),
            unique_id,
        })
    }

    /// Identity fields sent with the handshake.
    pub fn handshake_request(&self) -> HandshakeRequest {
        HandshakeRequest {
            client_name: self.client_name.clone(),
            client_version: self.client_version.clone(),
            platform_name: self.platform_name.clone(),
            platform_version: self.platform_version.clone(),
            unique_id: self.unique_id.clone(),
        }
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("base_url", &self.base_url)
            .field("api_url", &self.api_url)
            .field("client_name", &self.client_name)
            .field("client_version", &self.client_version)
            .field("unique_id", &self.unique_id)
            .finish_non_exhaustive()
    }
}

/// Returns the `scheme://host[:port]/` root of an endpoint URL.
pub fn base_url(api_url: &str) -> Result<String> {
    root_of(&parse_endpoint(api_url)?)
}

fn parse_endpoint(api_url: &str) -> Result<Url> {
    Url::parse(api_url)
        .map_err(|e| ProtocolError::Configuration(format!("invalid api url {}: {}", api_url, e)))
}

fn root_of(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| ProtocolError::Configuration(format!("api url has no host: {}", url)))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    })
}

/// Best-effort stable identifier of the host machine.
///
/// Falls back to the host name, then to an empty string; the unique id
/// also mixes in the start time so an empty value is still usable.
pub fn machine_id() -> String {
    MACHINE_ID_PATHS
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|contents| contents.trim().to_string())
        .find(|id| !id.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_default()
}
