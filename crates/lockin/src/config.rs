use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::payload::{PayloadStyle, DEFAULT_FOOTER, DEFAULT_TITLE};

const DEFAULT_CONFIG_NAME: &str = "lockin.toml";
pub const DEFAULT_ENDPOINT: &str = "/.netlify/functions/send-discord";
pub const DEFAULT_ENV_KEY: &str = "DISCORD_WEBHOOK_URL";
const DEFAULT_DEBUG_KEY_FILTER: &str = "DISCORD";
const DEFAULT_STATUS_TTL_SECS: u64 = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub client: ClientConfig,
    /// Values exposed by the hosting platform's runtime accessor.
    #[serde(default)]
    pub platform_env: HashMap<String, String>,
    /// Values attached to every request as its context environment.
    #[serde(default)]
    pub context_env: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Path the relay handler is mounted at.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// Name of the variable holding the destination webhook URL.
    #[serde(default = "default_env_key")]
    pub env_key: String,
    /// Substring used to list visible key names when the URL is missing.
    #[serde(default = "default_debug_key_filter")]
    pub debug_key_filter: String,
    /// Largest request body the relay will read before giving up.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Full relay URL used by `lockin submit`.
    pub endpoint: Option<String>,
    #[serde(default = "default_status_ttl_secs")]
    pub status_ttl_secs: u64,
    /// Embed title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Embed footer text.
    #[serde(default = "default_footer")]
    pub footer: String,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8888))
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_env_key() -> String {
    DEFAULT_ENV_KEY.to_string()
}

fn default_debug_key_filter() -> String {
    DEFAULT_DEBUG_KEY_FILTER.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_status_ttl_secs() -> u64 {
    DEFAULT_STATUS_TTL_SECS
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_footer() -> String {
    DEFAULT_FOOTER.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            endpoint: default_endpoint(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            env_key: default_env_key(),
            debug_key_filter: default_debug_key_filter(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            status_ttl_secs: default_status_ttl_secs(),
            title: default_title(),
            footer: default_footer(),
        }
    }
}

impl ClientConfig {
    pub fn style(&self) -> PayloadStyle {
        PayloadStyle {
            title: self.title.clone(),
            footer: self.footer.clone(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or search upward from current dir,
    /// then the user config dir. Falls back to defaults when nothing is found.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => match find_upwards(DEFAULT_CONFIG_NAME).or_else(user_config_path) {
                Some(p) => p,
                None => {
                    tracing::debug!("no {DEFAULT_CONFIG_NAME} found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Relay URL for the client: explicit setting, or derived from the server section.
    /// A wildcard bind address is reached through loopback of the same family.
    pub fn client_endpoint(&self) -> String {
        self.client.endpoint.clone().unwrap_or_else(|| {
            let mut addr = self.server.bind;
            if addr.ip().is_unspecified() {
                addr.set_ip(match addr.ip() {
                    IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                    IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
                });
            }
            format!("http://{}{}", addr, self.server.endpoint)
        })
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.client.status_ttl_secs)
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn user_config_path() -> Option<PathBuf> {
    let candidate = dirs::config_dir()?.join("lockin").join(DEFAULT_CONFIG_NAME);
    candidate.exists().then_some(candidate)
}
