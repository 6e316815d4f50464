//! Configuration for kvfab
//!
//! Loaded from a JSON or TOML file (format inferred from the extension),
//! with `KVFAB__SECTION__KEY` environment overrides layered on top.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port the engine serves client traffic on
pub const CLIENT_PORT: u16 = 4001;

/// Port the engine serves peer (replication/consensus) traffic on
pub const PEER_PORT: u16 = 7001;

const ENV_PREFIX: &str = "KVFAB";

/// Keys whose environment overrides are comma-separated lists
const LIST_KEYS: [&str; 1] = ["engine.machines"];

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity of this node within the deployment
    pub node: NodeConfig,

    /// Storage engine settings
    pub engine: EngineConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Logical node name (e.g. `kv_z1`)
    pub name: String,

    /// Index of this node within its group
    pub index: u32,

    /// IP other members and clients reach this node on
    #[serde(default)]
    pub external_ip: String,
}

/// Storage engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable
    pub program: PathBuf,

    /// Engine data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where the engine's PID is recorded once started
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    #[serde(default = "default_election_timeout")]
    pub election_timeout_ms: u64,

    #[serde(default)]
    pub peer_require_ssl: bool,

    #[serde(default)]
    pub client_require_ssl: bool,

    /// DNS suffix used to build `https` advertise URLs
    #[serde(default)]
    pub advertise_urls_dns_suffix: String,

    /// IPs of the deployment's nodes, used to reach the member API
    #[serde(default)]
    pub machines: Vec<String>,

    /// Enable engine debug logging
    #[serde(default)]
    pub debug: bool,

    /// Per-request timeout for the member API
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub tls: TlsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./kvfab-data")
}
fn default_pid_file() -> PathBuf {
    PathBuf::from("./kvfab.pid")
}
fn default_heartbeat_interval() -> u64 {
    50
}
fn default_election_timeout() -> u64 {
    1000
}
fn default_request_timeout() -> u64 {
    5000
}

/// PEM file locations. Client-side material is used both by the member API
/// client and by the engine's client listener; peer material only by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub server_cert: Option<PathBuf>,
    pub server_key: Option<PathBuf>,
    pub peer_ca_cert: Option<PathBuf>,
    pub peer_cert: Option<PathBuf>,
    pub peer_key: Option<PathBuf>,
}

/// Derived, immutable identity of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// `<kebab-case-name>-<index>`
    pub name: String,
    pub advertise_peer_url: String,
    pub advertise_client_url: String,
    pub listen_peer_url: String,
    pub listen_client_url: String,
}

impl Config {
    /// Load configuration from `path`, then apply environment overrides.
    ///
    /// List-valued keys take comma-separated values from the environment,
    /// e.g. `KVFAB__ENGINE__MACHINES=10.0.0.5,10.0.0.6`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::read(path)
            .inspect(|_| tracing::debug!(action = "config.loaded", path = %path.display()))
            .inspect_err(|e| {
                tracing::error!(action = "config.load.failed", path = %path.display(), error = %e)
            })
    }

    fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let mut env = ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let config: Config = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Check invariants the bootstrap relies on.
    pub fn validate(&self) -> Result<()> {
        if self.node.name.trim().is_empty() {
            return Err(Error::InvalidConfig("node.name cannot be empty".into()));
        }
        if self.engine.program.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("engine.program cannot be empty".into()));
        }

        let engine = &self.engine;
        if (engine.peer_require_ssl || engine.client_require_ssl)
            && engine.advertise_urls_dns_suffix.trim().is_empty()
        {
            return Err(Error::InvalidConfig(
                "engine.advertise_urls_dns_suffix is required when ssl is enabled".into(),
            ));
        }
        if (!engine.peer_require_ssl || !engine.client_require_ssl)
            && self.node.external_ip.trim().is_empty()
        {
            return Err(Error::InvalidConfig(
                "node.external_ip is required for plain http advertise urls".into(),
            ));
        }

        let tls = &engine.tls;
        if engine.client_require_ssl {
            require_file("engine.tls.ca_cert", &tls.ca_cert)?;
            require_file("engine.tls.client_cert", &tls.client_cert)?;
            require_file("engine.tls.client_key", &tls.client_key)?;
            require_file("engine.tls.server_cert", &tls.server_cert)?;
            require_file("engine.tls.server_key", &tls.server_key)?;
        }
        if engine.peer_require_ssl {
            require_file("engine.tls.peer_ca_cert", &tls.peer_ca_cert)?;
            require_file("engine.tls.peer_cert", &tls.peer_cert)?;
            require_file("engine.tls.peer_key", &tls.peer_key)?;
        }

        Ok(())
    }

    /// Derive this node's name and URLs.
    pub fn identity(&self) -> NodeIdentity {
        let name = node_name(&self.node.name, self.node.index);
        let engine = &self.engine;

        let advertise_peer_url = advertise_url(
            engine.peer_require_ssl,
            &name,
            &engine.advertise_urls_dns_suffix,
            &self.node.external_ip,
            PEER_PORT,
        );
        let advertise_client_url = advertise_url(
            engine.client_require_ssl,
            &name,
            &engine.advertise_urls_dns_suffix,
            &self.node.external_ip,
            CLIENT_PORT,
        );

        NodeIdentity {
            listen_peer_url: listen_url(engine.peer_require_ssl, PEER_PORT),
            listen_client_url: listen_url(engine.client_require_ssl, CLIENT_PORT),
            name,
            advertise_peer_url,
            advertise_client_url,
        }
    }

    /// Endpoints of the cluster's member API.
    pub fn cluster_endpoints(&self) -> Vec<String> {
        let engine = &self.engine;
        if engine.client_require_ssl {
            return vec![format!(
                "https://{}:{}",
                engine.advertise_urls_dns_suffix, CLIENT_PORT
            )];
        }
        if engine.machines.is_empty() {
            return vec![self.identity().advertise_client_url];
        }
        engine
            .machines
            .iter()
            .map(|machine| format!("http://{}:{}", machine, CLIENT_PORT))
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.request_timeout_ms)
    }
}

fn require_file(key: &str, value: &Option<PathBuf>) -> Result<()> {
    match value {
        Some(path) if !path.as_os_str().is_empty() => Ok(()),
        _ => Err(Error::InvalidConfig(format!(
            "{} is required when ssl is enabled",
            key
        ))),
    }
}

/// `kv_z1`, 3 -> `kv-z1-3`
pub fn node_name(name: &str, index: u32) -> String {
    format!("{}-{}", kebab_case(name), index)
}

fn kebab_case(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// `https://<name>.<suffix>:<port>` when secure, else `http://<ip>:<port>`.
pub fn advertise_url(
    require_ssl: bool,
    name: &str,
    dns_suffix: &str,
    external_ip: &str,
    port: u16,
) -> String {
    if require_ssl {
        format!("https://{}.{}:{}", name, dns_suffix, port)
    } else {
        format!("http://{}:{}", external_ip, port)
    }
}

fn listen_url(require_ssl: bool, port: u16) -> String {
    let scheme = if require_ssl { "https" } else { "http" };
    format!("{}://0.0.0.0:{}", scheme, port)
}
