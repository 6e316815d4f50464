//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use kvfab::cluster::Member;
use kvfab::common::{EngineConfig, NodeConfig, Sleeper, TlsConfig};
use kvfab::supervisor::Supervisor;
use kvfab::Config;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-process stand-in for the engine's v2 admin API.
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    members: Vec<Member>,
    list_status: Option<StatusCode>,
    add_status: Option<StatusCode>,
    keys_status: Option<StatusCode>,
    added: Vec<String>,
    next_id: u64,
}

impl MockCluster {
    pub fn with_members(members: Vec<Member>) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().members = members;
        mock
    }

    pub fn fail_list(&self, status: StatusCode) {
        self.state.lock().unwrap().list_status = Some(status);
    }

    pub fn fail_add(&self, status: StatusCode) {
        self.state.lock().unwrap().add_status = Some(status);
    }

    pub fn fail_keys(&self, status: StatusCode) {
        self.state.lock().unwrap().keys_status = Some(status);
    }

    pub fn added(&self) -> Vec<String> {
        self.state.lock().unwrap().added.clone()
    }

    pub fn members(&self) -> Vec<Member> {
        self.state.lock().unwrap().members.clone()
    }

    /// Serve on an ephemeral port, returning the base URL.
    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/v2/members", get(list_members).post(add_member))
            .route("/v2/keys/", get(keys))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn list_members(State(mock): State<MockCluster>) -> Response {
    let state = mock.state.lock().unwrap();
    if let Some(status) = state.list_status {
        return (status, "member list unavailable").into_response();
    }
    Json(json!({ "members": state.members })).into_response()
}

async fn add_member(State(mock): State<MockCluster>, Json(body): Json<Value>) -> Response {
    let mut state = mock.state.lock().unwrap();
    if let Some(status) = state.add_status {
        return (status, "member add rejected").into_response();
    }
    let peer_urls: Vec<String> = body["peerURLs"]
        .as_array()
        .map(|urls| {
            urls.iter()
                .filter_map(|u| u.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    state.next_id += 1;
    let member = Member {
        id: format!("{:x}", 0x1000 + state.next_id),
        name: String::new(),
        peer_urls: peer_urls.clone(),
        client_urls: vec![],
    };
    state.added.extend(peer_urls);
    state.members.push(member.clone());
    (StatusCode::CREATED, Json(member)).into_response()
}

async fn keys(State(mock): State<MockCluster>) -> Response {
    match mock.state.lock().unwrap().keys_status {
        Some(status) => (status, "not serving").into_response(),
        None => Json(json!({ "action": "get", "node": { "dir": true } })).into_response(),
    }
}

/// An address nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn member(name: &str, peer_url: &str) -> Member {
    Member {
        id: format!("id-{}", name),
        name: name.to_string(),
        peer_urls: vec![peer_url.to_string()],
        client_urls: vec![],
    }
}

/// Records requested delays instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    pub calls: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

/// Shared event log so tests can check ordering across collaborators.
pub type Events = Arc<Mutex<Vec<String>>>;

/// Supervisor that records the engine args instead of spawning.
pub struct FakeSupervisor {
    pub events: Events,
    pub started_with: Arc<Mutex<Option<Vec<String>>>>,
    pub fail: bool,
    started: bool,
}

impl FakeSupervisor {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            started_with: Arc::new(Mutex::new(None)),
            fail: false,
            started: false,
        }
    }
}

#[async_trait]
impl Supervisor for FakeSupervisor {
    async fn start(&mut self, args: Vec<String>) -> kvfab::Result<()> {
        self.events.lock().unwrap().push("supervisor.start".into());
        if self.fail {
            return Err(kvfab::Error::ProcessStart {
                program: "kvd".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        *self.started_with.lock().unwrap() = Some(args);
        self.started = true;
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        self.started.then_some(4242)
    }
}

pub fn test_config(name: &str, index: u32, external_ip: &str) -> Config {
    Config {
        node: NodeConfig {
            name: name.into(),
            index,
            external_ip: external_ip.into(),
        },
        engine: EngineConfig {
            program: PathBuf::from("/usr/local/bin/kvd"),
            data_dir: PathBuf::from("/var/store/kvd"),
            pid_file: PathBuf::from("/var/run/kvd.pid"),
            heartbeat_interval_ms: 50,
            election_timeout_ms: 1000,
            peer_require_ssl: false,
            client_require_ssl: false,
            advertise_urls_dns_suffix: String::new(),
            machines: vec![external_ip.into()],
            debug: false,
            request_timeout_ms: 2000,
            tls: TlsConfig::default(),
        },
        log_level: "info".into(),
    }
}
