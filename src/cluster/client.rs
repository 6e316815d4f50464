//! Member admin API client
//!
//! Talks to the engine's v2 HTTP admin API. Endpoints are tried in order:
//! transport failures and 5xx responses fall through to the next endpoint,
//! anything else is the cluster's answer.

use crate::common::{Config, Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const MEMBERS_PATH: &str = "/v2/members";
const KEYS_PATH: &str = "/v2/keys/";

/// A cluster participant as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}

impl Member {
    /// Canonical peer address
    pub fn peer_url(&self) -> Option<&str> {
        self.peer_urls.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct MemberList {
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Debug, Serialize)]
struct MemberAddRequest<'a> {
    #[serde(rename = "peerURLs")]
    peer_urls: Vec<&'a str>,
}

/// Operations the bootstrap needs from the cluster.
#[async_trait]
pub trait MemberApi: Send + Sync {
    /// Current membership snapshot
    async fn member_list(&self) -> Result<Vec<Member>>;

    /// Register a new member by its advertised peer URL
    async fn member_add(&self, peer_url: &str) -> Result<Member>;

    /// Minimal side-effect-free read, used as a liveness probe
    async fn keys(&self) -> Result<()>;
}

/// PEM material for mutual TLS against the admin API.
#[derive(Debug, Clone)]
pub struct ClientTls {
    pub ca_cert: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

impl ClientTls {
    /// TLS material from config, present only when client ssl is required.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        if !config.engine.client_require_ssl {
            return Ok(None);
        }
        let tls = &config.engine.tls;
        let missing =
            |key: &str| Error::InvalidConfig(format!("{} is required when ssl is enabled", key));
        Ok(Some(Self {
            ca_cert: tls
                .ca_cert
                .clone()
                .ok_or_else(|| missing("engine.tls.ca_cert"))?,
            client_cert: tls
                .client_cert
                .clone()
                .ok_or_else(|| missing("engine.tls.client_cert"))?,
            client_key: tls
                .client_key
                .clone()
                .ok_or_else(|| missing("engine.tls.client_key"))?,
        }))
    }
}

/// HTTP-backed member API client.
#[derive(Debug, Clone)]
pub struct HttpMemberClient {
    client: Client,
    endpoints: Vec<Url>,
}

impl HttpMemberClient {
    pub fn new(endpoints: Vec<String>, timeout: Duration, tls: Option<ClientTls>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        let endpoints = endpoints
            .iter()
            .map(|e| {
                Url::parse(e)
                    .map_err(|err| Error::InvalidConfig(format!("bad endpoint {}: {}", e, err)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut builder = Client::builder().timeout(timeout).use_rustls_tls();
        if let Some(tls) = tls {
            let ca = std::fs::read(&tls.ca_cert)?;
            let ca = reqwest::Certificate::from_pem(&ca).map_err(|e| Error::Tls(e.to_string()))?;
            let mut pem = std::fs::read(&tls.client_cert)?;
            pem.extend(std::fs::read(&tls.client_key)?);
            let identity =
                reqwest::Identity::from_pem(&pem).map_err(|e| Error::Tls(e.to_string()))?;
            builder = builder.add_root_certificate(ca).identity(identity);
        }
        let client = builder.build().map_err(|e| Error::Tls(e.to_string()))?;

        Ok(Self { client, endpoints })
    }

    /// Client for the cluster's member API.
    pub fn for_cluster(config: &Config) -> Result<Self> {
        Self::new(
            config.cluster_endpoints(),
            config.request_timeout(),
            ClientTls::from_config(config)?,
        )
    }

    /// Client bound to this node's own client URL, for the sync probe.
    pub fn for_local_node(config: &Config) -> Result<Self> {
        Self::new(
            vec![config.identity().advertise_client_url],
            config.request_timeout(),
            ClientTls::from_config(config)?,
        )
    }

    /// Send to each endpoint in turn until one gives a non-5xx answer.
    async fn dispatch<F>(&self, path: &str, build: F) -> Result<(Url, Response)>
    where
        F: Fn(&Client, Url) -> RequestBuilder,
    {
        let mut last_err = Error::NoEndpoints;
        for endpoint in &self.endpoints {
            let url = endpoint
                .join(path)
                .map_err(|e| Error::InvalidConfig(format!("bad endpoint {}: {}", endpoint, e)))?;
            match build(&self.client, url).send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    last_err = Error::unavailable(endpoint.as_str(), resp.status());
                }
                Ok(resp) => return Ok((endpoint.clone(), resp)),
                Err(e) => {
                    last_err = Error::unavailable(endpoint.as_str(), e);
                }
            }
            tracing::debug!(
                action = "client.endpoint.failed",
                endpoint = %endpoint,
                error = %last_err
            );
        }
        Err(last_err)
    }
}

async fn body_text(resp: Response) -> String {
    resp.text()
        .await
        .unwrap_or_else(|err| format!("response body error: {err}"))
}

#[async_trait]
impl MemberApi for HttpMemberClient {
    async fn member_list(&self) -> Result<Vec<Member>> {
        let (endpoint, resp) = self.dispatch(MEMBERS_PATH, |c, url| c.get(url)).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = body_text(resp).await;
            return Err(Error::unavailable(
                endpoint.as_str(),
                format!("{}: {}", status, body),
            ));
        }
        let list: MemberList = resp
            .json()
            .await
            .map_err(|e| Error::unavailable(endpoint.as_str(), e))?;
        Ok(list.members)
    }

    async fn member_add(&self, peer_url: &str) -> Result<Member> {
        let body = MemberAddRequest {
            peer_urls: vec![peer_url],
        };
        let (endpoint, resp) = self
            .dispatch(MEMBERS_PATH, |c, url| c.post(url).json(&body))
            .await?;
        let status = resp.status();
        if status.is_client_error() {
            return Err(Error::MemberRejected {
                status: status.as_u16(),
                reason: body_text(resp).await,
            });
        }
        if !status.is_success() {
            return Err(Error::unavailable(endpoint.as_str(), status));
        }
        resp.json::<Member>()
            .await
            .map_err(|e| Error::unavailable(endpoint.as_str(), e))
    }

    async fn keys(&self) -> Result<()> {
        let (endpoint, resp) = self.dispatch(KEYS_PATH, |c, url| c.get(url)).await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::unavailable(endpoint.as_str(), status))
        }
    }
}
