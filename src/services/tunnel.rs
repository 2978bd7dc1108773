// src/services/tunnel.rs

//! Public tunnel provisioning through the ngrok agent.
//!
//! The agent exposes a local inspection API (`/api/tunnels`) used here to
//! tear down stale tunnels, create a new one on an already running agent,
//! and read back the public URL of a freshly spawned agent.

use std::{fmt, process::Stdio, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use url::Url;

const TUNNEL_NAME: &str = "quiz-forge";
const POLL_ATTEMPTS: usize = 20;
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const AGENT_API_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum TunnelError {
    Spawn(std::io::Error),
    Api(String),
    NotReady,
    InvalidUrl(String),
}

impl fmt::Display for TunnelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelError::Spawn(e) => write!(f, "failed to start ngrok agent: {}", e),
            TunnelError::Api(msg) => write!(f, "ngrok agent API error: {}", msg),
            TunnelError::NotReady => write!(f, "ngrok agent did not report a public URL in time"),
            TunnelError::InvalidUrl(url) => write!(f, "ngrok reported an invalid URL: {}", url),
        }
    }
}

impl std::error::Error for TunnelError {}

impl From<reqwest::Error> for TunnelError {
    fn from(err: reqwest::Error) -> Self {
        TunnelError::Api(err.to_string())
    }
}

/// Listing returned by `GET /api/tunnels`.
#[derive(Debug, Default, Deserialize)]
pub struct TunnelList {
    #[serde(default)]
    pub tunnels: Vec<TunnelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelInfo {
    pub name: String,
    pub uri: String,
    pub public_url: String,
    pub config: Option<TunnelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelConfig {
    pub addr: String,
}

#[derive(Debug, Serialize)]
struct StartTunnel<'a> {
    name: &'a str,
    proto: &'a str,
    addr: String,
}

/// A provisioned tunnel. A spawned agent is killed when this is dropped.
#[derive(Debug)]
pub struct Tunnel {
    pub public_url: Url,
    agent: Option<Child>,
}

impl Tunnel {
    pub fn owns_agent(&self) -> bool {
        self.agent.is_some()
    }
}

/// Client for the local ngrok agent.
#[derive(Debug, Clone)]
pub struct NgrokAgent {
    client: Client,
    api_url: String,
    bin: String,
    authtoken: String,
}

impl NgrokAgent {
    pub fn new(client: Client, api_url: &str, bin: &str, authtoken: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bin: bin.to_string(),
            authtoken: authtoken.to_string(),
        }
    }

    /// Lists tunnels of a running agent, or `None` if no agent answers.
    pub async fn list(&self) -> Option<TunnelList> {
        let response = self
            .client
            .get(format!("{}/api/tunnels", self.api_url))
            .timeout(AGENT_API_TIMEOUT)
            .send()
            .await
            .ok()?;
        response.error_for_status().ok()?.json().await.ok()
    }

    /// Closes every tunnel of a running agent. Returns how many were closed.
    pub async fn teardown(&self) -> Result<usize, TunnelError> {
        let Some(list) = self.list().await else {
            tracing::debug!("No ngrok agent running, nothing to tear down");
            return Ok(0);
        };

        for tunnel in &list.tunnels {
            tracing::info!("Closing existing tunnel {} ({})", tunnel.name, tunnel.public_url);
            self.client
                .delete(format!("{}{}", self.api_url, tunnel.uri))
                .timeout(AGENT_API_TIMEOUT)
                .send()
                .await?
                .error_for_status()?;
        }
        Ok(list.tunnels.len())
    }

    /// Exposes local `port` and returns its public URL.
    ///
    /// Reuses a running agent when one answers, otherwise spawns one.
    pub async fn open(&self, port: u16) -> Result<Tunnel, TunnelError> {
        if self.list().await.is_some() {
            return self.start_on_running_agent(port).await;
        }

        tracing::info!("Starting ngrok agent ({})", self.bin);
        let mut agent = Command::new(&self.bin)
            .args(["http", &port.to_string(), "--log", "stdout"])
            .env("NGROK_AUTHTOKEN", &self.authtoken)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(TunnelError::Spawn)?;

        for _ in 0..POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;

            if let Ok(Some(status)) = agent.try_wait() {
                return Err(TunnelError::Api(format!("ngrok agent exited with {}", status)));
            }
            if let Some(url) = self.list().await.and_then(|list| select_public_url(&list, port)) {
                return Ok(Tunnel {
                    public_url: parse_url(&url)?,
                    agent: Some(agent),
                });
            }
        }
        Err(TunnelError::NotReady)
    }

    async fn start_on_running_agent(&self, port: u16) -> Result<Tunnel, TunnelError> {
        tracing::info!("Reusing running ngrok agent at {}", self.api_url);
        let info: TunnelInfo = self
            .client
            .post(format!("{}/api/tunnels", self.api_url))
            .json(&StartTunnel {
                name: TUNNEL_NAME,
                proto: "http",
                addr: port.to_string(),
            })
            .timeout(AGENT_API_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Tunnel {
            public_url: parse_url(&info.public_url)?,
            agent: None,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, TunnelError> {
    Url::parse(raw).map_err(|_| TunnelError::InvalidUrl(raw.to_string()))
}

/// Picks the public URL forwarding to local `port`, preferring https.
pub fn select_public_url(list: &TunnelList, port: u16) -> Option<String> {
    let suffix = format!(":{}", port);
    let port_str = port.to_string();

    let mut matching: Vec<&TunnelInfo> = list
        .tunnels
        .iter()
        .filter(|t| !t.public_url.is_empty())
        .filter(|t| {
            t.config
                .as_ref()
                .is_some_and(|c| c.addr == port_str || c.addr.ends_with(&suffix))
        })
        .collect();

    matching.sort_by_key(|t| !t.public_url.starts_with("https://"));
    matching.first().map(|t| t.public_url.clone())
}

/// Console banner announcing the public URL.
pub fn banner(public_url: &Url) -> String {
    let rule = "=".repeat(60);
    format!("{rule}\n PUBLIC URL: {}\n{rule}", public_url.as_str().trim_end_matches('/'))
}
