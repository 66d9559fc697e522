//! Multi-target publishing of nanopublication bundles.
//!
//! Every target server receives every unit of the bundle as a separate
//! `POST` with `Content-Type: application/trig; charset=utf-8`. A server only
//! counts as published when all of its units were accepted: the first
//! rejection or transport error abandons the remaining units for that server.
//!
//! Servers are attempted concurrently and independently of each other. The
//! returned list keeps the order of the target list. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use nanopub_submitter::{split_bundle, DEFAULT_ENCODING, TRIG_MEDIA_TYPE};
use reqwest::{header, Client};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// `User-Agent` sent with every publish request.
pub const USER_AGENT: &str = concat!("nanopub-submitter/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// PublishError
// ---------------------------------------------------------------------------

/// Why a single server was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected unit {unit} with status {status}: {body}")]
    Rejected { unit: usize, status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Publishes bundles to nanopub servers.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: Client,
}

impl Publisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a publisher whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::new(client))
    }

    /// Publish `bundle` to every server in `servers`.
    ///
    /// Returns the servers that accepted every unit, in `servers` order.
    pub async fn publish(&self, bundle: &str, servers: &[String]) -> Vec<String> {
        let units: Arc<Vec<String>> = Arc::new(split_bundle(bundle));
        debug!("publisher: {} unit(s) to {} server(s)", units.len(), servers.len());

        let mut tasks = JoinSet::new();
        for (index, server) in servers.iter().enumerate() {
            let client = self.client.clone();
            let units = Arc::clone(&units);
            let server = server.clone();
            tasks.spawn(async move {
                let outcome = publish_to_server(&client, &server, &units).await;
                (index, server, outcome)
            });
        }

        let mut accepted: Vec<(usize, String)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, server, Ok(()))) => {
                    info!("publisher: nanopub published via {server}");
                    accepted.push((index, server));
                }
                Ok((_, server, Err(e))) => {
                    warn!("publisher: failed to publish nanopub via {server}: {e}");
                }
                Err(e) => {
                    warn!("publisher: publish task failed: {e}");
                }
            }
        }

        accepted.sort_by_key(|(index, _)| *index);
        accepted.into_iter().map(|(_, server)| server).collect()
    }
}

/// Send every unit to one server, stopping at the first failure.
async fn publish_to_server(
    client: &Client,
    server: &str,
    units: &[String],
) -> Result<(), PublishError> {
    let content_type = format!("{TRIG_MEDIA_TYPE}; charset={DEFAULT_ENCODING}");
    for (unit, body) in units.iter().enumerate() {
        debug!("publisher: submitting unit {} to {server}", unit + 1);
        let response = client
            .post(server)
            .header(header::CONTENT_TYPE, &content_type)
            .body(body.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("publisher: {server} answered status={status}: {body}");
            return Err(PublishError::Rejected {
                unit: unit + 1,
                status: status.as_u16(),
                body,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
