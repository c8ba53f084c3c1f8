//! Leader-log node stats module
//! Reads the node's EKG metrics endpoint so a run logs where the node is

use reqwest::{header::ACCEPT, Client};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(#[from] reqwest::Error),

    #[error("Failed to fetch node stats from {0}: {1}")]
    RequestFailed(String, reqwest::Error),

    #[error("Node stats request to {0} failed: HTTP status {1}")]
    InvalidStatusCode(String, reqwest::StatusCode),

    #[error("Node stats from {0} are not JSON: {1}")]
    InvalidBody(String, reqwest::Error),
}

/// Chain position reported by the node, where exposed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub epoch: Option<u64>,
    pub slot: Option<u64>,
    pub block: Option<u64>,
}

impl NodeStats {
    /// Pick the counters out of an EKG metric tree
    pub fn from_ekg(tree: &Value) -> Self {
        let counter = |name: &str| {
            tree.pointer(&format!("/cardano/node/metrics/{name}/int/val"))
                .and_then(Value::as_u64)
        };

        Self {
            epoch: counter("epoch"),
            slot: counter("slotNum"),
            block: counter("blockNum"),
        }
    }
}

/// Client for the node's EKG endpoint
pub struct NodeStatsClient {
    client: Client,
    url: String,
}

impl NodeStatsClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, StatsError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn fetch(&self) -> Result<NodeStats, StatsError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| StatsError::RequestFailed(self.url.clone(), e))?;

        if !response.status().is_success() {
            return Err(StatsError::InvalidStatusCode(
                self.url.clone(),
                response.status(),
            ));
        }

        let tree: Value =
            response.json().await.map_err(|e| StatsError::InvalidBody(self.url.clone(), e))?;
        Ok(NodeStats::from_ekg(&tree))
    }

    /// Fetch and log the node's position
    pub async fn update(&self) -> Result<NodeStats, StatsError> {
        let stats = self.fetch().await?;
        match (stats.epoch, stats.slot, stats.block) {
            (None, None, None) => info!("Node stats from {} carry no chain counters", self.url),
            (epoch, slot, block) => info!(
                "Node at epoch {} slot {} block {}",
                counter_text(epoch),
                counter_text(slot),
                counter_text(block)
            ),
        }
        Ok(stats)
    }
}

fn counter_text(counter: Option<u64>) -> String {
    counter.map_or_else(|| "?".to_string(), |n| n.to_string())
}
