//! Outbound transport to party nodes (C9, coordinator side). One
//! `reqwest::Client` shared across every orchestrator (cheap to clone —
//! internally `Arc`-backed, following the teacher's `frost_client.rs`
//! idiom of a client built once per call site, centralized here since the
//! coordinator owns more than one orchestrator). Every response updates
//! the node's selection weight (§4.8) before the result is handed back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use frost_types::model::NodeRecord;
use frost_types::{FrostError, NodeId};

use crate::weights::{Outcome, WeightTracker};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Shared outbound client plus the weight tracker every response updates.
#[derive(Clone)]
pub struct NodeClient {
    pub http: reqwest::Client,
    pub weights: Arc<WeightTracker>,
}

impl NodeClient {
    pub fn new(weights: Arc<WeightTracker>) -> Self {
        Self {
            http: reqwest::Client::new(),
            weights,
        }
    }

    /// POSTs `body` to `{node.base_url}{path}` with a per-request deadline,
    /// recording the outcome against the node's selection weight.
    pub async fn post<Req: Serialize + ?Sized, Resp: DeserializeOwned>(
        &self,
        node: &NodeRecord,
        path: &str,
        timeout: Duration,
        body: &Req,
    ) -> Result<Resp, FrostError> {
        let url = format!("{}{path}", node.base_url);
        let started = Instant::now();
        let sent = self.http.post(&url).timeout(timeout).json(body).send().await;

        let response = match sent {
            Ok(r) => r,
            Err(e) => {
                self.weights.record(&node.id, Outcome::Transport);
                return Err(if e.is_timeout() {
                    FrostError::NodeTimeout { node: node.id.clone() }
                } else {
                    FrostError::Transport {
                        node: node.id.clone(),
                        detail: e.to_string(),
                    }
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            let parsed = response.json::<Resp>().await.map_err(|e| FrostError::Transport {
                node: node.id.clone(),
                detail: format!("malformed response body: {e}"),
            })?;
            self.weights.record(&node.id, Outcome::Success { latency: started.elapsed() });
            Ok(parsed)
        } else {
            self.weights
                .record(&node.id, if status.is_client_error() { Outcome::ClientError } else { Outcome::ServerError });
            Err(remote_error(&node.id, status, response).await)
        }
    }
}

async fn remote_error(node_id: &NodeId, status: reqwest::StatusCode, response: reqwest::Response) -> FrostError {
    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("HTTP {status}"),
    };
    FrostError::Transport {
        node: node_id.clone(),
        detail,
    }
}
