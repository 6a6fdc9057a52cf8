//! Aggregate health check across the party, grounded on the teacher's
//! `frost_aggregator::frost_client::check_all_nodes_health`.

use serde::Deserialize;

use frost_types::NodeId;

use crate::CoordinatorContext;

pub struct NodeHealth {
    pub node_id: NodeId,
    pub healthy: bool,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct HealthBody {
    healthy: bool,
}

pub async fn check_all(ctx: &CoordinatorContext) -> Vec<NodeHealth> {
    let mut statuses = Vec::with_capacity(ctx.settings.party.members.len());
    for member in &ctx.settings.party.members {
        let url = format!("{}/health", member.base_url);
        let status = match ctx.client.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<HealthBody>().await {
                Ok(body) => NodeHealth {
                    node_id: member.id.clone(),
                    healthy: body.healthy,
                    error: None,
                },
                Err(e) => NodeHealth {
                    node_id: member.id.clone(),
                    healthy: false,
                    error: Some(format!("malformed health response: {e}")),
                },
            },
            Ok(resp) => NodeHealth {
                node_id: member.id.clone(),
                healthy: false,
                error: Some(format!("HTTP {}", resp.status())),
            },
            Err(e) => NodeHealth {
                node_id: member.id.clone(),
                healthy: false,
                error: Some(format!("connection error: {e}")),
            },
        };
        statuses.push(status);
    }
    statuses
}
