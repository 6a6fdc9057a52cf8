//! Shared harness for in-process multi-node scenarios: spins up real
//! `frost_node::run` servers on localhost and a coordinator context that
//! talks to them over real HTTP, matching how the binaries actually run.

use std::time::Duration;

use frost_types::model::{NodeRecord, PartyConfig};
use frost_types::{Curve, NodeId};
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

pub struct TestNode {
    pub id: NodeId,
    pub port: u16,
    pub handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

/// Generates `n` fresh secp256k1 identities, starts an in-process node per
/// identity bound to a distinct localhost port, and waits for all of them
/// to answer `/health`.
pub async fn spawn_party(curve: Curve, n: usize, max_signers: u16, min_signers: u16, base_port: u16) -> (PartyConfig, Vec<TestNode>) {
    let keys: Vec<SigningKey> = (0..n).map(|_| SigningKey::random(&mut OsRng)).collect();
    let members: Vec<NodeRecord> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let port = base_port + i as u16;
            let public = VerifyingKey::from(key).to_encoded_point(true).as_bytes().to_vec();
            NodeRecord {
                id: NodeId(format!("node-{i}")),
                base_url: format!("http://127.0.0.1:{port}"),
                public_key: public.into(),
            }
        })
        .collect();

    let party = PartyConfig {
        curve,
        members: members.clone(),
        max_signers,
        min_signers,
    };

    let mut nodes = Vec::with_capacity(n);
    for (i, key) in keys.into_iter().enumerate() {
        let port = base_port + i as u16;
        let settings = frost_node::NodeSettings {
            id: members[i].id.clone(),
            curve,
            private_key: key.to_bytes().to_vec(),
            server_host: "127.0.0.1".to_string(),
            server_port: port,
            party: party.clone(),
        };
        let handle = tokio::spawn(async move { frost_node::run(settings).await });
        nodes.push(TestNode {
            id: members[i].id.clone(),
            port,
            handle,
        });
    }

    for node in &nodes {
        wait_until_healthy(node.port).await;
    }

    (party, nodes)
}

async fn wait_until_healthy(port: u16) {
    let url = format!("http://127.0.0.1:{port}/health");
    for _ in 0..100 {
        if let Ok(resp) = reqwest::get(&url).await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("node at {url} never became healthy");
}

pub fn coordinator_settings(party: PartyConfig) -> frost_coordinator::CoordinatorSettings {
    frost_coordinator::CoordinatorSettings {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        party,
        dkg_timeout: Duration::from_secs(5),
        signing_timeout: Duration::from_secs(5),
    }
}
