use std::{fs, str::FromStr};

use anyhow::{Context, Result};
use frost_types::{Curve, NodeId};
use frost_types::model::{NodeRecord, PartyConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub node: NodeFileConfig,
    pub party: PartyFileConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct NodeFileConfig {
    pub id: String,
    pub curve: String,
    /// Hex-encoded long-term identity private key.
    pub private_key_hex: String,
}

#[derive(Debug, Deserialize)]
pub struct PartyFileConfig {
    pub members: Vec<NodeRecordFile>,
    #[serde(default = "default_max_signers")]
    pub max_signers: u16,
    #[serde(default = "default_min_signers")]
    pub min_signers: u16,
}

fn default_max_signers() -> u16 {
    3
}

fn default_min_signers() -> u16 {
    2
}

#[derive(Debug, Deserialize)]
pub struct NodeRecordFile {
    pub id: String,
    pub base_url: String,
    pub public_key_hex: String,
}

/// Resolved node identity and settings (C3). `NODE__ID`, `NODE__CURVE_NAME`
/// and `NODE__PRIVATE_KEY` environment variables take precedence over the
/// config file, mirroring the `NODE__`-prefixed env settings of the
/// original system.
#[derive(Clone)]
pub struct NodeSettings {
    pub id: NodeId,
    pub curve: Curve,
    pub private_key: Vec<u8>,
    pub server_host: String,
    pub server_port: u16,
    pub party: PartyConfig,
}

impl NodeSettings {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let config: ConfigFile = toml::from_str(&content).context("failed to parse config file")?;

        let id = std::env::var("NODE__ID").unwrap_or(config.node.id);
        let curve_name = std::env::var("NODE__CURVE_NAME").unwrap_or(config.node.curve);
        let private_key_hex = std::env::var("NODE__PRIVATE_KEY").unwrap_or(config.node.private_key_hex);

        let curve = Curve::from_str(&curve_name)
            .map_err(|e| anyhow::anyhow!("invalid node.curve {curve_name}: {e}"))?;
        let private_key = hex::decode(&private_key_hex).context("invalid node.private_key_hex")?;

        let members = config
            .party
            .members
            .into_iter()
            .map(|m| -> Result<NodeRecord> {
                Ok(NodeRecord {
                    id: NodeId(m.id),
                    base_url: m.base_url,
                    public_key: hex::decode(&m.public_key_hex)
                        .context("invalid party member public_key_hex")?
                        .into(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let party = PartyConfig {
            curve,
            members,
            max_signers: config.party.max_signers,
            min_signers: config.party.min_signers,
        };

        Ok(Self {
            id: NodeId(id),
            curve,
            private_key,
            server_host: config.server.host,
            server_port: config.server.port,
            party,
        })
    }

    /// 1-based position of this node within the party, used to derive its
    /// FROST identifier.
    pub fn position(&self) -> Result<u16> {
        self.party
            .members
            .iter()
            .position(|m| m.id == self.id)
            .map(|idx| idx as u16 + 1)
            .ok_or_else(|| anyhow::anyhow!("this node's id is not listed in party.members"))
    }
}
