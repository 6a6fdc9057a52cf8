use std::{fs, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use frost_types::model::{NodeRecord, PartyConfig};
use frost_types::Curve;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub party: PartyFileConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct PartyFileConfig {
    pub curve: String,
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

#[derive(Debug, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_dkg_timeout_secs")]
    pub dkg_secs: u64,
    #[serde(default = "default_signing_timeout_secs")]
    pub signing_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            dkg_secs: default_dkg_timeout_secs(),
            signing_secs: default_signing_timeout_secs(),
        }
    }
}

fn default_dkg_timeout_secs() -> u64 {
    10
}

fn default_signing_timeout_secs() -> u64 {
    20
}

#[derive(Clone)]
pub struct CoordinatorSettings {
    pub server_host: String,
    pub server_port: u16,
    pub party: PartyConfig,
    pub dkg_timeout: Duration,
    pub signing_timeout: Duration,
}

impl CoordinatorSettings {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let config: ConfigFile = toml::from_str(&content).context("failed to parse config file")?;

        let curve = Curve::from_str(&config.party.curve)
            .map_err(|e| anyhow::anyhow!("invalid party.curve {}: {e}", config.party.curve))?;

        let members = config
            .party
            .members
            .into_iter()
            .map(|m| -> Result<NodeRecord> {
                Ok(NodeRecord {
                    id: frost_types::NodeId(m.id),
                    base_url: m.base_url,
                    public_key: hex::decode(&m.public_key_hex)
                        .context("invalid party member public_key_hex")?
                        .into(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            server_host: config.server.host,
            server_port: config.server.port,
            party: PartyConfig {
                curve,
                members,
                max_signers: config.party.max_signers,
                min_signers: config.party.min_signers,
            },
            dkg_timeout: Duration::from_secs(config.timeouts.dkg_secs),
            signing_timeout: Duration::from_secs(config.timeouts.signing_secs),
        })
    }
}
