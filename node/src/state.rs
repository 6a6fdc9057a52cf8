use std::sync::Arc;

use frost_crypto::identity::IdentityKey;
use frost_store::{MemoryRepository, Repository};
use frost_types::FrostError;

use crate::config::NodeSettings;
use crate::dkg::DkgSessionRecord;

#[derive(Clone)]
pub struct KeyPackageRecord {
    pub key_package: Vec<u8>,
    pub pubkey_package: Vec<u8>,
}

#[derive(Clone)]
pub struct NonceRecord {
    pub nonces: Vec<u8>,
}

/// Everything a node HTTP handler needs: its settings, identity key, and
/// the three repositories (C2) keyed as spec.md describes.
pub struct AppState {
    pub settings: NodeSettings,
    pub identity: IdentityKey,
    pub dkg_sessions: Arc<dyn Repository<DkgSessionRecord>>,
    pub key_packages: Arc<dyn Repository<KeyPackageRecord>>,
    pub nonces: Arc<dyn Repository<NonceRecord>>,
}

impl AppState {
    pub fn new(settings: NodeSettings) -> Result<Self, FrostError> {
        let identity = IdentityKey::load(settings.curve, &settings.private_key)?;
        Ok(Self {
            settings,
            identity,
            dkg_sessions: Arc::new(MemoryRepository::new(|| FrostError::DkgNotFound)),
            key_packages: Arc::new(MemoryRepository::new(|| FrostError::KeyNotFound)),
            nonces: Arc::new(MemoryRepository::new(|| FrostError::NonceNotFound)),
        })
    }
}

/// 1-based position of `id` within the party's fixed member ordering; both
/// node and coordinator derive FROST identifiers from this same ordering.
pub fn position_of(settings: &NodeSettings, id: &frost_types::NodeId) -> Option<u16> {
    settings
        .party
        .members
        .iter()
        .position(|m| &m.id == id)
        .map(|idx| idx as u16 + 1)
}
