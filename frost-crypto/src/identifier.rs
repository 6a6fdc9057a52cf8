use frost_core::{Ciphersuite, Identifier};
use frost_types::FrostError;

/// Converts a 1-based party position into a ciphersuite `Identifier`.
///
/// Party order is fixed by the node list in `PartyConfig`; the coordinator
/// and every node agree on the same ordering, so position `i` (1-indexed,
/// matching the teacher's `node_index + 1` convention) always maps to the
/// same identifier.
pub fn identifier_for_position<C: Ciphersuite>(position: u16) -> Result<Identifier<C>, FrostError> {
    Identifier::try_from(position).map_err(|e| FrostError::Crypto(format!("bad identifier: {e}")))
}

pub fn identifier_to_bytes<C: Ciphersuite>(id: &Identifier<C>) -> Vec<u8> {
    id.serialize()
}

pub fn identifier_from_bytes<C: Ciphersuite>(bytes: &[u8]) -> Result<Identifier<C>, FrostError> {
    Identifier::deserialize(bytes).map_err(|e| FrostError::Crypto(format!("bad identifier bytes: {e}")))
}
