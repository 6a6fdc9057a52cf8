use std::collections::BTreeMap;

use frost_store::Repository;
use frost_types::model::{Commitment, SigningEntry};
use frost_types::{FrostError, HexBytes};

use crate::state::{position_of, AppState, NonceRecord};

pub fn commitment(
    state: &AppState,
    pubkey_package: &HexBytes,
    tweak_by: Option<&HexBytes>,
) -> Result<Commitment, FrostError> {
    let verifying_key_hex = hex::encode(&pubkey_package.0);
    let key_record = state.key_packages.get(&verifying_key_hex)?;

    let tweak_by = tweak_by.map(|t| t.0.as_slice());
    let mut rng = rand::rngs::OsRng;
    let result = frost_crypto::round1_commit(state.settings.curve, &key_record.key_package, tweak_by, &mut rng)?;

    let nonce_key = format!(
        "{}-{}",
        hex::encode(&result.binding),
        hex::encode(&result.hiding)
    );
    state.nonces.set(
        &nonce_key,
        NonceRecord {
            nonces: result.nonces,
        },
    )?;

    Ok(Commitment {
        hiding: HexBytes(result.hiding),
        binding: HexBytes(result.binding),
    })
}

/// Produces this node's signature share for one batch entry. The nonce for
/// our own commitment is popped (not get-then-delete) so it can never be
/// reused even under concurrent signing requests.
pub fn sign_entry(state: &AppState, entry: &SigningEntry, pubkey_package: &HexBytes) -> Result<HexBytes, FrostError> {
    let self_id = &state.settings.id;
    let own_commitment = entry
        .commitments
        .iter()
        .find(|c| &c.node_id == self_id)
        .ok_or_else(|| FrostError::Crypto("missing own commitment in signing request".into()))?;

    let nonce_key = format!(
        "{}-{}",
        hex::encode(&own_commitment.binding.0),
        hex::encode(&own_commitment.hiding.0)
    );
    let nonce_record = state.nonces.pop(&nonce_key)?;

    let verifying_key_hex = hex::encode(&pubkey_package.0);
    let key_record = state.key_packages.get(&verifying_key_hex)?;

    let mut commitments_by_position = BTreeMap::new();
    for c in &entry.commitments {
        let pos = position_of(&state.settings, &c.node_id)
            .ok_or_else(|| FrostError::Crypto(format!("unknown party member {}", c.node_id)))?;
        commitments_by_position.insert(pos, (c.hiding.0.clone(), c.binding.0.clone()));
    }

    let tweak_by = entry.tweak_by.as_ref().map(|t| t.0.as_slice());
    let share = frost_crypto::round2_sign(
        state.settings.curve,
        &entry.message.0,
        &commitments_by_position,
        &nonce_record.nonces,
        &key_record.key_package,
        tweak_by,
    )?;

    Ok(HexBytes(share))
}
