use std::collections::BTreeMap;

use frost_crypto::jointkey::{decrypt_with_joint_key, encrypt_with_joint_key, TempKeyPair};
use frost_store::Repository;
use frost_types::model::{
    DkgRound1Request, DkgRound1Response, DkgRound2Response, DkgRound3Response, EncryptedEntry,
};
use frost_types::{FrostError, NodeId};
use serde::{Deserialize, Serialize};

use crate::state::{position_of, AppState, KeyPackageRecord};

/// Persisted DKG session state (C5). Mirrors `zexfrost.node.dkg.DKG`'s
/// instance fields one for one: a session tracks its own ephemeral temp
/// key plus whatever each round has produced so far.
#[derive(Debug, Clone, PartialEq)]
pub struct DkgSessionRecord {
    pub max_signers: u16,
    pub min_signers: u16,
    pub party: Vec<NodeId>,
    pub temp_secret_bytes: Vec<u8>,
    pub temp_public_bytes: Vec<u8>,
    pub round1_secret: Option<Vec<u8>>,
    pub round1_package: Option<Vec<u8>>,
    pub round2_secret: Option<Vec<u8>>,
    pub partners_temp_public_key: Option<BTreeMap<NodeId, Vec<u8>>>,
    pub partners_round1_packages: Option<BTreeMap<NodeId, Vec<u8>>>,
}

/// Canonical-JSON-signed payload for a round-1 broadcast. Signing this
/// struct (minus `signature`) is what a peer re-derives to verify it.
#[derive(Serialize, Deserialize)]
struct Round1SignedPayload<'a> {
    package: &'a frost_types::HexBytes,
    temp_public_key: &'a frost_types::HexBytes,
}

#[derive(Serialize, Deserialize)]
struct Round3SignedPayload<'a> {
    pubkey_package: &'a frost_types::HexBytes,
}

pub fn round1(state: &AppState, req: &DkgRound1Request) -> Result<DkgRound1Response, FrostError> {
    let position = position_of(&state.settings, &state.settings.id)
        .ok_or(FrostError::Crypto("node not in party".into()))?;

    let mut rng = rand::rngs::OsRng;
    let output = frost_crypto::dkg_part1(
        state.settings.curve,
        position,
        req.max_signers,
        req.min_signers,
        &mut rng,
    )?;

    let temp_keypair = TempKeyPair::generate(&mut rng);
    let temp_public_bytes = temp_keypair.public_bytes();

    let session = DkgSessionRecord {
        max_signers: req.max_signers,
        min_signers: req.min_signers,
        party: req.party.clone(),
        temp_secret_bytes: temp_keypair.secret_bytes().to_vec(),
        temp_public_bytes: temp_public_bytes.clone(),
        round1_secret: Some(output.secret),
        round1_package: Some(output.package.clone()),
        round2_secret: None,
        partners_temp_public_key: None,
        partners_round1_packages: None,
    };
    state.dkg_sessions.set(&req.dkg_id.0, session)?;

    let package = frost_types::HexBytes(output.package);
    let temp_public_key = frost_types::HexBytes(temp_public_bytes);
    let payload = Round1SignedPayload {
        package: &package,
        temp_public_key: &temp_public_key,
    };
    let signature = state.identity.sign_canonical(&payload)?;

    Ok(DkgRound1Response {
        package,
        temp_public_key,
        signature: frost_types::HexBytes(signature),
    })
}

/// Verifies every partner's round-1 broadcast signature before any session
/// state is touched, matching `DKG.validate_broadcast_data`.
fn validate_broadcasts(
    state: &AppState,
    broadcasts: &BTreeMap<NodeId, DkgRound1Response>,
) -> Result<(), FrostError> {
    let mut offending = Vec::new();
    for (node_id, response) in broadcasts {
        let member = state
            .settings
            .party
            .member(node_id)
            .ok_or_else(|| FrostError::Crypto(format!("unknown party member {node_id}")))?;
        let payload = Round1SignedPayload {
            package: &response.package,
            temp_public_key: &response.temp_public_key,
        };
        let ok = frost_crypto::identity::verify_canonical(
            state.settings.curve,
            member.public_key.as_slice(),
            &payload,
            response.signature.as_slice(),
        )?;
        if !ok {
            offending.push(node_id.clone());
        }
    }
    if offending.is_empty() {
        Ok(())
    } else {
        Err(FrostError::SignatureValidation { offending })
    }
}

pub fn round2(
    state: &AppState,
    dkg_id: &str,
    broadcasts: &BTreeMap<NodeId, DkgRound1Response>,
) -> Result<DkgRound2Response, FrostError> {
    validate_broadcasts(state, broadcasts)?;

    let mut session = state.dkg_sessions.get(dkg_id)?;
    let round1_secret = session
        .round1_secret
        .clone()
        .ok_or(FrostError::Round1NotCompleted)?;

    let partners_temp_public_key: BTreeMap<NodeId, Vec<u8>> = broadcasts
        .iter()
        .map(|(id, r)| (id.clone(), r.temp_public_key.0.clone()))
        .collect();
    let partners_round1_packages: BTreeMap<NodeId, Vec<u8>> = broadcasts
        .iter()
        .map(|(id, r)| (id.clone(), r.package.0.clone()))
        .collect();

    let mut round1_packages_by_position = BTreeMap::new();
    for (id, bytes) in &partners_round1_packages {
        let pos = position_of(&state.settings, id).ok_or(FrostError::Crypto(format!(
            "unknown party member {id}"
        )))?;
        round1_packages_by_position.insert(pos, bytes.clone());
    }

    let output = frost_crypto::dkg_part2(state.settings.curve, &round1_secret, &round1_packages_by_position)?;

    let own_temp = TempKeyPair::from_bytes(&session.temp_secret_bytes)?;
    let mut encrypted_package = Vec::with_capacity(partners_temp_public_key.len());
    for (node_id, peer_public) in &partners_temp_public_key {
        let pos = position_of(&state.settings, node_id).ok_or(FrostError::Crypto(format!(
            "unknown party member {node_id}"
        )))?;
        let package_bytes = output
            .packages
            .get(&pos)
            .ok_or_else(|| FrostError::Crypto(format!("no round-2 package for {node_id}")))?;
        let token = encrypt_with_joint_key(package_bytes, &own_temp, peer_public)?;
        encrypted_package.push(EncryptedEntry {
            node_id: node_id.clone(),
            token,
        });
    }

    session.round2_secret = Some(output.secret);
    session.partners_temp_public_key = Some(partners_temp_public_key);
    session.partners_round1_packages = Some(partners_round1_packages);
    state.dkg_sessions.set(dkg_id, session)?;

    Ok(DkgRound2Response { encrypted_package })
}

pub fn round3(
    state: &AppState,
    dkg_id: &str,
    encrypted_packages: &BTreeMap<NodeId, String>,
) -> Result<DkgRound3Response, FrostError> {
    let session = state.dkg_sessions.get(dkg_id)?;
    let round2_secret = session.round2_secret.clone().ok_or(FrostError::Round2NotCompleted)?;
    let partners_temp_public_key = session
        .partners_temp_public_key
        .clone()
        .ok_or(FrostError::PartnersTempPublicKeyMissing)?;
    let partners_round1_packages = session
        .partners_round1_packages
        .clone()
        .ok_or(FrostError::PartnersRound1PackagesMissing)?;

    let own_temp = TempKeyPair::from_bytes(&session.temp_secret_bytes)?;

    let mut round1_by_position = BTreeMap::new();
    for (id, bytes) in &partners_round1_packages {
        let pos = position_of(&state.settings, id).ok_or(FrostError::Crypto(format!(
            "unknown party member {id}"
        )))?;
        round1_by_position.insert(pos, bytes.clone());
    }

    let mut round2_by_position = BTreeMap::new();
    for (node_id, token) in encrypted_packages {
        let peer_public = partners_temp_public_key
            .get(node_id)
            .ok_or_else(|| FrostError::Crypto(format!("no temp public key for {node_id}")))?;
        let plaintext = decrypt_with_joint_key(token, &own_temp, peer_public)?;
        let pos = position_of(&state.settings, node_id).ok_or(FrostError::Crypto(format!(
            "unknown party member {node_id}"
        )))?;
        round2_by_position.insert(pos, plaintext);
    }

    let output = frost_crypto::dkg_part3(
        state.settings.curve,
        &round2_secret,
        &round1_by_position,
        &round2_by_position,
    )?;

    let pubkey_package = frost_types::HexBytes(output.pubkey_package.clone());
    let verifying_key_hex = hex::encode(&output.pubkey_package);
    state.key_packages.set(
        &verifying_key_hex,
        KeyPackageRecord {
            key_package: output.key_package,
            pubkey_package: output.pubkey_package,
        },
    )?;

    let payload = Round3SignedPayload {
        pubkey_package: &pubkey_package,
    };
    let signature = state.identity.sign_canonical(&payload)?;

    // Only drop the session once round 3 has actually succeeded; an
    // out-of-order or failing call must leave it intact for a retry.
    // `own_temp`/`session.temp_secret_bytes` are dropped here too; the
    // ephemeral key must not outlive round 3.
    state.dkg_sessions.delete(dkg_id)?;

    Ok(DkgRound3Response {
        pubkey_package,
        signature: frost_types::HexBytes(signature),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeSettings;
    use frost_types::model::{NodeRecord, PartyConfig};
    use frost_types::{Curve, HexBytes};
    use rand::RngCore;

    fn random_identity_bytes() -> Vec<u8> {
        let mut bytes = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        bytes
    }

    fn test_state(curve: Curve, self_id: NodeId, self_key: &[u8], members: Vec<NodeRecord>) -> AppState {
        let settings = NodeSettings {
            id: self_id,
            curve,
            private_key: self_key.to_vec(),
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            party: PartyConfig {
                curve,
                members,
                max_signers: 3,
                min_signers: 2,
            },
        };
        AppState::new(settings).unwrap()
    }

    /// Property 3: tampering any field of a node's round-1 broadcast makes
    /// its signature fail canonical-JSON verification on every peer.
    #[test]
    fn tampered_broadcast_is_rejected_with_offending_node() {
        let self_bytes = random_identity_bytes();
        let peer_bytes = random_identity_bytes();
        let self_id = NodeId::from("validator");
        let peer_id = NodeId::from("peer");

        let self_public = frost_crypto::identity::IdentityKey::load(Curve::Secp256k1, &self_bytes)
            .unwrap()
            .public_key_bytes();
        let peer_identity = frost_crypto::identity::IdentityKey::load(Curve::Secp256k1, &peer_bytes).unwrap();
        let peer_public = peer_identity.public_key_bytes();

        let members = vec![
            NodeRecord {
                id: self_id.clone(),
                base_url: "http://127.0.0.1:1".into(),
                public_key: HexBytes(self_public),
            },
            NodeRecord {
                id: peer_id.clone(),
                base_url: "http://127.0.0.1:2".into(),
                public_key: HexBytes(peer_public),
            },
        ];
        let state = test_state(Curve::Secp256k1, self_id, &self_bytes, members);

        let package = HexBytes(b"package-bytes".to_vec());
        let temp_public_key = HexBytes(b"temp-public-key".to_vec());
        let payload = Round1SignedPayload {
            package: &package,
            temp_public_key: &temp_public_key,
        };
        let signature = peer_identity.sign_canonical(&payload).unwrap();

        let mut broadcasts = BTreeMap::new();
        broadcasts.insert(
            peer_id.clone(),
            DkgRound1Response {
                package,
                // tampered: does not match what was actually signed
                temp_public_key: HexBytes(b"a-different-temp-key".to_vec()),
                signature: HexBytes(signature),
            },
        );

        match validate_broadcasts(&state, &broadcasts) {
            Err(FrostError::SignatureValidation { offending }) => assert_eq!(offending, vec![peer_id]),
            other => panic!("expected SignatureValidation, got {other:?}"),
        }
    }

    /// Property 4: a DKG session stored then loaded compares equal across
    /// every field, including the temp key and any completed round slots.
    #[test]
    fn persisted_session_round_trips_through_repository() {
        let self_bytes = random_identity_bytes();
        let self_id = NodeId::from("solo");
        let self_public = frost_crypto::identity::IdentityKey::load(Curve::Secp256k1, &self_bytes)
            .unwrap()
            .public_key_bytes();
        let members = vec![NodeRecord {
            id: self_id.clone(),
            base_url: "http://127.0.0.1:1".into(),
            public_key: HexBytes(self_public),
        }];
        let state = test_state(Curve::Secp256k1, self_id, &self_bytes, members);

        let session = DkgSessionRecord {
            max_signers: 3,
            min_signers: 2,
            party: vec![NodeId::from("a"), NodeId::from("b")],
            temp_secret_bytes: vec![1, 2, 3],
            temp_public_bytes: vec![4, 5, 6],
            round1_secret: Some(vec![7]),
            round1_package: Some(vec![8]),
            round2_secret: None,
            partners_temp_public_key: Some(BTreeMap::from([(NodeId::from("a"), vec![9])])),
            partners_round1_packages: None,
        };

        state.dkg_sessions.set("session-1", session.clone()).unwrap();
        let loaded = state.dkg_sessions.get("session-1").unwrap();
        assert_eq!(loaded, session);
    }
}
