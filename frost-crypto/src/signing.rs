use std::collections::BTreeMap;

use frost_core::keys::{KeyPackage, PublicKeyPackage};
use frost_core::round1::{SigningCommitments, SigningNonces};
use frost_core::{round2, Ciphersuite, Signature, SigningPackage};
use frost_types::FrostError;

use crate::identifier::{identifier_for_position, identifier_to_bytes};

fn map_err<E: std::fmt::Display>(e: E) -> FrostError {
    FrostError::Crypto(e.to_string())
}

pub struct CommitResult {
    pub nonces: Vec<u8>,
    pub hiding: Vec<u8>,
    pub binding: Vec<u8>,
}

pub fn round1_commit<C: Ciphersuite>(
    key_package_bytes: &[u8],
    rng: &mut (impl rand::RngCore + rand::CryptoRng),
) -> Result<CommitResult, FrostError> {
    let key_package = KeyPackage::<C>::deserialize(key_package_bytes).map_err(map_err)?;
    let (nonces, commitments) =
        frost_core::round1::commit(key_package.signing_share(), rng);
    Ok(CommitResult {
        nonces: nonces.serialize().map_err(map_err)?,
        hiding: commitments.hiding().serialize().map_err(map_err)?,
        binding: commitments.binding().serialize().map_err(map_err)?,
    })
}

fn build_signing_package<C: Ciphersuite>(
    message: &[u8],
    commitments: &BTreeMap<u16, (Vec<u8>, Vec<u8>)>,
) -> Result<SigningPackage<C>, FrostError> {
    let mut map = BTreeMap::new();
    for (pos, (hiding, binding)) in commitments {
        let id = identifier_for_position::<C>(*pos)?;
        let hiding = frost_core::round1::NonceCommitment::<C>::deserialize(hiding).map_err(map_err)?;
        let binding = frost_core::round1::NonceCommitment::<C>::deserialize(binding).map_err(map_err)?;
        map.insert(id, SigningCommitments::<C>::new(hiding, binding));
    }
    Ok(SigningPackage::new(map, message))
}

pub fn round2_sign<C: Ciphersuite>(
    message: &[u8],
    commitments: &BTreeMap<u16, (Vec<u8>, Vec<u8>)>,
    nonces_bytes: &[u8],
    key_package_bytes: &[u8],
) -> Result<Vec<u8>, FrostError> {
    let signing_package = build_signing_package::<C>(message, commitments)?;
    let nonces = SigningNonces::<C>::deserialize(nonces_bytes).map_err(map_err)?;
    let key_package = KeyPackage::<C>::deserialize(key_package_bytes).map_err(map_err)?;
    let share = round2::sign(&signing_package, &nonces, &key_package).map_err(map_err)?;
    share.serialize().map_err(map_err)
}

pub fn aggregate<C: Ciphersuite>(
    message: &[u8],
    commitments: &BTreeMap<u16, (Vec<u8>, Vec<u8>)>,
    shares: &BTreeMap<u16, Vec<u8>>,
    pubkey_package_bytes: &[u8],
) -> Result<Vec<u8>, FrostError> {
    let signing_package = build_signing_package::<C>(message, commitments)?;
    let pubkey_package = PublicKeyPackage::<C>::deserialize(pubkey_package_bytes).map_err(map_err)?;

    let mut share_map = BTreeMap::new();
    for (pos, bytes) in shares {
        let id = identifier_for_position::<C>(*pos)?;
        share_map.insert(id, round2::SignatureShare::<C>::deserialize(bytes).map_err(map_err)?);
    }

    let signature: Signature<C> =
        frost_core::aggregate(&signing_package, &share_map, &pubkey_package).map_err(map_err)?;
    signature.serialize().map_err(map_err)
}

pub fn verify<C: Ciphersuite>(
    message: &[u8],
    signature_bytes: &[u8],
    pubkey_package_bytes: &[u8],
) -> Result<bool, FrostError> {
    let signature = Signature::<C>::deserialize(signature_bytes).map_err(map_err)?;
    let pubkey_package = PublicKeyPackage::<C>::deserialize(pubkey_package_bytes).map_err(map_err)?;
    Ok(pubkey_package
        .verifying_key()
        .verify(message, &signature)
        .is_ok())
}

pub fn identifier_bytes_for_position<C: Ciphersuite>(position: u16) -> Result<Vec<u8>, FrostError> {
    Ok(identifier_to_bytes::<C>(&identifier_for_position::<C>(position)?))
}
