use std::collections::BTreeMap;

use frost_core::keys::dkg::{part1, part2, part3};
use frost_core::keys::{KeyPackage, PublicKeyPackage};
use frost_core::Ciphersuite;
use frost_types::FrostError;

use crate::identifier::{identifier_for_position, identifier_from_bytes, identifier_to_bytes};

fn map_err<E: std::fmt::Display>(e: E) -> FrostError {
    FrostError::Crypto(e.to_string())
}

/// Output of round 1: keep `secret` server-side, broadcast `package`.
pub struct Round1Output {
    pub secret: Vec<u8>,
    pub package: Vec<u8>,
}

pub fn dkg_part1<C: Ciphersuite>(
    position: u16,
    max_signers: u16,
    min_signers: u16,
    rng: &mut (impl rand::RngCore + rand::CryptoRng),
) -> Result<Round1Output, FrostError> {
    let id = identifier_for_position::<C>(position)?;
    let (secret, package) = part1(id, max_signers, min_signers, rng).map_err(map_err)?;
    Ok(Round1Output {
        secret: secret.serialize().map_err(map_err)?,
        package: package.serialize().map_err(map_err)?,
    })
}

/// Output of round 2: keep `secret` server-side, one package per recipient.
pub struct Round2Output {
    pub secret: Vec<u8>,
    /// Keyed by recipient party position.
    pub packages: BTreeMap<u16, Vec<u8>>,
}

pub fn dkg_part2<C: Ciphersuite>(
    round1_secret: &[u8],
    /// Every partner's round-1 package, keyed by party position.
    round1_packages: &BTreeMap<u16, Vec<u8>>,
) -> Result<Round2Output, FrostError> {
    let secret = frost_core::keys::dkg::round1::SecretPackage::<C>::deserialize(round1_secret)
        .map_err(map_err)?;
    let mut packages = BTreeMap::new();
    for (pos, bytes) in round1_packages {
        let id = identifier_for_position::<C>(*pos)?;
        let pkg = frost_core::keys::dkg::round1::Package::<C>::deserialize(bytes).map_err(map_err)?;
        packages.insert(id, pkg);
    }
    let (secret_out, round2_packages) = part2(secret, &packages).map_err(map_err)?;

    let mut out = BTreeMap::new();
    for (id, pkg) in round2_packages {
        let bytes = identifier_to_bytes::<C>(&id);
        let pos = position_from_identifier_bytes(&bytes, round1_packages.keys().copied())?;
        out.insert(pos, pkg.serialize().map_err(map_err)?);
    }
    Ok(Round2Output {
        secret: secret_out.serialize().map_err(map_err)?,
        packages: out,
    })
}

/// Recovers the position a round-2 package is addressed to by matching its
/// serialized identifier against every candidate position's encoding.
/// `frost-core` identifiers have no inverse map back to our position
/// numbering, so we re-derive and compare rather than trust a side table.
fn position_from_identifier_bytes<C: Ciphersuite>(
    bytes: &[u8],
    candidates: impl Iterator<Item = u16>,
) -> Result<u16, FrostError> {
    for pos in candidates {
        if identifier_to_bytes::<C>(&identifier_for_position::<C>(pos)?) == bytes {
            return Ok(pos);
        }
    }
    Err(FrostError::Crypto(
        "round-2 package addressed to unknown party position".into(),
    ))
}

pub struct Round3Output {
    pub key_package: Vec<u8>,
    pub pubkey_package: Vec<u8>,
}

pub fn dkg_part3<C: Ciphersuite>(
    round2_secret: &[u8],
    round1_packages: &BTreeMap<u16, Vec<u8>>,
    /// Every partner's round-2 package addressed to us, keyed by sender position.
    round2_packages: &BTreeMap<u16, Vec<u8>>,
) -> Result<Round3Output, FrostError> {
    let secret = frost_core::keys::dkg::round2::SecretPackage::<C>::deserialize(round2_secret)
        .map_err(map_err)?;

    let mut r1 = BTreeMap::new();
    for (pos, bytes) in round1_packages {
        let id = identifier_for_position::<C>(*pos)?;
        r1.insert(
            id,
            frost_core::keys::dkg::round1::Package::<C>::deserialize(bytes).map_err(map_err)?,
        );
    }
    let mut r2 = BTreeMap::new();
    for (pos, bytes) in round2_packages {
        let id = identifier_for_position::<C>(*pos)?;
        r2.insert(
            id,
            frost_core::keys::dkg::round2::Package::<C>::deserialize(bytes).map_err(map_err)?,
        );
    }

    let (key_package, pubkey_package): (KeyPackage<C>, PublicKeyPackage<C>) =
        part3(&secret, &r1, &r2).map_err(map_err)?;

    Ok(Round3Output {
        key_package: key_package.serialize().map_err(map_err)?,
        pubkey_package: pubkey_package.serialize().map_err(map_err)?,
    })
}

pub fn identifier_bytes_for_position<C: Ciphersuite>(position: u16) -> Result<Vec<u8>, FrostError> {
    Ok(identifier_to_bytes::<C>(&identifier_for_position::<C>(position)?))
}

pub fn verify_identifier_bytes<C: Ciphersuite>(bytes: &[u8]) -> Result<(), FrostError> {
    identifier_from_bytes::<C>(bytes).map(|_| ())
}
