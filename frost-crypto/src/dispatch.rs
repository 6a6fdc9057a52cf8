use std::collections::BTreeMap;

use frost_ed25519::Ed25519Sha512;
use frost_secp256k1::Secp256K1Sha256;
use frost_secp256k1_tr::Secp256K1Sha256TR;
use frost_types::{Curve, FrostError};

use crate::{dkg, signing, tweak};

macro_rules! dispatch_curve {
    ($curve:expr, $C:ident, $body:block) => {
        match $curve {
            Curve::Secp256k1Tr | Curve::Secp256k1Evm => {
                type $C = Secp256K1Sha256TR;
                $body
            }
            Curve::Secp256k1 => {
                type $C = Secp256K1Sha256;
                $body
            }
            Curve::Ed25519 => {
                type $C = Ed25519Sha512;
                $body
            }
        }
    };
}

pub fn dkg_part1(
    curve: Curve,
    position: u16,
    max_signers: u16,
    min_signers: u16,
    rng: &mut (impl rand::RngCore + rand::CryptoRng),
) -> Result<dkg::Round1Output, FrostError> {
    dispatch_curve!(curve, C, {
        dkg::dkg_part1::<C>(position, max_signers, min_signers, rng)
    })
}

pub fn dkg_part2(
    curve: Curve,
    round1_secret: &[u8],
    round1_packages: &BTreeMap<u16, Vec<u8>>,
) -> Result<dkg::Round2Output, FrostError> {
    dispatch_curve!(curve, C, { dkg::dkg_part2::<C>(round1_secret, round1_packages) })
}

pub fn dkg_part3(
    curve: Curve,
    round2_secret: &[u8],
    round1_packages: &BTreeMap<u16, Vec<u8>>,
    round2_packages: &BTreeMap<u16, Vec<u8>>,
) -> Result<dkg::Round3Output, FrostError> {
    dispatch_curve!(curve, C, {
        dkg::dkg_part3::<C>(round2_secret, round1_packages, round2_packages)
    })
}

pub fn identifier_bytes_for_position(curve: Curve, position: u16) -> Result<Vec<u8>, FrostError> {
    dispatch_curve!(curve, C, { dkg::identifier_bytes_for_position::<C>(position) })
}

pub fn round1_commit(
    curve: Curve,
    key_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
    rng: &mut (impl rand::RngCore + rand::CryptoRng),
) -> Result<signing::CommitResult, FrostError> {
    let key_package_bytes = maybe_tweak_key_package(curve, key_package_bytes, tweak_by)?;
    dispatch_curve!(curve, C, { signing::round1_commit::<C>(&key_package_bytes, rng) })
}

fn maybe_tweak_key_package(
    curve: Curve,
    key_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
) -> Result<Vec<u8>, FrostError> {
    if curve.is_tweakable() {
        tweak::tweak_key_package(key_package_bytes, tweak_by)
    } else {
        Ok(key_package_bytes.to_vec())
    }
}

fn maybe_tweak_pubkey_package(
    curve: Curve,
    pubkey_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
) -> Result<Vec<u8>, FrostError> {
    if curve.is_tweakable() {
        tweak::tweak_pubkey_package(pubkey_package_bytes, tweak_by)
    } else {
        Ok(pubkey_package_bytes.to_vec())
    }
}

pub fn round2_sign(
    curve: Curve,
    message: &[u8],
    commitments: &BTreeMap<u16, (Vec<u8>, Vec<u8>)>,
    nonces_bytes: &[u8],
    key_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
) -> Result<Vec<u8>, FrostError> {
    let key_package_bytes = maybe_tweak_key_package(curve, key_package_bytes, tweak_by)?;
    dispatch_curve!(curve, C, {
        signing::round2_sign::<C>(message, commitments, nonces_bytes, &key_package_bytes)
    })
}

pub fn aggregate(
    curve: Curve,
    message: &[u8],
    commitments: &BTreeMap<u16, (Vec<u8>, Vec<u8>)>,
    shares: &BTreeMap<u16, Vec<u8>>,
    pubkey_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
) -> Result<Vec<u8>, FrostError> {
    let pubkey_package_bytes = maybe_tweak_pubkey_package(curve, pubkey_package_bytes, tweak_by)?;
    dispatch_curve!(curve, C, {
        signing::aggregate::<C>(message, commitments, shares, &pubkey_package_bytes)
    })
}

pub fn verify(
    curve: Curve,
    message: &[u8],
    signature_bytes: &[u8],
    pubkey_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
) -> Result<bool, FrostError> {
    let pubkey_package_bytes = maybe_tweak_pubkey_package(curve, pubkey_package_bytes, tweak_by)?;
    dispatch_curve!(curve, C, { signing::verify::<C>(message, signature_bytes, &pubkey_package_bytes) })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs a full 2-of-2 DKG over `curve` and returns each position's
    /// key_package plus the shared pubkey_package.
    fn dkg_two_of_two(curve: Curve) -> (BTreeMap<u16, Vec<u8>>, Vec<u8>) {
        let mut rng = rand::rngs::OsRng;
        let r1 = BTreeMap::from([
            (1u16, dkg_part1(curve, 1, 2, 2, &mut rng).unwrap()),
            (2u16, dkg_part1(curve, 2, 2, 2, &mut rng).unwrap()),
        ]);

        let r1_packages = BTreeMap::from([(1u16, r1[&1].package.clone()), (2u16, r1[&2].package.clone())]);
        let r2_for_1 = dkg_part2(curve, &r1[&1].secret, &BTreeMap::from([(2u16, r1_packages[&2].clone())])).unwrap();
        let r2_for_2 = dkg_part2(curve, &r1[&2].secret, &BTreeMap::from([(1u16, r1_packages[&1].clone())])).unwrap();

        let out1 = dkg_part3(
            curve,
            &r2_for_1.secret,
            &r1_packages,
            &BTreeMap::from([(2u16, r2_for_1.packages[&2].clone())]),
        )
        .unwrap();
        let out2 = dkg_part3(
            curve,
            &r2_for_2.secret,
            &r1_packages,
            &BTreeMap::from([(1u16, r2_for_2.packages[&1].clone())]),
        )
        .unwrap();

        assert_eq!(out1.pubkey_package, out2.pubkey_package, "both parties must agree on the group key");
        let key_packages = BTreeMap::from([(1u16, out1.key_package), (2u16, out2.key_package)]);
        (key_packages, out1.pubkey_package)
    }

    /// Scenario C: a signature produced under a tweak must verify when the
    /// same tweak is supplied, and must fail when the caller omits it —
    /// tweak application has to be symmetric between signing and verifying.
    #[test]
    fn omitting_the_tweak_at_verify_breaks_an_otherwise_valid_signature() {
        let curve = Curve::Secp256k1Tr;
        let (key_packages, pubkey_package) = dkg_two_of_two(curve);
        let message = b"message";
        let tweak_by: &[u8] = b"tweak-value";

        let mut rng = rand::rngs::OsRng;
        let c1 = round1_commit(curve, &key_packages[&1], Some(tweak_by), &mut rng).unwrap();
        let c2 = round1_commit(curve, &key_packages[&2], Some(tweak_by), &mut rng).unwrap();
        let commitments = BTreeMap::from([
            (1u16, (c1.hiding.clone(), c1.binding.clone())),
            (2u16, (c2.hiding.clone(), c2.binding.clone())),
        ]);

        let s1 = round2_sign(curve, message, &commitments, &c1.nonces, &key_packages[&1], Some(tweak_by)).unwrap();
        let s2 = round2_sign(curve, message, &commitments, &c2.nonces, &key_packages[&2], Some(tweak_by)).unwrap();
        let shares = BTreeMap::from([(1u16, s1), (2u16, s2)]);

        let signature = aggregate(curve, message, &commitments, &shares, &pubkey_package, Some(tweak_by)).unwrap();

        assert!(verify(curve, message, &signature, &pubkey_package, Some(tweak_by)).unwrap());
        assert!(
            !verify(curve, message, &signature, &pubkey_package, None).unwrap(),
            "verification must fail once the tweak is dropped"
        );
    }
}
