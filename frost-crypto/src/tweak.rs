//! BIP-341 (Taproot) key tweaking, only meaningful on the tweakable
//! ciphersuite (`secp256k1_tr` / `secp256k1_evm`). Plain curves never call
//! into this module; dispatch decides based on `Curve::is_tweakable`.

use frost_secp256k1_tr::keys::{KeyPackage, PublicKeyPackage, Tweak};
use frost_secp256k1_tr::Secp256K1Sha256TR;
use frost_types::FrostError;

fn map_err<E: std::fmt::Display>(e: E) -> FrostError {
    FrostError::Crypto(e.to_string())
}

pub fn tweak_key_package(key_package_bytes: &[u8], tweak_by: Option<&[u8]>) -> Result<Vec<u8>, FrostError> {
    let key_package = KeyPackage::<Secp256K1Sha256TR>::deserialize(key_package_bytes).map_err(map_err)?;
    let tweaked = key_package.tweak(tweak_by);
    tweaked.serialize().map_err(map_err)
}

pub fn tweak_pubkey_package(
    pubkey_package_bytes: &[u8],
    tweak_by: Option<&[u8]>,
) -> Result<Vec<u8>, FrostError> {
    let pubkey_package =
        PublicKeyPackage::<Secp256K1Sha256TR>::deserialize(pubkey_package_bytes).map_err(map_err)?;
    let tweaked = pubkey_package.tweak(tweak_by);
    tweaked.serialize().map_err(map_err)
}
