//! Long-term node identity: canonical-JSON signing over DKG broadcasts.
//!
//! Mirrors `zexfrost.utils.single_sign_data`/`single_verify_data`: the value
//! is serialized to JSON with sorted keys, then signed/verified with the
//! node's long-term identity key (distinct from the ephemeral per-DKG temp
//! key used for the joint-key codec).

use ed25519_dalek::{Signer as _, Verifier as _};
use frost_types::{Curve, FrostError};
use k256::ecdsa::signature::{Signer as _, Verifier as _};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::Serialize;

pub enum IdentityKey {
    Secp256k1(SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

impl IdentityKey {
    pub fn load(curve: Curve, private_key_bytes: &[u8]) -> Result<Self, FrostError> {
        match curve {
            Curve::Secp256k1Tr | Curve::Secp256k1Evm | Curve::Secp256k1 => {
                let key = SigningKey::from_slice(private_key_bytes)
                    .map_err(|e| FrostError::Crypto(format!("bad identity key: {e}")))?;
                Ok(IdentityKey::Secp256k1(key))
            }
            Curve::Ed25519 => {
                let bytes: [u8; 32] = private_key_bytes
                    .try_into()
                    .map_err(|_| FrostError::Crypto("ed25519 identity key must be 32 bytes".into()))?;
                Ok(IdentityKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&bytes)))
            }
        }
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            IdentityKey::Secp256k1(key) => {
                VerifyingKey::from(key).to_encoded_point(true).as_bytes().to_vec()
            }
            IdentityKey::Ed25519(key) => key.verifying_key().to_bytes().to_vec(),
        }
    }

    pub fn sign_canonical(&self, value: &impl Serialize) -> Result<Vec<u8>, FrostError> {
        let payload = canonical_json(value)?;
        Ok(match self {
            IdentityKey::Secp256k1(key) => {
                let sig: EcdsaSignature = key.sign(&payload);
                sig.to_der().as_bytes().to_vec()
            }
            IdentityKey::Ed25519(key) => key.sign(&payload).to_bytes().to_vec(),
        })
    }
}

pub fn verify_canonical(
    curve: Curve,
    public_key_bytes: &[u8],
    value: &impl Serialize,
    signature_bytes: &[u8],
) -> Result<bool, FrostError> {
    let payload = canonical_json(value)?;
    match curve {
        Curve::Secp256k1Tr | Curve::Secp256k1Evm | Curve::Secp256k1 => {
            let verifying_key = VerifyingKey::from_sec1_bytes(public_key_bytes)
                .map_err(|e| FrostError::Crypto(format!("bad identity public key: {e}")))?;
            let sig = EcdsaSignature::from_der(signature_bytes)
                .map_err(|e| FrostError::Crypto(format!("bad signature encoding: {e}")))?;
            Ok(verifying_key.verify(&payload, &sig).is_ok())
        }
        Curve::Ed25519 => {
            let bytes: [u8; 32] = public_key_bytes
                .try_into()
                .map_err(|_| FrostError::Crypto("ed25519 public key must be 32 bytes".into()))?;
            let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                .map_err(|e| FrostError::Crypto(format!("bad ed25519 public key: {e}")))?;
            let sig_bytes: [u8; 64] = signature_bytes
                .try_into()
                .map_err(|_| FrostError::Crypto("ed25519 signature must be 64 bytes".into()))?;
            let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
            Ok(verifying_key.verify(&payload, &sig).is_ok())
        }
    }
}

/// `serde_json`'s default (non `preserve_order`) `Map` is `BTreeMap`-backed,
/// so `to_vec` already yields sorted-key JSON at every nesting level —
/// the same canonicalization `json.dumps(..., sort_keys=True)` performs.
fn canonical_json(value: &impl Serialize) -> Result<Vec<u8>, FrostError> {
    serde_json::to_vec(value).map_err(|e| FrostError::Serialization(e.to_string()))
}
