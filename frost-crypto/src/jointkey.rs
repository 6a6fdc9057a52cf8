//! Joint-key codec (C4): ECDH-derived symmetric encryption for the
//! pairwise round-2 DKG packages, bit-compatible with the Python system's
//! `cryptography.fernet.Fernet` framing (`zexfrost.utils.encrypt_with_joint_key`
//! / `decrypt_with_joint_key`).
//!
//! Every DKG session generates one ephemeral temp keypair per node; the
//! shared secret between node A's temp key and node B's temp public key
//! equals the shared secret between B's temp key and A's temp public key,
//! so each pairwise channel derives the same Fernet key on both ends.

use fernet::Fernet;
use hkdf::Hkdf;
use k256::ecdh::diffie_hellman;
use k256::{PublicKey, SecretKey};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use frost_types::FrostError;

/// Ephemeral per-DKG-session keypair. Zeroized on drop — it must not
/// outlive round 3, after which the joint-key channel is no longer needed.
pub struct TempKeyPair {
    secret: Zeroizing<SecretKey>,
    public: PublicKey,
}

impl TempKeyPair {
    pub fn generate(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let secret = SecretKey::random(rng);
        let public = secret.public_key();
        Self {
            secret: Zeroizing::new(secret),
            public,
        }
    }

    pub fn from_bytes(secret_bytes: &[u8]) -> Result<Self, FrostError> {
        let secret = SecretKey::from_slice(secret_bytes)
            .map_err(|e| FrostError::Crypto(format!("bad temp key: {e}")))?;
        let public = secret.public_key();
        Ok(Self {
            secret: Zeroizing::new(secret),
            public,
        })
    }

    pub fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.secret.to_bytes().to_vec())
    }

    pub fn public_bytes(&self) -> Vec<u8> {
        self.public.to_sec1_bytes().to_vec()
    }
}

fn derive_fernet_key(
    own_secret: &SecretKey,
    peer_public_bytes: &[u8],
) -> Result<[u8; 32], FrostError> {
    let peer_public = PublicKey::from_sec1_bytes(peer_public_bytes)
        .map_err(|e| FrostError::Crypto(format!("bad peer temp public key: {e}")))?;
    let shared = diffie_hellman(own_secret.to_nonzero_scalar(), peer_public.as_affine());
    let hk = Hkdf::<Sha256>::new(None, shared.raw_secret_bytes().as_slice());
    let mut key = [0u8; 32];
    hk.expand(&[], &mut key)
        .map_err(|e| FrostError::Crypto(format!("HKDF expand failed: {e}")))?;
    Ok(key)
}

/// Fernet requires a URL-safe-base64, 32-byte key; `derive_fernet_key`'s
/// raw HKDF output must go through that encoding before use.
fn fernet_for(own_secret: &SecretKey, peer_public_bytes: &[u8]) -> Result<Fernet, FrostError> {
    use base64_url_safe::encode_b64;
    let key_bytes = derive_fernet_key(own_secret, peer_public_bytes)?;
    let encoded = encode_b64(&key_bytes);
    Fernet::new(&encoded).ok_or_else(|| FrostError::Crypto("invalid derived fernet key".into()))
}

mod base64_url_safe {
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine as _;

    pub fn encode_b64(bytes: &[u8]) -> String {
        URL_SAFE.encode(bytes)
    }
}

pub fn encrypt_with_joint_key(
    plaintext: &[u8],
    own_temp_secret: &TempKeyPair,
    peer_temp_public_bytes: &[u8],
) -> Result<String, FrostError> {
    let fernet = fernet_for(&own_temp_secret.secret, peer_temp_public_bytes)?;
    Ok(fernet.encrypt(plaintext))
}

pub fn decrypt_with_joint_key(
    token: &str,
    own_temp_secret: &TempKeyPair,
    peer_temp_public_bytes: &[u8],
) -> Result<Vec<u8>, FrostError> {
    let fernet = fernet_for(&own_temp_secret.secret, peer_temp_public_bytes)?;
    fernet
        .decrypt(token)
        .map_err(|e| FrostError::Crypto(format!("joint-key decryption failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdh_is_symmetric_across_two_temp_keypairs() {
        let mut rng = rand::rngs::OsRng;
        let a = TempKeyPair::generate(&mut rng);
        let b = TempKeyPair::generate(&mut rng);

        let plaintext = b"round-2 package payload";
        let token = encrypt_with_joint_key(plaintext, &a, &b.public_bytes()).unwrap();
        let decrypted = decrypt_with_joint_key(&token, &b, &a.public_bytes()).unwrap();
        assert_eq!(decrypted, plaintext);
    }
}
