use serde::{Deserialize, Serialize};

/// Named curve/ciphersuite a party, DKG session or signature belongs to.
///
/// `Secp256k1Tr` and `Secp256k1Evm` share the same tweakable ciphersuite;
/// they differ only in how callers hash messages and encode public keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Secp256k1Tr,
    Secp256k1Evm,
    Secp256k1,
    Ed25519,
}

impl Curve {
    pub fn as_str(&self) -> &'static str {
        match self {
            Curve::Secp256k1Tr => "secp256k1_tr",
            Curve::Secp256k1Evm => "secp256k1_evm",
            Curve::Secp256k1 => "secp256k1",
            Curve::Ed25519 => "ed25519",
        }
    }

    /// Whether this curve's key packages support BIP-341-style tweaking.
    pub fn is_tweakable(&self) -> bool {
        matches!(self, Curve::Secp256k1Tr | Curve::Secp256k1Evm)
    }
}

impl std::str::FromStr for Curve {
    type Err = crate::error::FrostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secp256k1_tr" => Ok(Curve::Secp256k1Tr),
            "secp256k1_evm" => Ok(Curve::Secp256k1Evm),
            "secp256k1" => Ok(Curve::Secp256k1),
            "ed25519" => Ok(Curve::Ed25519),
            other => Err(crate::error::FrostError::Crypto(format!(
                "unknown curve: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
