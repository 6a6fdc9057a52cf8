use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::hexbytes::HexBytes;
use crate::ids::{DkgId, NodeId, SignatureId};

/// Static party membership entry, loaded from the coordinator's config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub base_url: String,
    pub public_key: HexBytes,
}

/// Party-wide configuration shared by every DKG/signing session on a curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyConfig {
    pub curve: Curve,
    pub members: Vec<NodeRecord>,
    pub max_signers: u16,
    pub min_signers: u16,
}

impl PartyConfig {
    pub fn other_members<'a>(&'a self, self_id: &'a NodeId) -> impl Iterator<Item = &'a NodeRecord> {
        self.members.iter().filter(move |m| &m.id != self_id)
    }

    pub fn member(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.members.iter().find(|m| &m.id == id)
    }

    /// 1-based position of `id` in the fixed member ordering; node and
    /// coordinator both derive FROST identifiers from this same ordering.
    pub fn position(&self, id: &NodeId) -> Option<u16> {
        self.members.iter().position(|m| &m.id == id).map(|i| i as u16 + 1)
    }
}

// ---- DKG wire messages -----------------------------------------------
//
// Maps are flattened into `Vec<Entry>` lists (rather than JSON objects
// keyed by dynamic strings) so that the node's `poem-openapi` schema and
// the coordinator's outgoing request bodies describe the exact same shape
// with no separate translation layer.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkgRound1Request {
    pub dkg_id: DkgId,
    pub curve: Curve,
    pub max_signers: u16,
    pub min_signers: u16,
    pub party: Vec<NodeId>,
}

/// Signed over `{package, temp_public_key}` with the node's long-term
/// identity key, via canonical-JSON signing (see `frost-crypto::identity`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkgRound1Response {
    pub package: HexBytes,
    pub temp_public_key: HexBytes,
    pub signature: HexBytes,
}

/// One partner's round-1 broadcast, addressed by sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEntry {
    pub node_id: NodeId,
    pub package: HexBytes,
    pub temp_public_key: HexBytes,
    pub signature: HexBytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkgRound2Request {
    pub dkg_id: DkgId,
    /// Every other node's round-1 broadcast, for signature verification
    /// and round-2 package generation.
    pub broadcasts: Vec<BroadcastEntry>,
}

/// One recipient's Fernet-encrypted round-2 package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedEntry {
    pub node_id: NodeId,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkgRound2Response {
    pub encrypted_package: Vec<EncryptedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkgRound3Request {
    pub dkg_id: DkgId,
    /// Ciphertexts addressed to this node, transposed by the coordinator
    /// from every peer's `DkgRound2Response`.
    pub encrypted_packages: Vec<EncryptedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkgRound3Response {
    pub pubkey_package: HexBytes,
    pub signature: HexBytes,
}

// ---- Signing wire messages --------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commitment {
    pub hiding: HexBytes,
    pub binding: HexBytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentRequest {
    pub pubkey_package: HexBytes,
    pub curve: Curve,
    pub tweak_by: Option<HexBytes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentResponse {
    pub commitment: Commitment,
}

/// One party's commitment for a signing entry, addressed by node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentEntry {
    pub node_id: NodeId,
    pub hiding: HexBytes,
    pub binding: HexBytes,
}

/// One entry of a signing batch: the message to sign, every participating
/// node's commitment, and an optional per-entry tweak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningEntry {
    pub signature_id: SignatureId,
    pub message: HexBytes,
    pub commitments: Vec<CommitmentEntry>,
    pub tweak_by: Option<HexBytes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    pub pubkey_package: HexBytes,
    pub entries: Vec<SigningEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareEntry {
    pub signature_id: SignatureId,
    pub share: HexBytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignResponse {
    pub shares: Vec<ShareEntry>,
}
