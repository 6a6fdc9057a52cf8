use crate::ids::NodeId;
use thiserror::Error;

/// Closed error taxonomy shared by node and coordinator.
///
/// Each named-resource variant maps 1:1 to a `zexfrost.exceptions` class in
/// the Python system this protocol was distilled from; `Crypto` and
/// `Serialization` are catch-alls for ciphersuite/library failures that
/// don't have a named counterpart there.
#[derive(Debug, Error)]
pub enum FrostError {
    #[error("DKG session not found")]
    DkgNotFound,

    #[error("key package not found")]
    KeyNotFound,

    #[error("nonce record not found")]
    NonceNotFound,

    #[error("round 1 has not completed for this session")]
    Round1NotCompleted,

    #[error("round 2 has not completed for this session")]
    Round2NotCompleted,

    #[error("partners' round 1 packages are missing")]
    PartnersRound1PackagesMissing,

    #[error("partners' temporary public keys are missing")]
    PartnersTempPublicKeyMissing,

    #[error("signature validation failed for nodes: {offending:?}")]
    SignatureValidation { offending: Vec<NodeId> },

    #[error("DKG result incompatible across nodes: {detail}")]
    DkgResultIncompatibility { detail: String },

    #[error("node timed out: {node}")]
    NodeTimeout { node: NodeId },

    #[error("transport error talking to {node}: {detail}")]
    Transport { node: NodeId, detail: String },

    #[error("commitment round failed on {} node(s)", .0.len())]
    CommitmentGroupError(Vec<(NodeId, FrostError)>),

    #[error("signing round failed on {} node(s)", .0.len())]
    SignatureGroupError(Vec<(NodeId, FrostError)>),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, FrostError>;
