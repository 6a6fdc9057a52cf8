//! Node-side HTTP surface (C9). One `poem_openapi::Object` DTO per
//! wire message, following the teacher's `dkg_api.rs` convention of
//! flattening maps into `Vec<Entry>` lists rather than JSON objects keyed
//! by dynamic strings, so the OpenAPI schema stays fully typed.

use std::collections::BTreeMap;
use std::sync::Arc;

use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use frost_types::model::{
    CommitmentEntry, DkgRound1Request, DkgRound1Response, DkgRound2Response, DkgRound3Response,
    SigningEntry,
};
use frost_types::{FrostError, HexBytes, NodeId, SignatureId};

use crate::state::AppState;
use crate::{dkg, signing};

pub struct Api {
    pub state: Arc<AppState>,
}

#[derive(Debug, Object)]
pub struct ErrorResponseDto {
    pub error: String,
}

fn err_dto(e: FrostError) -> ErrorResponseDto {
    ErrorResponseDto {
        error: e.to_string(),
    }
}

/// Caller-attributable errors (bad input, missing prerequisite state) get
/// 400; everything else — crypto failures, internal invariants — gets 500.
fn is_client_error(e: &FrostError) -> bool {
    matches!(
        e,
        FrostError::DkgNotFound
            | FrostError::KeyNotFound
            | FrostError::NonceNotFound
            | FrostError::Round1NotCompleted
            | FrostError::Round2NotCompleted
            | FrostError::PartnersRound1PackagesMissing
            | FrostError::PartnersTempPublicKeyMissing
            | FrostError::SignatureValidation { .. }
    )
}

#[derive(Debug, Object)]
pub struct DkgRound1RequestDto {
    pub dkg_id: String,
    pub max_signers: u16,
    pub min_signers: u16,
    pub party: Vec<String>,
}

#[derive(Debug, Object)]
pub struct DkgRound1ResponseDto {
    pub package: String,
    pub temp_public_key: String,
    pub signature: String,
}

#[derive(ApiResponse)]
pub enum DkgRound1Result {
    #[oai(status = 200)]
    Ok(Json<DkgRound1ResponseDto>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponseDto>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponseDto>),
}

fn dkg_round1_result(r: Result<DkgRound1Response, FrostError>) -> DkgRound1Result {
    match r {
        Ok(resp) => DkgRound1Result::Ok(Json(DkgRound1ResponseDto {
            package: hex::encode(&resp.package.0),
            temp_public_key: hex::encode(&resp.temp_public_key.0),
            signature: hex::encode(&resp.signature.0),
        })),
        Err(e) if is_client_error(&e) => DkgRound1Result::BadRequest(Json(err_dto(e))),
        Err(e) => DkgRound1Result::InternalError(Json(err_dto(e))),
    }
}

#[derive(Debug, Object)]
pub struct BroadcastEntryDto {
    pub node_id: String,
    pub package: String,
    pub temp_public_key: String,
    pub signature: String,
}

#[derive(Debug, Object)]
pub struct DkgRound2RequestDto {
    pub dkg_id: String,
    pub broadcasts: Vec<BroadcastEntryDto>,
}

#[derive(Debug, Object)]
pub struct EncryptedEntryDto {
    pub node_id: String,
    pub token: String,
}

#[derive(Debug, Object)]
pub struct DkgRound2ResponseDto {
    pub encrypted_package: Vec<EncryptedEntryDto>,
}

#[derive(ApiResponse)]
pub enum DkgRound2Result {
    #[oai(status = 200)]
    Ok(Json<DkgRound2ResponseDto>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponseDto>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponseDto>),
}

#[derive(Debug, Object)]
pub struct DkgRound3RequestDto {
    pub dkg_id: String,
    pub encrypted_packages: Vec<EncryptedEntryDto>,
}

#[derive(Debug, Object)]
pub struct DkgRound3ResponseDto {
    pub pubkey_package: String,
    pub signature: String,
}

#[derive(ApiResponse)]
pub enum DkgRound3Result {
    #[oai(status = 200)]
    Ok(Json<DkgRound3ResponseDto>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponseDto>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponseDto>),
}

#[derive(Debug, Object)]
pub struct CommitmentRequestDto {
    pub pubkey_package: String,
    /// Echoed back from the party config the caller already has; the node
    /// always signs with its own configured curve, never this field.
    pub curve: String,
    pub tweak_by: Option<String>,
}

#[derive(Debug, Object)]
pub struct CommitmentResponseDto {
    pub hiding: String,
    pub binding: String,
}

#[derive(ApiResponse)]
pub enum CommitmentResult {
    #[oai(status = 200)]
    Ok(Json<CommitmentResponseDto>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponseDto>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponseDto>),
}

#[derive(Debug, Object, Clone)]
pub struct CommitmentEntryDto {
    pub node_id: String,
    pub hiding: String,
    pub binding: String,
}

#[derive(Debug, Object, Clone)]
pub struct SigningEntryDto {
    pub signature_id: String,
    pub message: String,
    pub commitments: Vec<CommitmentEntryDto>,
    pub tweak_by: Option<String>,
}

#[derive(Debug, Object)]
pub struct SignRequestDto {
    pub pubkey_package: String,
    pub entries: Vec<SigningEntryDto>,
}

#[derive(Debug, Object)]
pub struct ShareEntryDto {
    pub signature_id: String,
    pub share: String,
}

#[derive(Debug, Object)]
pub struct SignResponseDto {
    pub shares: Vec<ShareEntryDto>,
}

#[derive(ApiResponse)]
pub enum SignResult {
    #[oai(status = 200)]
    Ok(Json<SignResponseDto>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponseDto>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponseDto>),
}

#[derive(Debug, Object)]
pub struct HealthResponse {
    pub node_id: String,
    pub curve: String,
    pub healthy: bool,
}

fn decode_hex(field: &str, s: &str) -> Result<HexBytes, FrostError> {
    hex::decode(s)
        .map(HexBytes)
        .map_err(|e| FrostError::Crypto(format!("invalid hex in {field}: {e}")))
}

#[OpenApi]
impl Api {
    /// Round 1: generate this node's ephemeral temp key and FROST DKG
    /// round-1 package, persist the session, sign the broadcast.
    #[oai(path = "/dkg/round1", method = "post")]
    async fn dkg_round1(&self, req: Json<DkgRound1RequestDto>) -> DkgRound1Result {
        let req = req.0;
        tracing::info!(dkg_id = %req.dkg_id, "dkg round1");
        let internal = DkgRound1Request {
            dkg_id: req.dkg_id.into(),
            curve: self.state.settings.curve,
            max_signers: req.max_signers,
            min_signers: req.min_signers,
            party: req.party.into_iter().map(NodeId).collect(),
        };
        dkg_round1_result(dkg::round1(&self.state, &internal))
    }

    /// Round 2: validate broadcast signatures, run `dkg_part2`, and return
    /// one joint-key-encrypted package per partner.
    #[oai(path = "/dkg/round2", method = "post")]
    async fn dkg_round2(&self, req: Json<DkgRound2RequestDto>) -> DkgRound2Result {
        let req = req.0;
        let mut broadcasts = BTreeMap::new();
        for b in req.broadcasts {
            let package = match decode_hex("package", &b.package) {
                Ok(v) => v,
                Err(e) => return DkgRound2Result::BadRequest(Json(err_dto(e))),
            };
            let temp_public_key = match decode_hex("temp_public_key", &b.temp_public_key) {
                Ok(v) => v,
                Err(e) => return DkgRound2Result::BadRequest(Json(err_dto(e))),
            };
            let signature = match decode_hex("signature", &b.signature) {
                Ok(v) => v,
                Err(e) => return DkgRound2Result::BadRequest(Json(err_dto(e))),
            };
            broadcasts.insert(
                NodeId(b.node_id),
                frost_types::model::DkgRound1Response {
                    package,
                    temp_public_key,
                    signature,
                },
            );
        }
        match dkg::round2(&self.state, &req.dkg_id, &broadcasts) {
            Ok(resp) => DkgRound2Result::Ok(Json(to_round2_dto(resp))),
            Err(e) if is_client_error(&e) => DkgRound2Result::BadRequest(Json(err_dto(e))),
            Err(e) => DkgRound2Result::InternalError(Json(err_dto(e))),
        }
    }

    /// Round 3: decrypt every partner's package and finalize the key.
    #[oai(path = "/dkg/round3", method = "post")]
    async fn dkg_round3(&self, req: Json<DkgRound3RequestDto>) -> DkgRound3Result {
        let req = req.0;
        let encrypted_packages: BTreeMap<NodeId, String> = req
            .encrypted_packages
            .into_iter()
            .map(|e| (NodeId(e.node_id), e.token))
            .collect();
        match dkg::round3(&self.state, &req.dkg_id, &encrypted_packages) {
            Ok(resp) => DkgRound3Result::Ok(Json(DkgRound3ResponseDto {
                pubkey_package: hex::encode(&resp.pubkey_package.0),
                signature: hex::encode(&resp.signature.0),
            })),
            Err(e) if is_client_error(&e) => DkgRound3Result::BadRequest(Json(err_dto(e))),
            Err(e) => DkgRound3Result::InternalError(Json(err_dto(e))),
        }
    }

    /// Produce a fresh signing-nonce commitment for a key package.
    #[oai(path = "/sign/commitment", method = "post")]
    async fn commitment(&self, req: Json<CommitmentRequestDto>) -> CommitmentResult {
        let req = req.0;
        let pubkey_package = match decode_hex("pubkey_package", &req.pubkey_package) {
            Ok(v) => v,
            Err(e) => return CommitmentResult::BadRequest(Json(err_dto(e))),
        };
        let tweak_by = match req.tweak_by.map(|t| decode_hex("tweak_by", &t)).transpose() {
            Ok(v) => v,
            Err(e) => return CommitmentResult::BadRequest(Json(err_dto(e))),
        };
        match signing::commitment(&self.state, &pubkey_package, tweak_by.as_ref()) {
            Ok(c) => CommitmentResult::Ok(Json(CommitmentResponseDto {
                hiding: hex::encode(&c.hiding.0),
                binding: hex::encode(&c.binding.0),
            })),
            Err(e) if is_client_error(&e) => CommitmentResult::BadRequest(Json(err_dto(e))),
            Err(e) => CommitmentResult::InternalError(Json(err_dto(e))),
        }
    }

    /// Produce signature shares for a batch of signing-id-keyed entries.
    #[oai(path = "/sign", method = "post")]
    async fn sign(&self, req: Json<SignRequestDto>) -> SignResult {
        let req = req.0;
        let pubkey_package = match decode_hex("pubkey_package", &req.pubkey_package) {
            Ok(v) => v,
            Err(e) => return SignResult::BadRequest(Json(err_dto(e))),
        };

        let mut shares = Vec::with_capacity(req.entries.len());
        for entry_dto in req.entries {
            let entry = match to_signing_entry(entry_dto.clone()) {
                Ok(e) => e,
                Err(e) => return SignResult::BadRequest(Json(err_dto(e))),
            };
            match signing::sign_entry(&self.state, &entry, &pubkey_package) {
                Ok(share) => shares.push(ShareEntryDto {
                    signature_id: entry_dto.signature_id,
                    share: hex::encode(&share.0),
                }),
                Err(e) if is_client_error(&e) => return SignResult::BadRequest(Json(err_dto(e))),
                Err(e) => return SignResult::InternalError(Json(err_dto(e))),
            }
        }
        SignResult::Ok(Json(SignResponseDto { shares }))
    }

    #[oai(path = "/health", method = "get")]
    async fn health(&self) -> Json<HealthResponse> {
        Json(HealthResponse {
            node_id: self.state.settings.id.0.clone(),
            curve: self.state.settings.curve.as_str().to_string(),
            healthy: true,
        })
    }
}

fn to_round2_dto(resp: DkgRound2Response) -> DkgRound2ResponseDto {
    DkgRound2ResponseDto {
        encrypted_package: resp
            .encrypted_package
            .into_iter()
            .map(|e| EncryptedEntryDto {
                node_id: e.node_id.0,
                token: e.token,
            })
            .collect(),
    }
}

fn to_signing_entry(dto: SigningEntryDto) -> Result<SigningEntry, FrostError> {
    let message = decode_hex("message", &dto.message)?;
    let tweak_by = dto.tweak_by.map(|t| decode_hex("tweak_by", &t)).transpose()?;
    let mut commitments = Vec::with_capacity(dto.commitments.len());
    for c in dto.commitments {
        commitments.push(CommitmentEntry {
            node_id: NodeId(c.node_id),
            hiding: decode_hex("hiding", &c.hiding)?,
            binding: decode_hex("binding", &c.binding)?,
        });
    }
    Ok(SigningEntry {
        signature_id: SignatureId(dto.signature_id),
        message,
        commitments,
        tweak_by,
    })
}

