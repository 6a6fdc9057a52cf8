//! Coordinator-side HTTP surface (C9, coordinator side): triggers a DKG
//! session or a signing batch across the party, and exposes an aggregate
//! health check. Endpoint/DTO shapes mirror the teacher's
//! `frost-aggregator/src/api.rs` (`/api/sign`, `/health`), generalized to
//! the `SignatureID`-keyed batch spec.md's signing aggregator requires.

use std::sync::Arc;

use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use frost_types::{FrostError, HexBytes, NodeId, SignatureId};

use crate::signing::SignInput;
use crate::CoordinatorContext;

pub struct Api {
    pub ctx: Arc<CoordinatorContext>,
}

#[derive(Debug, Object)]
pub struct ErrorResponseDto {
    pub error: String,
}

fn err_dto(e: FrostError) -> ErrorResponseDto {
    ErrorResponseDto { error: e.to_string() }
}

fn decode_hex(field: &str, s: &str) -> Result<HexBytes, FrostError> {
    hex::decode(s)
        .map(HexBytes)
        .map_err(|e| FrostError::Crypto(format!("invalid hex in {field}: {e}")))
}

#[derive(Debug, Object)]
pub struct DkgRequestDto {
    pub party: Vec<String>,
    pub max_signers: u16,
    pub min_signers: u16,
}

#[derive(Debug, Object)]
pub struct DkgResponseDto {
    pub pubkey_package: String,
}

#[derive(ApiResponse)]
pub enum DkgResult {
    #[oai(status = 200)]
    Ok(Json<DkgResponseDto>),
    #[oai(status = 500)]
    InternalError(Json<ErrorResponseDto>),
}

#[derive(Debug, Object)]
pub struct SignEntryDto {
    pub signature_id: String,
    pub message: String,
    pub tweak_by: Option<String>,
}

#[derive(Debug, Object)]
pub struct SignRequestDto {
    pub pubkey_package: String,
    pub entries: Vec<SignEntryDto>,
}

#[derive(Debug, Object)]
pub struct SignatureEntryDto {
    pub signature_id: String,
    pub signature: String,
}

#[derive(Debug, Object)]
pub struct SignResponseDto {
    pub signatures: Vec<SignatureEntryDto>,
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
pub struct NodeHealthDto {
    pub node_id: String,
    pub healthy: bool,
    pub error: Option<String>,
}

#[derive(Debug, Object)]
pub struct HealthResponseDto {
    pub status: String,
    pub nodes: Vec<NodeHealthDto>,
}

#[OpenApi]
impl Api {
    /// Drives a full DKG session (C7) across the requested party.
    #[oai(path = "/api/dkg", method = "post")]
    async fn dkg(&self, req: Json<DkgRequestDto>) -> DkgResult {
        let req = req.0;
        let party: Vec<NodeId> = req.party.into_iter().map(NodeId).collect();
        match crate::dkg::run_dkg(&self.ctx, party, req.max_signers, req.min_signers).await {
            Ok(pubkey_package) => DkgResult::Ok(Json(DkgResponseDto {
                pubkey_package: hex::encode(&pubkey_package.0),
            })),
            Err(e) => DkgResult::InternalError(Json(err_dto(e))),
        }
    }

    /// Drives a signing batch (C8): weighted quorum selection, commitment
    /// fan-out, share collection, aggregation and verification.
    #[oai(path = "/api/sign", method = "post")]
    async fn sign(&self, req: Json<SignRequestDto>) -> SignResult {
        let req = req.0;
        let pubkey_package = match decode_hex("pubkey_package", &req.pubkey_package) {
            Ok(v) => v,
            Err(e) => return SignResult::BadRequest(Json(err_dto(e))),
        };

        let mut entries = Vec::with_capacity(req.entries.len());
        for e in req.entries {
            let message = match decode_hex("message", &e.message) {
                Ok(v) => v,
                Err(err) => return SignResult::BadRequest(Json(err_dto(err))),
            };
            let tweak_by = match e.tweak_by.map(|t| decode_hex("tweak_by", &t)).transpose() {
                Ok(v) => v,
                Err(err) => return SignResult::BadRequest(Json(err_dto(err))),
            };
            entries.push(SignInput {
                signature_id: SignatureId(e.signature_id),
                message,
                tweak_by,
            });
        }

        match crate::signing::sign(&self.ctx, &pubkey_package, entries).await {
            Ok(signatures) => SignResult::Ok(Json(SignResponseDto {
                signatures: signatures
                    .into_iter()
                    .map(|(signature_id, sig)| SignatureEntryDto {
                        signature_id: signature_id.0,
                        signature: hex::encode(&sig.0),
                    })
                    .collect(),
            })),
            Err(e) => SignResult::InternalError(Json(err_dto(e))),
        }
    }

    /// Aggregate health of every party member, as seen by this coordinator.
    #[oai(path = "/health", method = "get")]
    async fn health(&self) -> Json<HealthResponseDto> {
        let nodes = crate::health::check_all(&self.ctx).await;
        let healthy_count = nodes.iter().filter(|n| n.healthy).count();
        let status = if healthy_count == nodes.len() {
            "ok".to_string()
        } else {
            format!("degraded: {healthy_count} of {} nodes healthy", nodes.len())
        };
        Json(HealthResponseDto {
            status,
            nodes: nodes
                .into_iter()
                .map(|n| NodeHealthDto {
                    node_id: n.node_id.0,
                    healthy: n.healthy,
                    error: n.error,
                })
                .collect(),
        })
    }
}
