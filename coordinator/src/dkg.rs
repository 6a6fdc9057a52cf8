//! Coordinator-driven DKG orchestration (C7). Grounded on
//! `original_source/zexfrost/client/dkg.py`: round 1 is a concurrent
//! fan-out to every party member; round 2's per-node broadcast set is
//! "every other node's round-1 response"; round 3 transposes round 2's
//! per-node encrypted maps so each node receives exactly the ciphertexts
//! addressed to it. Any round's failure terminates the session — there is
//! no automatic retry, matching spec.md §4.6.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use frost_types::model::{
    BroadcastEntry, DkgRound1Request, DkgRound1Response, DkgRound2Request, DkgRound2Response,
    DkgRound3Request, DkgRound3Response, EncryptedEntry,
};
use frost_types::{DkgId, FrostError, HexBytes, NodeId};

use crate::CoordinatorContext;

#[derive(Serialize, Deserialize)]
struct Round1SignedPayload {
    package: HexBytes,
    temp_public_key: HexBytes,
}

#[derive(Serialize, Deserialize)]
struct Round3SignedPayload {
    pubkey_package: HexBytes,
}

/// Drives one full DKG session across `party`, returning the common
/// `pubkey_package` once every node agrees on the resulting verifying key.
pub async fn run_dkg(
    ctx: &CoordinatorContext,
    party: Vec<NodeId>,
    max_signers: u16,
    min_signers: u16,
) -> Result<HexBytes, FrostError> {
    let dkg_id = DkgId(Uuid::new_v4().to_string());
    tracing::info!(%dkg_id, n = max_signers, t = min_signers, "starting dkg session");

    let broadcasts = round1(ctx, &dkg_id, &party, max_signers, min_signers).await?;
    let round2_by_node = round2(ctx, &dkg_id, &party, &broadcasts).await?;
    let results = round3(ctx, &dkg_id, &party, &round2_by_node).await?;

    let pubkey_package = check_consistent_verifying_keys(&results)?;
    tracing::info!(%dkg_id, verifying_key = %hex::encode(&pubkey_package.0), "dkg session complete");
    Ok(pubkey_package)
}

/// Every node must agree on the resulting group verifying key; a single
/// mismatch means the party's key shares are incompatible and the session
/// must not be trusted.
fn check_consistent_verifying_keys(results: &BTreeMap<NodeId, DkgRound3Response>) -> Result<HexBytes, FrostError> {
    let mut values = results.values();
    let first = values.next().ok_or_else(|| FrostError::DkgResultIncompatibility {
        detail: "no round3 responses".into(),
    })?;
    if values.any(|r| r.pubkey_package != first.pubkey_package) {
        return Err(FrostError::DkgResultIncompatibility {
            detail: "nodes reported different verifying keys".into(),
        });
    }
    Ok(first.pubkey_package.clone())
}

async fn round1(
    ctx: &CoordinatorContext,
    dkg_id: &DkgId,
    party: &[NodeId],
    max_signers: u16,
    min_signers: u16,
) -> Result<BTreeMap<NodeId, DkgRound1Response>, FrostError> {
    let calls = party.iter().map(|id| {
        let req = DkgRound1Request {
            dkg_id: dkg_id.clone(),
            curve: ctx.settings.party.curve,
            max_signers,
            min_signers,
            party: party.to_vec(),
        };
        async move {
            let member = member_of(ctx, id)?;
            let resp: DkgRound1Response = ctx
                .client
                .post(member, "/dkg/round1", ctx.settings.dkg_timeout, &req)
                .await?;
            Ok::<_, FrostError>((id.clone(), resp))
        }
    });

    let broadcasts: BTreeMap<NodeId, DkgRound1Response> = try_join_all(calls).await?.into_iter().collect();
    validate_signatures(ctx, broadcasts.iter().map(|(id, r)| {
        (
            id,
            Round1SignedPayload {
                package: r.package.clone(),
                temp_public_key: r.temp_public_key.clone(),
            },
            &r.signature,
        )
    }))?;
    Ok(broadcasts)
}

async fn round2(
    ctx: &CoordinatorContext,
    dkg_id: &DkgId,
    party: &[NodeId],
    broadcasts: &BTreeMap<NodeId, DkgRound1Response>,
) -> Result<BTreeMap<NodeId, DkgRound2Response>, FrostError> {
    let calls = party.iter().map(|id| {
        let others: Vec<BroadcastEntry> = broadcasts
            .iter()
            .filter(|(peer, _)| *peer != id)
            .map(|(peer, r)| BroadcastEntry {
                node_id: peer.clone(),
                package: r.package.clone(),
                temp_public_key: r.temp_public_key.clone(),
                signature: r.signature.clone(),
            })
            .collect();
        let req = DkgRound2Request {
            dkg_id: dkg_id.clone(),
            broadcasts: others,
        };
        async move {
            let member = member_of(ctx, id)?;
            let resp: DkgRound2Response = ctx
                .client
                .post(member, "/dkg/round2", ctx.settings.dkg_timeout, &req)
                .await?;
            Ok::<_, FrostError>((id.clone(), resp))
        }
    });

    Ok(try_join_all(calls).await?.into_iter().collect())
}

/// Transposes round 2's per-node encrypted maps: node X's round-3 request
/// carries exactly the ciphertexts every peer Y addressed to X.
async fn round3(
    ctx: &CoordinatorContext,
    dkg_id: &DkgId,
    party: &[NodeId],
    round2_by_node: &BTreeMap<NodeId, DkgRound2Response>,
) -> Result<BTreeMap<NodeId, DkgRound3Response>, FrostError> {
    let calls = party.iter().map(|id| {
        let encrypted_packages: Vec<EncryptedEntry> = round2_by_node
            .iter()
            .filter(|(peer, _)| *peer != id)
            .filter_map(|(peer, resp)| {
                resp.encrypted_package
                    .iter()
                    .find(|e| &e.node_id == id)
                    .map(|e| EncryptedEntry {
                        node_id: peer.clone(),
                        token: e.token.clone(),
                    })
            })
            .collect();
        let req = DkgRound3Request {
            dkg_id: dkg_id.clone(),
            encrypted_packages,
        };
        async move {
            let member = member_of(ctx, id)?;
            let resp: DkgRound3Response = ctx
                .client
                .post(member, "/dkg/round3", ctx.settings.dkg_timeout, &req)
                .await?;
            Ok::<_, FrostError>((id.clone(), resp))
        }
    });

    let results: BTreeMap<NodeId, DkgRound3Response> = try_join_all(calls).await?.into_iter().collect();
    validate_signatures(
        ctx,
        results.iter().map(|(id, r)| {
            (
                id,
                Round3SignedPayload {
                    pubkey_package: r.pubkey_package.clone(),
                },
                &r.signature,
            )
        }),
    )?;
    Ok(results)
}

fn member_of<'a>(ctx: &'a CoordinatorContext, id: &NodeId) -> Result<&'a frost_types::model::NodeRecord, FrostError> {
    ctx.settings
        .party
        .member(id)
        .ok_or_else(|| FrostError::Crypto(format!("unknown party member {id}")))
}

/// Verifies every response's long-term-key signature, matching
/// `DKG.validate_broadcast_data`; a single failure names the offending node.
fn validate_signatures<'a, P, I>(ctx: &CoordinatorContext, entries: I) -> Result<(), FrostError>
where
    P: serde::Serialize,
    I: Iterator<Item = (&'a NodeId, P, &'a HexBytes)>,
{
    let mut offending = Vec::new();
    for (node_id, payload, signature) in entries {
        let member = member_of(ctx, node_id)?;
        let ok = frost_crypto::identity::verify_canonical(
            ctx.settings.party.curve,
            member.public_key.as_slice(),
            &payload,
            signature.as_slice(),
        )?;
        if !ok {
            offending.push(node_id.clone());
        }
    }
    if offending.is_empty() {
        Ok(())
    } else {
        Err(FrostError::SignatureValidation { offending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_result(pubkey_package: &[u8]) -> DkgRound3Response {
        DkgRound3Response {
            pubkey_package: HexBytes(pubkey_package.to_vec()),
            signature: HexBytes(vec![]),
        }
    }

    #[test]
    fn agreeing_nodes_yield_the_shared_key() {
        let results = BTreeMap::from([
            (NodeId::from("a"), fake_result(b"key")),
            (NodeId::from("b"), fake_result(b"key")),
        ]);
        assert_eq!(check_consistent_verifying_keys(&results).unwrap(), HexBytes(b"key".to_vec()));
    }

    /// Property 7: a node reporting a different verifying key must fail
    /// the session instead of silently picking one result.
    #[test]
    fn mismatched_key_is_rejected() {
        let results = BTreeMap::from([
            (NodeId::from("a"), fake_result(b"key")),
            (NodeId::from("b"), fake_result(b"mutated")),
        ]);
        match check_consistent_verifying_keys(&results) {
            Err(FrostError::DkgResultIncompatibility { .. }) => {}
            other => panic!("expected DkgResultIncompatibility, got {other:?}"),
        }
    }
}
