//! Coordinator-driven signing aggregator (C8). Grounded on
//! `original_source/zexfrost/client/sa.py`'s `SA.sign`/`sign_with_tweak`,
//! generalized to a genuinely mixed-tweak `SignatureID`-keyed batch per
//! spec.md §4.7: weighted quorum selection (§4.8), commitment fan-out,
//! share collection, then coordinator-side aggregation and verification.

use std::collections::BTreeMap;

use futures::future::join_all;
use rand::thread_rng;

use frost_types::model::{Commitment, CommitmentEntry, CommitmentRequest, SignRequest, SignResponse, SigningEntry};
use frost_types::{FrostError, HexBytes, NodeId, SignatureId};

use crate::CoordinatorContext;

/// One pending signature inside a batch: the message to sign and an
/// optional per-entry Taproot-style tweak.
pub struct SignInput {
    pub signature_id: SignatureId,
    pub message: HexBytes,
    pub tweak_by: Option<HexBytes>,
}

/// Drives one signing batch to completion: quorum selection, commitment
/// phase, sign phase, then per-entry aggregation and verification.
pub async fn sign(
    ctx: &CoordinatorContext,
    pubkey_package: &HexBytes,
    entries: Vec<SignInput>,
) -> Result<BTreeMap<SignatureId, HexBytes>, FrostError> {
    let candidates: Vec<NodeId> = ctx.settings.party.members.iter().map(|m| m.id.clone()).collect();
    let min_signers = ctx.settings.party.min_signers as usize;
    let selected = select_quorum(ctx, &candidates, min_signers)?;

    let commitments = commitment_phase(ctx, &selected, pubkey_package, &entries).await?;
    let shares = sign_phase(ctx, &selected, pubkey_package, &entries, &commitments).await?;
    aggregate_and_verify(ctx, pubkey_package, &entries, &commitments, &shares)
}

/// Weighted-reservoir (A-Res) selection of `min_signers` nodes out of the
/// full party, per §4.8; the full party is used verbatim if it is exactly
/// threshold-sized.
fn select_quorum(ctx: &CoordinatorContext, candidates: &[NodeId], min_signers: usize) -> Result<Vec<NodeId>, FrostError> {
    if candidates.len() < min_signers {
        return Err(FrostError::Crypto("party is smaller than min_signers".into()));
    }
    if candidates.len() == min_signers {
        return Ok(candidates.to_vec());
    }
    let mut rng = thread_rng();
    Ok(ctx.client.weights.sample(candidates, min_signers, &mut rng))
}

fn member_of<'a>(ctx: &'a CoordinatorContext, id: &NodeId) -> Result<&'a frost_types::model::NodeRecord, FrostError> {
    ctx.settings
        .party
        .member(id)
        .ok_or_else(|| FrostError::Crypto(format!("unknown party member {id}")))
}

/// For every `SignatureID`, fan out a commitment request (carrying its own
/// `tweak_by`) to the selected quorum. A node's failure on one entry is
/// captured, not fatal by itself — the batch only fails once any entry's
/// successful replies drop below `min_signers` (`CommitmentGroupError`).
async fn commitment_phase(
    ctx: &CoordinatorContext,
    selected: &[NodeId],
    pubkey_package: &HexBytes,
    entries: &[SignInput],
) -> Result<BTreeMap<SignatureId, BTreeMap<NodeId, Commitment>>, FrostError> {
    let mut commitments: BTreeMap<SignatureId, BTreeMap<NodeId, Commitment>> =
        entries.iter().map(|e| (e.signature_id.clone(), BTreeMap::new())).collect();
    let mut failures = Vec::new();

    for entry in entries {
        let calls = selected.iter().map(|id| {
            let pubkey_package = pubkey_package.clone();
            let tweak_by = entry.tweak_by.clone();
            async move {
                let member = member_of(ctx, id)?;
                let req = CommitmentRequest {
                    pubkey_package,
                    curve: ctx.settings.party.curve,
                    tweak_by,
                };
                let commitment: Commitment = ctx
                    .client
                    .post(member, "/sign/commitment", ctx.settings.signing_timeout, &req)
                    .await?;
                Ok::<_, FrostError>((id.clone(), commitment))
            }
        });

        for result in join_all(calls).await {
            match result {
                Ok((node_id, commitment)) => {
                    commitments.get_mut(&entry.signature_id).expect("entry present").insert(node_id, commitment);
                }
                Err(e) => failures.push((failing_node(&e), e)),
            }
        }
    }

    let min_signers = ctx.settings.party.min_signers as usize;
    if commitments.values().any(|m| m.len() < min_signers) {
        return Err(FrostError::CommitmentGroupError(failures));
    }
    Ok(commitments)
}

/// Builds one `SignRequest` per selected node carrying every `SignatureID`'s
/// `{message, commitments, tweak_by}`, then fans out. Succeeds only if at
/// least `min_signers` nodes answer (`SignatureGroupError` otherwise).
async fn sign_phase(
    ctx: &CoordinatorContext,
    selected: &[NodeId],
    pubkey_package: &HexBytes,
    entries: &[SignInput],
    commitments: &BTreeMap<SignatureId, BTreeMap<NodeId, Commitment>>,
) -> Result<BTreeMap<NodeId, SignResponse>, FrostError> {
    let signing_entries: Vec<SigningEntry> = entries
        .iter()
        .map(|e| SigningEntry {
            signature_id: e.signature_id.clone(),
            message: e.message.clone(),
            commitments: commitments
                .get(&e.signature_id)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|(node_id, c)| CommitmentEntry {
                    node_id,
                    hiding: c.hiding,
                    binding: c.binding,
                })
                .collect(),
            tweak_by: e.tweak_by.clone(),
        })
        .collect();

    let calls = selected.iter().map(|id| {
        let req = SignRequest {
            pubkey_package: pubkey_package.clone(),
            entries: signing_entries.clone(),
        };
        async move {
            let member = member_of(ctx, id)?;
            let resp: SignResponse = ctx
                .client
                .post(member, "/sign", ctx.settings.signing_timeout, &req)
                .await?;
            Ok::<_, FrostError>((id.clone(), resp))
        }
    });

    let mut shares = BTreeMap::new();
    let mut failures = Vec::new();
    for result in join_all(calls).await {
        match result {
            Ok((node_id, resp)) => {
                shares.insert(node_id, resp);
            }
            Err(e) => failures.push((failing_node(&e), e)),
        }
    }

    let min_signers = ctx.settings.party.min_signers as usize;
    if shares.len() < min_signers {
        return Err(FrostError::SignatureGroupError(failures));
    }
    Ok(shares)
}

fn failing_node(e: &FrostError) -> NodeId {
    match e {
        FrostError::NodeTimeout { node } | FrostError::Transport { node, .. } => node.clone(),
        _ => NodeId("unknown".to_string()),
    }
}

/// Per entry: builds the position-keyed commitment/share maps `frost-crypto`
/// expects, aggregates, then verifies against the (possibly tweaked)
/// `pubkey_package` before accepting the result.
fn aggregate_and_verify(
    ctx: &CoordinatorContext,
    pubkey_package: &HexBytes,
    entries: &[SignInput],
    commitments: &BTreeMap<SignatureId, BTreeMap<NodeId, Commitment>>,
    shares: &BTreeMap<NodeId, SignResponse>,
) -> Result<BTreeMap<SignatureId, HexBytes>, FrostError> {
    let curve = ctx.settings.party.curve;
    let mut signatures = BTreeMap::new();

    for entry in entries {
        let entry_commitments = commitments
            .get(&entry.signature_id)
            .ok_or_else(|| FrostError::Crypto(format!("no commitments collected for {}", entry.signature_id)))?;

        let mut commitments_by_position = BTreeMap::new();
        for (node_id, c) in entry_commitments {
            let pos = ctx
                .settings
                .party
                .position(node_id)
                .ok_or_else(|| FrostError::Crypto(format!("unknown party member {node_id}")))?;
            commitments_by_position.insert(pos, (c.hiding.0.clone(), c.binding.0.clone()));
        }

        let mut shares_by_position = BTreeMap::new();
        for (node_id, resp) in shares {
            let share = resp
                .shares
                .iter()
                .find(|s| s.signature_id == entry.signature_id)
                .ok_or_else(|| FrostError::Crypto(format!("node {node_id} returned no share for {}", entry.signature_id)))?;
            let pos = ctx
                .settings
                .party
                .position(node_id)
                .ok_or_else(|| FrostError::Crypto(format!("unknown party member {node_id}")))?;
            shares_by_position.insert(pos, share.share.0.clone());
        }

        let tweak_by = entry.tweak_by.as_ref().map(|t| t.0.as_slice());
        let signature = frost_crypto::aggregate(
            curve,
            &entry.message.0,
            &commitments_by_position,
            &shares_by_position,
            &pubkey_package.0,
            tweak_by,
        )?;

        if !frost_crypto::verify(curve, &entry.message.0, &signature, &pubkey_package.0, tweak_by)? {
            return Err(FrostError::Crypto(format!(
                "aggregated signature failed verification for {}",
                entry.signature_id
            )));
        }

        signatures.insert(entry.signature_id.clone(), HexBytes(signature));
    }

    Ok(signatures)
}
