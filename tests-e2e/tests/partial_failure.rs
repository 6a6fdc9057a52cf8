//! Scenario E: with min_signers == the full party size, taking one node
//! down before the commitment phase must surface a `CommitmentGroupError`
//! naming exactly the node that failed, not a silent partial success.

mod common;

use frost_coordinator::signing::SignInput;
use frost_coordinator::CoordinatorContext;
use frost_types::{Curve, FrostError, HexBytes, SignatureId};

#[tokio::test]
async fn node_failure_surfaces_as_group_error() {
    let (party, nodes) = common::spawn_party(Curve::Secp256k1Tr, 3, 3, 3, 31200).await;
    let ctx = CoordinatorContext::new(common::coordinator_settings(party.clone()));

    let party_ids: Vec<_> = party.members.iter().map(|m| m.id.clone()).collect();
    let pubkey_package = frost_coordinator::dkg::run_dkg(&ctx, party_ids, 3, 3)
        .await
        .expect("dkg should succeed while all three nodes are healthy");

    nodes[2].handle.abort();

    let entries = vec![SignInput {
        signature_id: SignatureId::from("sig-1"),
        message: HexBytes(b"message".to_vec()),
        tweak_by: None,
    }];

    let err = frost_coordinator::signing::sign(&ctx, &pubkey_package, entries)
        .await
        .expect_err("signing must fail once a required node is unreachable");

    match err {
        FrostError::CommitmentGroupError(failures) => {
            assert_eq!(failures.len(), 1, "exactly the one downed node should be reported");
        }
        other => panic!("expected CommitmentGroupError, got {other:?}"),
    }
}
