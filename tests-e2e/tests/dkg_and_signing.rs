//! Scenario A / properties 1 and 6: a full three-node DKG followed by a
//! tweaked signature that verifies against the resulting pubkey_package.

mod common;

use frost_coordinator::signing::SignInput;
use frost_coordinator::CoordinatorContext;
use frost_types::{Curve, HexBytes, SignatureId};

#[tokio::test]
async fn dkg_round_trip_then_tweaked_signing() {
    let (party, _nodes) = common::spawn_party(Curve::Secp256k1Tr, 3, 3, 2, 31100).await;
    let ctx = CoordinatorContext::new(common::coordinator_settings(party.clone()));

    let party_ids: Vec<_> = party.members.iter().map(|m| m.id.clone()).collect();
    let pubkey_package = frost_coordinator::dkg::run_dkg(&ctx, party_ids, 3, 2)
        .await
        .expect("dkg should succeed across three healthy nodes");

    let message = HexBytes(b"message".to_vec());
    let tweak_by = HexBytes(hex::decode("6d657373616765").unwrap());
    assert_eq!(tweak_by, message, "fixture tweak_by must equal the message bytes");

    let entries = vec![SignInput {
        signature_id: SignatureId::from("sig-1"),
        message: message.clone(),
        tweak_by: Some(tweak_by.clone()),
    }];

    let signatures = frost_coordinator::signing::sign(&ctx, &pubkey_package, entries)
        .await
        .expect("signing should succeed across a quorum of healthy nodes");

    let signature = signatures.get(&SignatureId::from("sig-1")).expect("signature present");
    let verified = frost_crypto::verify(
        Curve::Secp256k1Tr,
        &message.0,
        &signature.0,
        &pubkey_package.0,
        Some(tweak_by.as_slice()),
    )
    .unwrap();
    assert!(verified, "aggregated signature must verify against the tweaked pubkey_package");
}
