mod common;

use actix_web::{http::StatusCode, test, web, App};
use common::{cast, harness, member_address, roster, Harness, ProverMode};
use council_attest::app::dtos::council_dto::SetupCouncilDto;
use council_attest::app::init::initialize;
use serde_json::{json, Value};

macro_rules! coordinator_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($harness.service.clone()))
                .configure(initialize),
        )
        .await
    };
}

macro_rules! call_json {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, body)
    }};
}

fn setup_request(size: usize) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/council/setup")
        .set_json(&SetupCouncilDto {
            members: roster(size),
        })
}

fn vote_request(bundle_id: u64, proposal_id: u64, member: usize, bit: u8) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/vote")
        .set_json(&cast(bundle_id, proposal_id, member, bit))
}

#[actix_web::test]
async fn council_vote_attest_publish() {
    let h: Harness = harness(3, false);
    let app = coordinator_app!(h);

    let (status, council) = call_json!(app, setup_request(5));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(council["memberCount"], 5);
    assert!(council["root"].as_str().unwrap().starts_with("0x"));

    let ballots = [(0, 1), (1, 1), (2, 0)];
    for (member, bit) in ballots {
        let (status, outcome) = call_json!(app, vote_request(1, 5, member, bit));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["success"], true);
        assert_eq!(outcome["quorumReached"], false);
        assert!(outcome.get("proof").is_none());
    }
    assert_eq!(h.prover.calls(), 0);

    let (status, outcome) = call_json!(app, vote_request(1, 5, 3, 1));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["quorumReached"], true);
    assert_eq!(outcome["voteCount"], json!({ "approvals": 3, "rejections": 1 }));
    assert_eq!(outcome["proof"][0], "3");
    assert!(outcome.get("txHash").is_none());
    assert_eq!(h.prover.calls(), 1);

    let (status, tally) = call_json!(app, test::TestRequest::get().uri("/votes/1/5"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        tally,
        json!({
            "approvals": 3,
            "rejections": 1,
            "total": 4,
            "quorum": 3,
            "quorumReached": true
        })
    );

    let (_, voted) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/votes/1/5/{}", member_address(2)))
    );
    assert_eq!(voted["hasVoted"], true);
    let (_, voted) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/votes/1/5/{}", member_address(4)))
    );
    assert_eq!(voted["hasVoted"], false);

    let (_, verified) = call_json!(app, test::TestRequest::get().uri("/proof/status/1/5"));
    assert_eq!(verified["verified"], false);

    let (status, generated) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/proof/generate")
            .set_json(&json!({ "bundleId": 1, "proposalId": 5 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["approvalCount"], 3);
    assert_eq!(generated["quorumThreshold"], 3);
    assert!(generated["formattedProof"]["b"].is_array());

    let publish = json!({
        "bundleId": 1,
        "proposalId": 5,
        "proof": generated["proof"],
        "publicSignals": generated["publicSignals"],
    });
    let (status, published) = call_json!(
        app,
        test::TestRequest::post().uri("/proof/publish").set_json(&publish)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["success"], true);
    assert_eq!(published["alreadyPublished"], false);
    assert!(published["txHash"].as_str().unwrap().starts_with("0x"));

    let (_, verified) = call_json!(app, test::TestRequest::get().uri("/proof/status/1/5"));
    assert_eq!(verified["verified"], true);

    let (status, again) = call_json!(
        app,
        test::TestRequest::post().uri("/proof/publish").set_json(&publish)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["alreadyPublished"], true);
    assert_eq!(h.verifier.submissions(), 1);

    let mut outsider = cast(1, 5, 0, 1);
    outsider.voter_address = "0x00000000000000000000000000000000000000ff".to_string();
    let (status, body) = call_json!(
        app,
        test::TestRequest::post().uri("/vote").set_json(&outsider)
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not a council member");
}

#[actix_web::test]
async fn empty_roster_is_rejected() {
    let h = harness(3, false);
    let app = coordinator_app!(h);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/council/setup")
            .set_json(&json!({ "members": [] }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid roster");

    let (_, council) = call_json!(app, test::TestRequest::get().uri("/council"));
    assert_eq!(council["root"], Value::Null);
    assert_eq!(council["memberCount"], 0);
}

#[actix_web::test]
async fn second_vote_from_a_member_is_rejected() {
    let h = harness(3, false);
    let app = coordinator_app!(h);
    call_json!(app, setup_request(3));

    let (status, _) = call_json!(app, vote_request(2, 1, 0, 1));
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call_json!(app, vote_request(2, 1, 0, 0));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Duplicate vote");

    let (_, tally) = call_json!(app, test::TestRequest::get().uri("/votes/2/1"));
    assert_eq!(tally["approvals"], 1);
    assert_eq!(tally["rejections"], 0);
}

#[actix_web::test]
async fn malformed_votes_are_rejected() {
    let h = harness(3, false);
    let app = coordinator_app!(h);
    call_json!(app, setup_request(3));

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/vote")
            .set_json(&json!({ "bundleId": 1, "proposalId": 1, "vote": 1 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input");

    let (status, body) = call_json!(app, vote_request(1, 1, 0, 2));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input");

    let mut bad_nullifier = cast(1, 1, 1, 1);
    bad_nullifier.nullifier = "not-a-number".to_string();
    let (status, _) = call_json!(
        app,
        test::TestRequest::post().uri("/vote").set_json(&bad_nullifier)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, tally) = call_json!(app, test::TestRequest::get().uri("/votes/1/1"));
    assert_eq!(tally["total"], 0);
}

#[actix_web::test]
async fn proof_generation_needs_votes_and_quorum() {
    let h = harness(3, false);
    let app = coordinator_app!(h);
    call_json!(app, setup_request(4));

    let generate = || {
        test::TestRequest::post()
            .uri("/proof/generate")
            .set_json(&json!({ "bundleId": 3, "proposalId": 3 }))
    };

    let (status, body) = call_json!(app, generate());
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No votes found");

    call_json!(app, vote_request(3, 3, 0, 1));
    call_json!(app, vote_request(3, 3, 1, 1));
    call_json!(app, vote_request(3, 3, 2, 0));
    let (status, body) = call_json!(app, generate());
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quorum not met");
    assert_eq!(h.prover.calls(), 0);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post().uri("/proof/publish").set_json(&json!({
            "bundleId": 3,
            "proposalId": 3,
            "proof": common::sample_proof(),
            "publicSignals": ["2"],
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quorum not met");
    assert_eq!(h.verifier.submissions(), 0);
}

#[actix_web::test]
async fn prover_failure_keeps_the_vote() {
    let h = harness(1, false);
    let app = coordinator_app!(h);
    call_json!(app, setup_request(2));
    h.prover.set_mode(ProverMode::TimeOut);

    let (status, outcome) = call_json!(app, vote_request(4, 4, 0, 1));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["quorumReached"], true);
    assert!(outcome.get("proof").is_none());
    assert!(outcome["attestationError"].as_str().unwrap().contains("timed out"));

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/proof/generate")
            .set_json(&json!({ "bundleId": 4, "proposalId": 4 }))
    );
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["message"], "Proof generation timed out");

    h.prover.set_mode(ProverMode::Succeed);
    let (status, _) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/proof/generate")
            .set_json(&json!({ "bundleId": 4, "proposalId": 4 }))
    );
    assert_eq!(status, StatusCode::OK);

    let (_, tally) = call_json!(app, test::TestRequest::get().uri("/votes/4/4"));
    assert_eq!(tally["approvals"], 1);
}

#[actix_web::test]
async fn auto_publish_returns_the_transaction() {
    let h = harness(2, true);
    let app = coordinator_app!(h);
    call_json!(app, setup_request(3));

    let (_, first) = call_json!(app, vote_request(7, 1, 0, 1));
    assert!(first.get("txHash").is_none());

    let (status, second) = call_json!(app, vote_request(7, 1, 2, 1));
    assert_eq!(status, StatusCode::OK);
    assert!(second["txHash"].as_str().unwrap().starts_with("0x"));
    assert!(second.get("attestationError").is_none());
    assert!(h.verifier.is_verified(7, 1));

    // past quorum: no second proof, no second transaction
    let (_, third) = call_json!(app, vote_request(7, 1, 1, 1));
    assert_eq!(third["quorumReached"], true);
    assert!(third.get("proof").is_none());
    assert_eq!(h.prover.calls(), 1);
    assert_eq!(h.verifier.submissions(), 1);
}

#[actix_web::test]
async fn health_and_pending_bundles() {
    let h = harness(2, false);
    let app = coordinator_app!(h);

    let (status, health) = call_json!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["councilRoot"], Value::Null);
    assert_eq!(health["chainPublisher"], true);

    call_json!(app, setup_request(3));
    call_json!(app, vote_request(1, 1, 0, 1));
    call_json!(app, vote_request(1, 2, 0, 1));
    call_json!(app, vote_request(1, 2, 1, 1));

    let (_, pending) = call_json!(app, test::TestRequest::get().uri("/bundles/pending"));
    assert_eq!(pending["quorum"], 2);
    assert_eq!(pending["pending"], json!([{ "bundleId": 1, "proposalId": 1 }]));

    let (_, health) = call_json!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(health["memberCount"], 3);
    assert_eq!(health["pendingBundles"], 1);
    assert_eq!(health["quorum"], 2);
}

#[actix_web::test]
async fn membership_proof_and_recount() {
    let h = harness(3, false);
    let app = coordinator_app!(h);
    let (_, council) = call_json!(app, setup_request(5));

    let (status, proof) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/council/proof/{}", member_address(3)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(proof["root"], council["root"]);
    assert_eq!(proof["leafIndex"], 3);
    assert_eq!(proof["pathElements"].as_array().unwrap().len(), 3);
    assert_eq!(proof["pathIndices"], json!([1, 1, 0]));

    let (status, _) = call_json!(
        app,
        test::TestRequest::get().uri("/council/proof/0x00000000000000000000000000000000000000ff")
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    call_json!(app, vote_request(6, 6, 0, 1));
    call_json!(app, vote_request(6, 6, 1, 0));
    let (status, tally) = call_json!(app, test::TestRequest::post().uri("/votes/6/6/recount"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["approvals"], 1);
    assert_eq!(tally["rejections"], 1);
    assert_eq!(tally["total"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_attest_once() {
    let h = harness(3, true);
    h.service
        .setup_council(SetupCouncilDto { members: roster(8) })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for member in 0..8 {
        let service = h.service.clone();
        handles.push(tokio::spawn(async move {
            service.submit_vote(cast(5, 9, member, 1)).await
        }));
    }
    let mut with_proof = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.attestation_error.is_none());
        if outcome.proof.is_some() {
            with_proof += 1;
        }
    }

    assert_eq!(with_proof, 1);
    assert_eq!(h.prover.calls(), 1);
    assert_eq!(h.verifier.submissions(), 1);
    assert!(h.verifier.is_verified(5, 9));
    let status = h.service.vote_status(5, 9).await.unwrap();
    assert_eq!(status.approvals, 8);
}

#[actix_web::test]
async fn proof_generation_without_council_or_votes_is_not_found() {
    let h = harness(3, false);
    let app = coordinator_app!(h);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/proof/generate")
            .set_json(&json!({ "bundleId": 1, "proposalId": 1 }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No votes found");
}

#[actix_web::test]
async fn ids_beyond_int64_are_rejected() {
    let h = harness(1, false);
    let app = coordinator_app!(h);
    call_json!(app, setup_request(2));

    let (status, body) = call_json!(app, vote_request(u64::MAX, 1, 0, 1));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input");

    let (status, _) = call_json!(
        app,
        test::TestRequest::get().uri(&format!("/votes/1/{}", u64::MAX))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let largest = i64::MAX as u64;
    let (status, _) = call_json!(app, vote_request(largest, largest, 0, 1));
    assert_eq!(status, StatusCode::OK);
    assert!(!h.service.ledger().has_voted(u64::MAX, 1, &member_address(0)).await.unwrap());
    assert_eq!(h.prover.calls(), 1);
}
