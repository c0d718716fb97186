//! Answer endpoint integration tests

use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

mod common;
use common::{
    access_token_for, build_app_state, create_test_admin, create_test_db, create_test_user,
    do_request,
};

use quorum::models::notification;
use quorum::models::prelude::*;
use quorum::state::AppState;

async fn seed_question(state: AppState, token: &str, title: &str) -> serde_json::Value {
    let (status, body) = do_request(
        state,
        "POST",
        "/questions",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "description": "<p>body</p>",
            "tags": ["misc"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn post_answer(
    state: AppState,
    token: &str,
    question_id: i64,
    body: &str,
) -> (StatusCode, serde_json::Value) {
    do_request(
        state,
        "POST",
        "/answers",
        Some(token),
        Some(serde_json::json!({ "question_id": question_id, "body": body })),
    )
    .await
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_answer_returns_201_and_notifies_question_author() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let q = seed_question(build_app_state(db.clone()), &alice_token, "Help").await;
    let qid = q["id"].as_i64().unwrap();

    let (status, body) = post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>try this</p>").await;

    assert_eq!(status, StatusCode::CREATED, "Body: {}", body);
    assert_eq!(body["question_id"], qid);
    assert_eq!(body["author"]["username"], "bob");
    assert_eq!(body["accepted"], false);
    assert_eq!(body["votes"], 0);

    let rows = Notification::find()
        .filter(notification::Column::UserId.eq(alice.id))
        .filter(notification::Column::Kind.eq("answer"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].message.contains("Help"));
}

#[tokio::test]
async fn test_answering_own_question_does_not_notify() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    let q = seed_question(build_app_state(db.clone()), &token, "Self").await;
    post_answer(
        build_app_state(db.clone()),
        &token,
        q["id"].as_i64().unwrap(),
        "<p>never mind, solved it</p>",
    )
    .await;

    let rows = Notification::find()
        .filter(notification::Column::UserId.eq(alice.id))
        .all(&db)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_create_answer_for_missing_question_returns_404() {
    let db = create_test_db().await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db);
    let token = access_token_for(&state, &bob);

    let (status, _) = post_answer(state, &token, 999, "<p>into the void</p>").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_answer_rejects_empty_body_and_missing_auth() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    let q = seed_question(build_app_state(db.clone()), &token, "Empty").await;
    let qid = q["id"].as_i64().unwrap();

    let (status, _) = post_answer(build_app_state(db.clone()), &token, qid, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = do_request(
        build_app_state(db),
        "POST",
        "/answers",
        None,
        Some(serde_json::json!({ "question_id": qid, "body": "<p>x</p>" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_answers_for_question_is_public() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let q = seed_question(build_app_state(db.clone()), &alice_token, "Listed").await;
    let qid = q["id"].as_i64().unwrap();
    post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>one</p>").await;
    post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>two</p>").await;

    let uri = format!("/answers/question/{}", qid);
    let (status, body) = do_request(build_app_state(db), "GET", &uri, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_answers_for_missing_question_returns_404() {
    let db = create_test_db().await;
    let state = build_app_state(db);

    let (status, _) = do_request(state, "GET", "/answers/question/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Update & Delete
// ============================================================================

#[tokio::test]
async fn test_update_answer_is_author_only() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let root = create_test_admin(&db, "root", "root@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);
    let root_token = access_token_for(&state, &root);

    let q = seed_question(build_app_state(db.clone()), &alice_token, "Editable").await;
    let (_, a) = post_answer(
        build_app_state(db.clone()),
        &bob_token,
        q["id"].as_i64().unwrap(),
        "<p>v1</p>",
    )
    .await;
    let uri = format!("/answers/{}", a["id"].as_i64().unwrap());
    let payload = serde_json::json!({ "body": "<p>v2</p>" });

    // Even admins may not edit someone else's answer
    let (status, _) = do_request(
        build_app_state(db.clone()),
        "PUT",
        &uri,
        Some(&root_token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = do_request(
        build_app_state(db),
        "PUT",
        &uri,
        Some(&bob_token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], "<p>v2</p>");
}

#[tokio::test]
async fn test_delete_answer_author_or_admin() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let root = create_test_admin(&db, "root", "root@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);
    let root_token = access_token_for(&state, &root);

    let q = seed_question(build_app_state(db.clone()), &alice_token, "Deletable").await;
    let qid = q["id"].as_i64().unwrap();
    let (_, a1) = post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>one</p>").await;
    let (_, a2) = post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>two</p>").await;

    // Question author is not the answer author: forbidden
    let uri1 = format!("/answers/{}", a1["id"].as_i64().unwrap());
    let (status, _) = do_request(build_app_state(db.clone()), "DELETE", &uri1, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Author may delete
    let (status, _) = do_request(build_app_state(db.clone()), "DELETE", &uri1, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Admin may delete
    let uri2 = format!("/answers/{}", a2["id"].as_i64().unwrap());
    let (status, _) = do_request(build_app_state(db.clone()), "DELETE", &uri2, Some(&root_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let remaining = Answer::find()
        .filter(quorum::models::answer::Column::QuestionId.eq(qid))
        .all(&db)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_deleting_accepted_answer_clears_the_reference() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let q = seed_question(build_app_state(db.clone()), &alice_token, "Accepted").await;
    let qid = q["id"].as_i64().unwrap();
    let (_, a) = post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>sol</p>").await;
    let aid = a["id"].as_i64().unwrap();

    let accept_uri = format!("/questions/{}/accept", qid);
    do_request(
        build_app_state(db.clone()),
        "PUT",
        &accept_uri,
        Some(&alice_token),
        Some(serde_json::json!({ "answer_id": aid })),
    )
    .await;

    let uri = format!("/answers/{}", aid);
    do_request(build_app_state(db.clone()), "DELETE", &uri, Some(&bob_token), None).await;

    let fresh = Question::find_by_id(qid).one(&db).await.unwrap().unwrap();
    assert_eq!(fresh.accepted_answer_id, None);
}

// ============================================================================
// Voting
// ============================================================================

#[tokio::test]
async fn test_answer_vote_flow() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let q = seed_question(build_app_state(db.clone()), &bob_token, "Votable").await;
    let (_, a) = post_answer(
        build_app_state(db.clone()),
        &bob_token,
        q["id"].as_i64().unwrap(),
        "<p>mine</p>",
    )
    .await;
    let aid = a["id"].as_i64().unwrap();

    let up = format!("/answers/{}/upvote", aid);
    let down = format!("/answers/{}/downvote", aid);

    let (status, body) = do_request(build_app_state(db.clone()), "POST", &up, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"], 1);

    let (status, _) = do_request(build_app_state(db.clone()), "POST", &up, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = do_request(build_app_state(db), "POST", &down, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"], -1);
}
