//! Question endpoint integration tests
//!
//! CRUD, listing filters/sorts, accept flow, voting, and flagging.

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

async fn post_question(
    state: AppState,
    token: &str,
    title: &str,
    tags: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    do_request(
        state,
        "POST",
        "/questions",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "description": format!("<p>{}</p>", title),
            "tags": tags
        })),
    )
    .await
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
async fn test_create_question_returns_201() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db);
    let token = access_token_for(&state, &alice);

    let (status, body) =
        post_question(state, &token, "Why?", serde_json::json!(["js"])).await;

    assert_eq!(status, StatusCode::CREATED, "Body: {}", body);
    assert_eq!(body["title"], "Why?");
    assert_eq!(body["tags"], serde_json::json!(["js"]));
    assert_eq!(body["votes"], 0);
    assert_eq!(body["answer_count"], 0);
    assert_eq!(body["author"]["username"], "alice");
}

#[tokio::test]
async fn test_create_question_requires_auth() {
    let db = create_test_db().await;
    let state = build_app_state(db);

    let (status, _) = do_request(
        state,
        "POST",
        "/questions",
        None,
        Some(serde_json::json!({"title": "t", "description": "d", "tags": ["a"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_question_normalizes_tags() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db);
    let token = access_token_for(&state, &alice);

    let (_, body) = post_question(
        state,
        &token,
        "Tags",
        serde_json::json!(["Rust", "rust", " Async "]),
    )
    .await;

    // Tags come back lowercased, deduplicated, alphabetical
    assert_eq!(body["tags"], serde_json::json!(["async", "rust"]));
}

#[tokio::test]
async fn test_create_question_rejects_missing_title_and_empty_tags() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    let (status, _) = post_question(state, &token, "", serde_json::json!(["a"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let state = build_app_state(db);
    let (status, _) = post_question(state, &token, "t", serde_json::json!([])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_question_rejects_more_than_five_tags() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db);
    let token = access_token_for(&state, &alice);

    let (status, _) = post_question(
        state,
        &token,
        "Too many",
        serde_json::json!(["a", "b", "c", "d", "e", "f"]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_questions_is_public_and_newest_first() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    post_question(build_app_state(db.clone()), &token, "First", serde_json::json!(["a"])).await;
    post_question(build_app_state(db.clone()), &token, "Second", serde_json::json!(["b"])).await;

    let (status, body) = do_request(build_app_state(db), "GET", "/questions", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    // Ties on created_at may occur in fast tests; both orders of equal
    // timestamps are acceptable, but both titles must be present
    let titles: Vec<&str> = list.iter().map(|q| q["title"].as_str().unwrap()).collect();
    assert!(titles.contains(&"First") && titles.contains(&"Second"));
}

#[tokio::test]
async fn test_list_questions_filters_by_tag() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    post_question(build_app_state(db.clone()), &token, "Rust one", serde_json::json!(["rust"])).await;
    post_question(build_app_state(db.clone()), &token, "JS one", serde_json::json!(["js"])).await;

    let (_, body) = do_request(build_app_state(db), "GET", "/questions?tag=rust", None, None).await;

    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Rust one");
}

#[tokio::test]
async fn test_list_questions_search_matches_title_description_and_tags() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    post_question(build_app_state(db.clone()), &token, "Borrow checker woes", serde_json::json!(["rust"])).await;
    post_question(build_app_state(db.clone()), &token, "Other", serde_json::json!(["cooking"])).await;

    // Case-insensitive title match
    let (_, body) = do_request(
        build_app_state(db.clone()),
        "GET",
        "/questions?search=BORROW",
        None,
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Tag match through search
    let (_, body) = do_request(
        build_app_state(db),
        "GET",
        "/questions?search=cook",
        None,
        None,
    )
    .await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Other");
}

#[tokio::test]
async fn test_list_questions_sorted_by_votes() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, low) = post_question(build_app_state(db.clone()), &alice_token, "Low", serde_json::json!(["a"])).await;
    let (_, high) = post_question(build_app_state(db.clone()), &alice_token, "High", serde_json::json!(["a"])).await;
    let _ = low;

    let uri = format!("/questions/{}/upvote", high["id"].as_i64().unwrap());
    do_request(build_app_state(db.clone()), "POST", &uri, Some(&bob_token), None).await;

    let (_, body) = do_request(
        build_app_state(db),
        "GET",
        "/questions?sort=votes",
        None,
        None,
    )
    .await;
    let list = body.as_array().unwrap();
    assert_eq!(list[0]["title"], "High");
}

#[tokio::test]
async fn test_list_unanswered_excludes_answered_questions() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, answered) = post_question(build_app_state(db.clone()), &alice_token, "Answered", serde_json::json!(["a"])).await;
    post_question(build_app_state(db.clone()), &alice_token, "Open", serde_json::json!(["a"])).await;

    post_answer(
        build_app_state(db.clone()),
        &bob_token,
        answered["id"].as_i64().unwrap(),
        "<p>sure</p>",
    )
    .await;

    let (_, body) = do_request(
        build_app_state(db),
        "GET",
        "/questions?sort=unanswered",
        None,
        None,
    )
    .await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Open");
}

#[tokio::test]
async fn test_popular_tags_counts_and_orders() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let token = access_token_for(&state, &alice);

    post_question(build_app_state(db.clone()), &token, "One", serde_json::json!(["rust", "axum"])).await;
    post_question(build_app_state(db.clone()), &token, "Two", serde_json::json!(["rust"])).await;

    let (status, body) = do_request(
        build_app_state(db),
        "GET",
        "/questions/tags/popular",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list[0]["tag"], "rust");
    assert_eq!(list[0]["count"], 2);
    assert_eq!(list[1]["tag"], "axum");
    assert_eq!(list[1]["count"], 1);
}

// ============================================================================
// Detail & views
// ============================================================================

#[tokio::test]
async fn test_get_question_increments_views_and_includes_answers() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Detail", serde_json::json!(["a"])).await;
    let id = q["id"].as_i64().unwrap();
    post_answer(build_app_state(db.clone()), &bob_token, id, "<p>reply</p>").await;

    let uri = format!("/questions/{}", id);
    let (status, body) = do_request(build_app_state(db.clone()), "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views"], 1);
    assert_eq!(body["answers"].as_array().unwrap().len(), 1);
    assert_eq!(body["answers"][0]["author"]["username"], "bob");

    let (_, body) = do_request(build_app_state(db), "GET", &uri, None, None).await;
    assert_eq!(body["views"], 2);
}

#[tokio::test]
async fn test_get_missing_question_returns_404() {
    let db = create_test_db().await;
    let state = build_app_state(db);

    let (status, _) = do_request(state, "GET", "/questions/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Update & Delete
// ============================================================================

#[tokio::test]
async fn test_update_question_is_owner_only() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Original", serde_json::json!(["a"])).await;
    let uri = format!("/questions/{}", q["id"].as_i64().unwrap());
    let payload = serde_json::json!({"title": "Edited", "description": "<p>d</p>", "tags": ["b"]});

    let (status, _) = do_request(
        build_app_state(db.clone()),
        "PUT",
        &uri,
        Some(&bob_token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = do_request(
        build_app_state(db),
        "PUT",
        &uri,
        Some(&alice_token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Edited");
    assert_eq!(body["tags"], serde_json::json!(["b"]));
}

#[tokio::test]
async fn test_delete_question_cascades_to_answers() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Doomed", serde_json::json!(["a"])).await;
    let qid = q["id"].as_i64().unwrap();
    post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>a1</p>").await;
    post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>a2</p>").await;

    let uri = format!("/questions/{}", qid);
    let (status, _) = do_request(
        build_app_state(db.clone()),
        "DELETE",
        &uri,
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let remaining = Answer::find()
        .filter(quorum::models::answer::Column::QuestionId.eq(qid))
        .all(&db)
        .await
        .unwrap();
    assert!(remaining.is_empty(), "answers must be deleted with the question");

    assert!(Question::find_by_id(qid).one(&db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_question_allowed_for_admin_but_not_stranger() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let root = create_test_admin(&db, "root", "root@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);
    let root_token = access_token_for(&state, &root);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Moderated", serde_json::json!(["a"])).await;
    let uri = format!("/questions/{}", q["id"].as_i64().unwrap());

    let (status, _) = do_request(build_app_state(db.clone()), "DELETE", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = do_request(build_app_state(db), "DELETE", &uri, Some(&root_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Accept
// ============================================================================

#[tokio::test]
async fn test_accept_answer_owner_only_and_notifies_author() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Pick me", serde_json::json!(["a"])).await;
    let qid = q["id"].as_i64().unwrap();
    let (_, a) = post_answer(build_app_state(db.clone()), &bob_token, qid, "<p>sol</p>").await;
    let aid = a["id"].as_i64().unwrap();

    let uri = format!("/questions/{}/accept", qid);
    let payload = serde_json::json!({ "answer_id": aid });

    // Only the question author may accept
    let (status, _) = do_request(
        build_app_state(db.clone()),
        "PUT",
        &uri,
        Some(&bob_token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = do_request(
        build_app_state(db.clone()),
        "PUT",
        &uri,
        Some(&alice_token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted_answer_id"], aid);

    // Answer author gets an accept notification
    let rows = Notification::find()
        .filter(notification::Column::UserId.eq(bob.id))
        .filter(notification::Column::Kind.eq("accept"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_accept_answer_must_belong_to_question() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q1) = post_question(build_app_state(db.clone()), &alice_token, "One", serde_json::json!(["a"])).await;
    let (_, q2) = post_question(build_app_state(db.clone()), &alice_token, "Two", serde_json::json!(["a"])).await;
    let (_, other_answer) = post_answer(
        build_app_state(db.clone()),
        &bob_token,
        q2["id"].as_i64().unwrap(),
        "<p>elsewhere</p>",
    )
    .await;

    let uri = format!("/questions/{}/accept", q1["id"].as_i64().unwrap());
    let (status, _) = do_request(
        build_app_state(db),
        "PUT",
        &uri,
        Some(&alice_token),
        Some(serde_json::json!({ "answer_id": other_answer["id"].as_i64().unwrap() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Voting through the API
// ============================================================================

#[tokio::test]
async fn test_vote_flow_upvote_conflict_then_downvote() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Why?", serde_json::json!(["js"])).await;
    let qid = q["id"].as_i64().unwrap();

    let up = format!("/questions/{}/upvote", qid);
    let down = format!("/questions/{}/downvote", qid);

    let (status, body) = do_request(build_app_state(db.clone()), "POST", &up, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"], 1);

    let (status, _) = do_request(build_app_state(db.clone()), "POST", &up, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = do_request(build_app_state(db.clone()), "POST", &down, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"], -1);

    let (status, _) = do_request(build_app_state(db), "POST", &up, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Flagging
// ============================================================================

#[tokio::test]
async fn test_flag_question_then_duplicate_flag_conflicts() {
    let db = create_test_db().await;
    let alice = create_test_user(&db, "alice", "alice@x.com", "secret1").await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db.clone());
    let alice_token = access_token_for(&state, &alice);
    let bob_token = access_token_for(&state, &bob);

    let (_, q) = post_question(build_app_state(db.clone()), &alice_token, "Spammy", serde_json::json!(["a"])).await;
    let uri = format!("/questions/{}/flag", q["id"].as_i64().unwrap());

    let (status, _) = do_request(build_app_state(db.clone()), "POST", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = do_request(build_app_state(db.clone()), "POST", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A different user may still flag
    let (status, _) = do_request(build_app_state(db), "POST", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_flag_missing_question_returns_404() {
    let db = create_test_db().await;
    let bob = create_test_user(&db, "bob", "bob@x.com", "secret1").await;
    let state = build_app_state(db);
    let token = access_token_for(&state, &bob);

    let (status, _) = do_request(state, "POST", "/questions/999/flag", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
