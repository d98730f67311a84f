//! End-to-end conformance tests for the Tether node API.
//!
//! Each test spawns an ephemeral in-process node (real TCP, real HTTP) via
//! [`tether_conformance::spawn_node`] and exercises the API with a `reqwest`
//! client. Users are registered over HTTP; the caller is identified with the
//! `x-actor-id` header the upstream gateway would set.
//!
//! # Coverage
//!
//! | Test | Area |
//! |------|------|
//! | `register_and_fetch_user` | registration, user lookup |
//! | `public_follow_lifecycle` | auto-accept, already following, unfollow |
//! | `private_follow_approval_flow` | pending, listing, accept, profile lists |
//! | `requester_cancel_then_fresh_request` | requester cancel |
//! | `target_cancel_removes_request` | target cancel |
//! | `respond_rejects_unknown_action` | action parsing |
//! | `self_follow_is_invalid_operation` | self edge |
//! | `missing_actor_returns_401` | actor extraction |
//! | `profile_directory_excludes_caller` | profile listing |
//! | `concurrent_requests_create_one_edge` | conditional insert under load |
//! | `sqlite_backend_follow_flow` | SQLite storage end to end |
//! | `sqlite_concurrent_requests_create_one_edge` | SQLite conditional insert under load |

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tether::{FollowStatus, UserId};
use tether_conformance::{spawn_node, spawn_node_with};
use tether_node::{storage::Storage, SqliteStorage};
use tether_node_api::RegisterResponse;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

async fn register(client: &reqwest::Client, base: &str, username: &str, public: bool) -> UserId {
    let resp = client
        .post(format!("{base}/v1/users"))
        .json(&json!({ "username": username, "public": public }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: RegisterResponse = resp.json().await.unwrap();
    assert_eq!(body.profile.public, public);
    body.user.id
}

async fn follow(
    client: &reqwest::Client,
    base: &str,
    actor: UserId,
    target: UserId,
    action: Option<&str>,
) -> (StatusCode, Value) {
    let mut body = json!({ "following_id": target });
    if let Some(action) = action {
        body["action"] = json!(action);
    }
    let resp = client
        .post(format!("{base}/v1/follows"))
        .header("x-actor-id", actor.to_string())
        .json(&body)
        .send()
        .await
        .unwrap();
    (resp.status(), resp.json().await.unwrap())
}

async fn respond(
    client: &reqwest::Client,
    base: &str,
    actor: UserId,
    requester: UserId,
    action: &str,
) -> (StatusCode, Value) {
    let resp = client
        .post(format!("{base}/v1/follow-requests"))
        .header("x-actor-id", actor.to_string())
        .json(&json!({ "follower_id": requester, "action": action }))
        .send()
        .await
        .unwrap();
    (resp.status(), resp.json().await.unwrap())
}

async fn unfollow(
    client: &reqwest::Client,
    base: &str,
    actor: UserId,
    target: UserId,
) -> (StatusCode, Value) {
    let resp = client
        .delete(format!("{base}/v1/follows/{target}"))
        .header("x-actor-id", actor.to_string())
        .send()
        .await
        .unwrap();
    (resp.status(), resp.json().await.unwrap())
}

async fn get_json(client: &reqwest::Client, url: String, actor: Option<UserId>) -> Value {
    let mut req = client.get(url);
    if let Some(actor) = actor {
        req = req.header("x-actor-id", actor.to_string());
    }
    let resp = req.send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

fn usernames(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_and_fetch_user() {
    let (base, _) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;

    let user = get_json(&client, format!("{base}/v1/users/{alice}"), None).await;
    assert_eq!(user["username"], "alice");

    let resp = client
        .post(format!("{base}/v1/users"))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Follow lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn public_follow_lifecycle() {
    let (base, storage) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let bob = register(&client, &base, "bob", true).await;

    let (status, body) = follow(&client, &base, alice, bob, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "follow_succeeded");

    let (status, body) = follow(&client, &base, alice, bob, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"], "already_following");
    assert_eq!(storage.edge_count(), 1);

    let followers = get_json(&client, format!("{base}/v1/users/{bob}/followers"), None).await;
    assert_eq!(usernames(&followers["items"]), vec!["alice"]);

    let (status, body) = unfollow(&client, &base, alice, bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "unfollowed");

    let (status, body) = unfollow(&client, &base, alice, bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_following");
    assert_eq!(storage.edge_count(), 0);
}

#[tokio::test]
async fn private_follow_approval_flow() {
    let (base, _) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let carol = register(&client, &base, "carol", false).await;

    let (status, body) = follow(&client, &base, alice, carol, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "pending_approval");
    assert_eq!(body["reqstatus"], "pending");

    let (status, body) = follow(&client, &base, alice, carol, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"], "pending_request_exists");

    // Pending edges are not part of the profile lists.
    let profile = get_json(&client, format!("{base}/v1/profiles/{carol}"), None).await;
    assert!(profile["followers"].as_array().unwrap().is_empty());

    let requests = get_json(&client, format!("{base}/v1/follow-requests"), Some(carol)).await;
    assert_eq!(requests["items"][0]["follower"]["id"], alice.get());

    let (status, body) = respond(&client, &base, carol, alice, "ACCEPT").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "request_accepted");

    let (status, body) = respond(&client, &base, carol, alice, "accept").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let profile = get_json(&client, format!("{base}/v1/profiles/me"), Some(carol)).await;
    assert_eq!(usernames(&profile["followers"]), vec!["alice"]);
    let profile = get_json(&client, format!("{base}/v1/profiles/me"), Some(alice)).await;
    assert_eq!(usernames(&profile["following"]), vec!["carol"]);

    let requests = get_json(&client, format!("{base}/v1/follow-requests"), Some(carol)).await;
    assert!(requests["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn requester_cancel_then_fresh_request() {
    let (base, storage) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let carol = register(&client, &base, "carol", false).await;

    follow(&client, &base, alice, carol, None).await;
    let (status, body) = follow(&client, &base, alice, carol, Some("cancel")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "request_canceled");
    assert_eq!(body["reqstatus"], "rejected");
    assert!(storage.get_edge(alice, carol).await.unwrap().is_none());

    let (status, body) = follow(&client, &base, alice, carol, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "pending_approval");
}

#[tokio::test]
async fn target_cancel_removes_request() {
    let (base, storage) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let carol = register(&client, &base, "carol", false).await;

    follow(&client, &base, alice, carol, None).await;
    let (status, body) = respond(&client, &base, carol, alice, "Cancel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "request_canceled");
    assert_eq!(storage.edge_count(), 0);
}

#[tokio::test]
async fn respond_rejects_unknown_action() {
    let (base, storage) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let carol = register(&client, &base, "carol", false).await;

    follow(&client, &base, alice, carol, None).await;
    let (status, body) = respond(&client, &base, carol, alice, "approve").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_action");

    let edge = storage.get_edge(alice, carol).await.unwrap().unwrap();
    assert_eq!(edge.status, FollowStatus::Pending);
}

#[tokio::test]
async fn self_follow_is_invalid_operation() {
    let (base, storage) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", true).await;

    let (status, body) = follow(&client, &base, alice, alice, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_operation");
    assert_eq!(storage.edge_count(), 0);
}

#[tokio::test]
async fn missing_actor_returns_401() {
    let (base, _) = spawn_node().await;
    let client = make_client();
    let bob = register(&client, &base, "bob", true).await;

    let resp = client
        .post(format!("{base}/v1/follows"))
        .json(&json!({ "following_id": bob }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "unauthorized");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_directory_excludes_caller() {
    let (base, _) = spawn_node().await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let bob = register(&client, &base, "bob", true).await;
    register(&client, &base, "carol", false).await;

    let (status, _) = follow(&client, &base, alice, bob, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let list = get_json(&client, format!("{base}/v1/profiles"), Some(alice)).await;
    let names: Vec<&str> = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["bob", "carol"]);
    assert_eq!(usernames(&list["items"][0]["followers"]), ["alice"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_create_one_edge() {
    const N: usize = 16;

    for public in [true, false] {
        let (base, storage) = spawn_node().await;
        let client = make_client();
        let alice = register(&client, &base, "alice", false).await;
        let target = register(&client, &base, "target", public).await;

        let responses = futures::future::join_all(
            (0..N).map(|_| follow(&client, &base, alice, target, None)),
        )
        .await;

        let created = responses
            .iter()
            .filter(|(status, _)| *status == StatusCode::CREATED)
            .count();
        let observed = responses
            .iter()
            .filter(|(status, body)| {
                *status == StatusCode::BAD_REQUEST
                    && (body["outcome"] == "already_following"
                        || body["outcome"] == "pending_request_exists")
            })
            .count();
        assert_eq!(created, 1);
        assert_eq!(observed, N - 1);
        assert_eq!(storage.edge_count(), 1);
    }
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sqlite_backend_follow_flow() {
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let base = spawn_node_with(Arc::clone(&storage)).await;
    let client = make_client();
    let alice = register(&client, &base, "alice", false).await;
    let carol = register(&client, &base, "carol", false).await;

    let (status, _) = follow(&client, &base, alice, carol, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = follow(&client, &base, alice, carol, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"], "pending_request_exists");

    let (status, _) = respond(&client, &base, carol, alice, "accept").await;
    assert_eq!(status, StatusCode::OK);
    let edge = storage.get_edge(alice, carol).await.unwrap().unwrap();
    assert_eq!(edge.status, FollowStatus::Accepted);

    let (status, _) = unfollow(&client, &base, alice, carol).await;
    assert_eq!(status, StatusCode::OK);
    assert!(storage.get_edge(alice, carol).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_requests_create_one_edge() {
    const N: usize = 32;

    for public in [true, false] {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let base = spawn_node_with(Arc::clone(&storage)).await;
        let client = make_client();
        let alice = register(&client, &base, "alice", false).await;
        let target = register(&client, &base, "target", public).await;

        let responses = futures::future::join_all(
            (0..N).map(|_| follow(&client, &base, alice, target, None)),
        )
        .await;

        let created = responses
            .iter()
            .filter(|(status, _)| *status == StatusCode::CREATED)
            .count();
        let observed = responses
            .iter()
            .filter(|(status, body)| {
                *status == StatusCode::BAD_REQUEST
                    && (body["outcome"] == "already_following"
                        || body["outcome"] == "pending_request_exists")
            })
            .count();
        assert_eq!(created, 1);
        assert_eq!(observed, N - 1);

        let expected = if public {
            FollowStatus::Accepted
        } else {
            FollowStatus::Pending
        };
        let followers = storage.list_followers(target, expected).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].follower, alice);
    }
}
