//! Web API Board Tests
//!
//! Integration tests for boards, posts, search and the latest-posts feed.

#![cfg(feature = "sqlite")]

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use aizeva::board::WritePermission;
use common::TestApp;

// ============================================================================
// Board Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_boards_with_stats() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::All).await;
    app.create_board("notice", WritePermission::Admin).await;
    let alice = app.member("alice").await;
    let post_id = alice.create_post("free", "Hello", "<p>hi</p>").await;
    alice
        .post(
            &format!("/posts/{post_id}/comments"),
            json!({ "body": "first" }),
        )
        .await
        .assert_status(StatusCode::CREATED);

    let response = alice.get("/boards").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let boards = body["data"].as_array().unwrap();
    assert_eq!(boards.len(), 2);

    assert_eq!(boards[0]["slug"], "free");
    assert_eq!(boards[0]["post_count"], 1);
    assert_eq!(boards[0]["comment_count"], 1);
    assert_eq!(boards[0]["can_write"], true);
    assert_eq!(boards[0]["write_permission"], "all");

    assert_eq!(boards[1]["slug"], "notice");
    assert_eq!(boards[1]["can_write"], false);
}

#[tokio::test]
async fn test_can_write_for_anonymous() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::All).await;
    app.create_board("members", WritePermission::Member).await;
    let browser = app.browser().await;

    let body: Value = browser.get("/boards").await.json();
    assert_eq!(body["data"][0]["can_write"], true);
    assert_eq!(body["data"][1]["can_write"], false);
}

#[tokio::test]
async fn test_get_board() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let browser = app.browser().await;

    let response = browser.get("/boards/free").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "FREE");
    assert_eq!(body["data"]["can_write"], false);
    assert!(body["data"].get("post_count").is_none());

    let response = browser.get("/boards/missing").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// Post Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_get_post() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;

    let response = alice
        .post(
            "/boards/free/posts",
            json!({
                "title": "<b>Hello</b> world",
                "body": "<p>Safe <strong>text</strong></p><script>alert(1)</script>",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["data"]["title"], "Hello world");
    assert_eq!(created["data"]["author"]["username"], "alice");
    let body = created["data"]["body"].as_str().unwrap();
    assert!(body.contains("<strong>text</strong>"));
    assert!(!body.contains("script"));

    let id = created["data"]["id"].as_i64().unwrap();
    let response = alice.get(&format!("/posts/{id}")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["view_count"], 1);
}

#[tokio::test]
async fn test_create_post_requires_login() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::All).await;
    let browser = app.browser().await;

    browser
        .post(
            "/boards/free/posts",
            json!({ "title": "Hi", "body": "<p>x</p>" }),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_post_on_admin_board_forbidden() {
    let app = TestApp::new().await;
    app.create_board("notice", WritePermission::Admin).await;
    let alice = app.member("alice").await;

    alice
        .post(
            "/boards/notice/posts",
            json!({ "title": "Hi", "body": "<p>x</p>" }),
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let admin = app.admin().await;
    admin.create_post("notice", "Announcement", "<p>x</p>").await;
}

#[tokio::test]
async fn test_create_post_validation() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;

    alice
        .post("/boards/free/posts", json!({ "title": "  ", "body": "<p>x</p>" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    alice
        .post(
            "/boards/free/posts",
            json!({ "title": "x".repeat(201), "body": "<p>x</p>" }),
        )
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    alice
        .post("/boards/free/posts", json!({ "title": "Hi" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_view_count_increments() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    let id = alice.create_post("free", "Hi", "<p>x</p>").await;

    for _ in 0..4 {
        alice.get(&format!("/posts/{id}")).await.assert_status_ok();
    }
    let body: Value = alice.get(&format!("/posts/{id}")).await.json();
    assert_eq!(body["data"]["view_count"], 5);
}

#[tokio::test]
async fn test_update_post_by_author_and_admin() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    let bob = app.member("bob").await;
    let admin = app.admin().await;
    let id = alice.create_post("free", "Original", "<p>x</p>").await;
    let path = format!("/posts/{id}");

    let response = alice.put(&path, json!({ "title": "Edited" })).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["body"], "<p>x</p>");

    bob.put(&path, json!({ "title": "Hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    admin
        .put(&path, json!({ "body": "<p>moderated</p>" }))
        .await
        .assert_status_ok();

    alice
        .put(&path, json!({}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_post() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    let bob = app.member("bob").await;
    let id = alice.create_post("free", "Bye", "<p>x</p>").await;
    let path = format!("/posts/{id}");

    bob.delete(&path)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    alice
        .delete(&path)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    alice.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    alice
        .delete(&path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_permissions() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    let bob = app.member("bob").await;
    let admin = app.admin().await;
    let anonymous = app.browser().await;
    let id = alice.create_post("free", "Hi", "<p>x</p>").await;
    let path = format!("/posts/{id}/permissions");

    let body: Value = alice.get(&path).await.json();
    assert_eq!(body["data"], json!({ "can_edit": true, "can_delete": true }));
    let body: Value = bob.get(&path).await.json();
    assert_eq!(body["data"], json!({ "can_edit": false, "can_delete": false }));
    let body: Value = admin.get(&path).await.json();
    assert_eq!(body["data"], json!({ "can_edit": true, "can_delete": true }));
    let body: Value = anonymous.get(&path).await.json();
    assert_eq!(body["data"], json!({ "can_edit": false, "can_delete": false }));
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_list_posts_pagination() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    for i in 1..=25 {
        alice
            .create_post("free", &format!("Post {i}"), "<p>x</p>")
            .await;
    }

    let body: Value = alice.get("/boards/free/posts").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"][0]["title"], "Post 25");
    assert_eq!(
        body["meta"],
        json!({ "page": 1, "per_page": 10, "total": 25, "total_pages": 3 })
    );

    let body: Value = alice.get("/boards/free/posts?page=3").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][4]["title"], "Post 1");

    let body: Value = alice.get("/boards/free/posts?page=4").await.json();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 25);

    alice
        .get("/boards/free/posts?page=0")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_huge_page_number_is_empty() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    for i in 1..=3 {
        alice
            .create_post("free", &format!("Rust {i}"), "<p>x</p>")
            .await;
    }

    let response = alice
        .get(&format!("/boards/free/posts?page={}", i64::MAX))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 3);

    let body: Value = alice
        .get(&format!("/search?q=rust&page={}", i64::MAX / 5))
        .await
        .json();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 3);
}

// ============================================================================
// Search / Latest Tests
// ============================================================================

#[tokio::test]
async fn test_search() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    app.create_board("qna", WritePermission::Member).await;
    let alice = app.member("alice").await;
    alice.create_post("free", "Rust tips", "<p>ownership</p>").await;
    alice.create_post("qna", "Question", "<p>How does RUST borrow?</p>").await;
    alice.create_post("qna", "Unrelated", "<p>nothing</p>").await;

    let body: Value = alice.get("/search?q=rust").await.json();
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["data"][0]["title"], "Question");

    let body: Value = alice.get("/search?q=rust&board=free").await.json();
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Rust tips");

    alice
        .get("/search?q=rust&board=free,missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    alice
        .get("/search?q=")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    alice.create_post("free", "50% off", "<p>sale</p>").await;
    alice.create_post("free", "500 reasons", "<p>list</p>").await;

    let body: Value = alice.get("/search?q=50%25").await.json();
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "50% off");
}

#[tokio::test]
async fn test_latest_posts() {
    let app = TestApp::new().await;
    app.create_board("free", WritePermission::Member).await;
    let alice = app.member("alice").await;
    for i in 1..=7 {
        alice
            .create_post("free", &format!("Post {i}"), &format!("<p>{}</p>", "y".repeat(150)))
            .await;
    }

    let body: Value = alice.get("/posts/latest").await.json();
    let posts = body["data"].as_array().unwrap();
    assert_eq!(posts.len(), 5);
    assert_eq!(posts[0]["title"], "Post 7");
    assert_eq!(posts[0]["board_slug"], "free");
    assert_eq!(posts[0]["comment_count"], 0);
    assert!(!posts[0]["preview"].as_str().unwrap().contains('<'));

    let body: Value = alice.get("/posts/latest?limit=2").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
