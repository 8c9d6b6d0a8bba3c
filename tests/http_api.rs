//! End-to-end REST flows against a live server.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde_json::json;

use common::spawn_server;

#[tokio::test]
async fn match_then_chat_over_rest() {
    let server = spawn_server(Duration::from_secs(60)).await;
    let alice = server.register("Alice", 29, "woman").await;
    let bob = server.register("Bob", 31, "man").await;
    let carol = server.register("Carol", 27, "woman").await;

    let (status, deck) = server.get(&format!("/api/v1/users/{alice}/candidates")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deck.as_array().map(Vec::len), Some(2));

    let (status, first) = server
        .post(
            "/api/v1/swipe",
            json!({ "actor_id": alice, "target_id": bob, "direction": "like" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["accepted"], true);
    assert!(first["matched"].is_null());

    let (status, second) = server
        .post(
            "/api/v1/swipe",
            json!({ "actor_id": bob, "target_id": alice, "direction": "like" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    let Some(conversation) = second["matched"]["conversation_id"].as_str() else {
        panic!("mutual like did not match: {second}");
    };
    let conversation = conversation.to_string();

    let (status, matches) = server.get(&format!("/api/v1/users/{alice}/matches")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matches.as_array().map(Vec::len), Some(1));

    let (status, sent) = server
        .post(
            "/api/v1/messages?wait=true",
            json!({ "conversation_id": conversation, "sender_id": alice, "text": "hi bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sent}");
    assert_eq!(sent["status"], "approved");
    let Some(message_id) = sent["message_id"].as_str() else {
        panic!("approved submission without message id: {sent}");
    };
    let message_id = message_id.to_string();

    let (status, page) = server
        .get(&format!(
            "/api/v1/conversations/{conversation}/messages?user_id={bob}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["messages"][0]["text"], "hi bob");
    assert_eq!(page["has_more"], false);

    let (_, chats) = server.get(&format!("/api/v1/users/{bob}/conversations")).await;
    assert_eq!(chats[0]["unread"], 1);

    let (status, read) = server
        .post(
            &format!("/api/v1/conversations/{conversation}/read"),
            json!({ "user_id": bob, "up_to": message_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{read}");
    assert_eq!(read["unread"], 0);

    let (status, denied) = server
        .get(&format!(
            "/api/v1/conversations/{conversation}/messages?user_id={carol}"
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(denied["error"]["code"], 4004);
}

#[tokio::test]
async fn second_swipe_inside_cooldown_is_throttled() {
    let server = spawn_server(Duration::from_secs(60)).await;
    let alice = server.register("Alice", 29, "woman").await;
    let bob = server.register("Bob", 31, "man").await;
    let carol = server.register("Carol", 27, "woman").await;

    let (status, _) = server
        .post(
            "/api/v1/swipe",
            json!({ "actor_id": alice, "target_id": bob, "direction": "pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let Ok(resp) = server
        .client
        .post(server.url("/api/v1/swipe"))
        .json(&json!({ "actor_id": alice, "target_id": carol, "direction": "like" }))
        .send()
        .await
    else {
        panic!("swipe request failed");
    };
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(RETRY_AFTER));

    let (status, cooldown) = server.get(&format!("/api/v1/users/{alice}/cooldown")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cooldown["can_swipe"], false);
    assert!(cooldown["next_eligible_at"].is_string());
}

#[tokio::test]
async fn banned_pattern_is_rejected_with_a_strike() {
    let server = spawn_server(Duration::ZERO).await;
    let alice = server.register("Alice", 29, "woman").await;
    let bob = server.register("Bob", 31, "man").await;

    for (actor, target) in [(&alice, &bob), (&bob, &alice)] {
        let (status, _) = server
            .post(
                "/api/v1/swipe",
                json!({ "actor_id": actor, "target_id": target, "direction": "like" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, matches) = server.get(&format!("/api/v1/users/{alice}/matches")).await;
    let Some(conversation) = matches[0]["conversation_id"].as_str() else {
        panic!("no match: {matches}");
    };

    let (status, body) = server
        .post(
            "/api/v1/messages",
            json!({
                "conversation_id": conversation,
                "sender_id": alice,
                "text": "just send it over venmo",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4003);

    let (_, strikes) = server.get(&format!("/api/v1/users/{alice}/strikes")).await;
    assert_eq!(strikes["strikes"], 1);
    assert_eq!(strikes["banned"], false);

    let (status, _) = server
        .post(
            "/api/v1/messages",
            json!({ "conversation_id": conversation, "sender_id": alice, "text": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_policy_are_served() {
    let server = spawn_server(Duration::from_secs(30)).await;
    let (status, health) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    let (status, policy) = server.get("/config/policy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(policy["swipe_cooldown_secs"], 30);
    assert_eq!(policy["ban_threshold"], 3);

    let (status, _) = server
        .get("/api/v1/users/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
