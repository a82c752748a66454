//! Webhook boundary tests: handshake, secret check and event filtering

use serde_json::json;

use crate::helpers::*;
use crate::integration::init_test_logging;
use CourierHub::database::Store;
use CourierHub::handlers::shop::WELCOME_TEXT;
use CourierHub::server::OK_REPLY;

#[tokio::test]
async fn test_confirmation_returns_code() {
    init_test_logging();
    let ctx = TestContext::new();

    let reply = ctx.deliver(json!({ "type": "confirmation", "group_id": GROUP_ID })).await;

    assert_eq!(reply, CONFIRMATION_CODE);
    assert!(ctx.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_secret_mismatch_is_acknowledged_and_dropped() {
    let ctx = TestContext::new();

    let reply = ctx
        .deliver(json!({
            "type": "message_new",
            "group_id": GROUP_ID,
            "secret": "wrong",
            "object": { "message": { "peer_id": CLIENT_ID, "from_id": CLIENT_ID, "text": "начать" } },
        }))
        .await;

    assert_eq!(reply, OK_REPLY);
    assert!(ctx.gateway.sent().is_empty());
    assert!(ctx.store.get_user(CLIENT_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_and_malformed_events_are_acknowledged() {
    let ctx = TestContext::new();

    let reply = ctx
        .deliver(json!({ "type": "wall_post_new", "secret": SECRET, "object": {} }))
        .await;
    assert_eq!(reply, OK_REPLY);

    let reply = CourierHub::handle_webhook(&ctx.app, b"not json").await;
    assert_eq!(reply, OK_REPLY);

    let reply = ctx
        .deliver(json!({ "type": "message_allow", "secret": SECRET, "object": { "user_id": CLIENT_ID } }))
        .await;
    assert_eq!(reply, OK_REPLY);

    assert!(ctx.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_legacy_message_shape_is_accepted() {
    let ctx = TestContext::new();

    let reply = ctx
        .deliver(json!({
            "type": "message_new",
            "secret": SECRET,
            "object": { "peer_id": CLIENT_ID, "from_id": CLIENT_ID, "text": "Начать" },
        }))
        .await;

    assert_eq!(reply, OK_REPLY);
    assert_eq!(ctx.gateway.last_text(CLIENT_ID), WELCOME_TEXT);
}

#[tokio::test]
async fn test_community_authors_are_ignored() {
    let ctx = TestContext::new();

    let reply = ctx.private_text(-GROUP_ID, "начать").await;

    assert_eq!(reply, OK_REPLY);
    assert!(ctx.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_handler_errors_still_acknowledge() {
    let ctx = TestContext::new();

    // Group message from a chat whose title cannot be read
    let reply = ctx.group_text(2_000_000_999, COURIER_ID, "привет").await;

    assert_eq!(reply, OK_REPLY);
    assert!(ctx.store.chat_by_peer(2_000_000_999).await.unwrap().is_none());
}
