//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::{ConversationId, DomainEvent, UserId};
use crate::error::GatewayError;

/// Error code for an envelope that is not valid JSON.
const CODE_MALFORMED: u32 = 400;
/// Error code for an unknown or ill-formed command.
const CODE_UNKNOWN_COMMAND: u32 = 404;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them to the services.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DomainEvent>,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &state).await;
                        if let Ok(json) = serde_json::to_string(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(&event) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_value(&event) else {
                            continue;
                        };
                        let Ok(json) = serde_json::to_string(&WsMessage::event(payload)) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text frame from the client and builds the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    state: &AppState,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), CODE_MALFORMED, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, CODE_UNKNOWN_COMMAND, "expected a command message");
    }
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(err) => {
            return WsMessage::error(msg.id, CODE_UNKNOWN_COMMAND, format!("unknown command: {err}"));
        }
    };

    match dispatch(command, subs, state).await {
        Ok(payload) => WsMessage::response(msg.id, payload),
        Err(err) => WsMessage::from_gateway_error(msg.id, &err),
    }
}

async fn dispatch(
    command: WsCommand,
    subs: &mut SubscriptionManager,
    state: &AppState,
) -> Result<serde_json::Value, GatewayError> {
    match command {
        WsCommand::Subscribe {
            user_ids,
            conversation_ids,
        } => {
            let wildcard = user_ids.iter().any(|id| id == "*");
            let users = parse_ids::<UserId>(&user_ids);
            let conversations = parse_ids::<ConversationId>(&conversation_ids);
            subs.subscribe(&users, &conversations, wildcard);
            Ok(serde_json::json!({
                "subscribed_users": users,
                "subscribed_conversations": conversations,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            }))
        }
        WsCommand::Unsubscribe {
            user_ids,
            conversation_ids,
        } => {
            let users = parse_ids::<UserId>(&user_ids);
            let conversations = parse_ids::<ConversationId>(&conversation_ids);
            subs.unsubscribe(&users, &conversations);
            Ok(serde_json::json!({
                "unsubscribed_users": users,
                "unsubscribed_conversations": conversations,
                "remaining_count": subs.count(),
            }))
        }
        WsCommand::Swipe {
            actor_id,
            target_id,
            direction,
        } => {
            let outcome = state
                .swipe_service
                .attempt_swipe(actor_id, target_id, direction, Utc::now())
                .await?;
            to_payload(&outcome)
        }
        WsCommand::SendMessage {
            conversation_id,
            sender_id,
            text,
        } => {
            let submission = state
                .moderation_gate
                .submit(conversation_id, sender_id, text, Utc::now())
                .await?;
            to_payload(&submission)
        }
        WsCommand::MarkRead {
            conversation_id,
            user_id,
            up_to,
        } => {
            let unread = state
                .chat_service
                .mark_read(conversation_id, user_id, up_to)
                .await?;
            Ok(serde_json::json!({
                "conversation_id": conversation_id,
                "unread": unread,
            }))
        }
        WsCommand::Sync {
            conversation_id,
            user_id,
            since,
            limit,
        } => {
            let feed = state
                .chat_service
                .open_feed(conversation_id, user_id, since)
                .await?;
            let messages: Vec<_> = feed
                .into_stream()
                .take(limit.clamp(1, crate::service::chat_service::MAX_PAGE_SIZE))
                .collect()
                .await;
            Ok(serde_json::json!({
                "conversation_id": conversation_id,
                "messages": messages,
            }))
        }
    }
}

fn parse_ids<T: From<uuid::Uuid>>(raw: &[String]) -> Vec<T> {
    raw.iter()
        .filter_map(|s| s.parse::<uuid::Uuid>().ok())
        .map(T::from)
        .collect()
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Internal(e.to_string()))
}
