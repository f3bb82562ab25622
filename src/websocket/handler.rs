use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    message::{MessageResponse, SendMessageRequest},
    middleware::AuthUser,
    state::AppState,
};

use super::connection::WsSender;
use super::types::{ClientMessage, ErrorPayload, RegisteredPayload, WsMessage};

/// Delivery relay socket.
///
/// The authenticated user is registered as soon as the upgrade completes and
/// receives `receive_message` events for every message addressed to them.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

async fn handle_socket(socket: WebSocket, user_id: Uuid, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let connection_id = state.registry.register(user_id, tx.clone());
    let _ = tx.send(WsMessage::Registered(RegisteredPayload {
        user_id,
        connection_id,
    }));
    tracing::info!(
        %user_id,
        %connection_id,
        online = state.registry.connection_count(),
        "WebSocket connected"
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    let state_clone = state.clone();
    let tx_clone = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Err(e) = process_client_message(
                        &text,
                        user_id,
                        connection_id,
                        &state_clone,
                        &tx_clone,
                    )
                    .await
                    {
                        tracing::debug!(%user_id, error = %e, "Rejected client event");
                        let _ = tx_clone.send(WsMessage::Error(ErrorPayload {
                            code: e.code().to_string(),
                            message: e.public_message(),
                        }));
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    let tx_heartbeat = tx.clone();
    let mut heartbeat_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx_heartbeat.send(WsMessage::Ping).is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut recv_task => {
            send_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut heartbeat_task => {
            send_task.abort();
            recv_task.abort();
        }
    }

    let removed = state.registry.unregister(user_id, connection_id);

    tracing::info!(
        %user_id,
        %connection_id,
        removed,
        still_connected = state.registry.is_connected(user_id),
        online = state.registry.connection_count(),
        "WebSocket closed"
    );
}

async fn process_client_message(
    text: &str,
    user_id: Uuid,
    connection_id: Uuid,
    state: &AppState,
    tx: &WsSender,
) -> Result<()> {
    let client_msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("Invalid message format: {}", e)))?;

    match client_msg {
        ClientMessage::Register { user_id: claimed } => {
            if claimed != user_id {
                return Err(AppError::Forbidden(
                    "Cannot register as another user".to_string(),
                ));
            }

            state.registry.claim(user_id, connection_id, tx.clone());
            let _ = tx.send(WsMessage::Registered(RegisteredPayload {
                user_id,
                connection_id,
            }));
        }

        ClientMessage::SendMessage {
            recipient_id,
            content,
            message_type,
            attachment_url,
        } => {
            let message = state
                .message_service
                .send(
                    user_id,
                    SendMessageRequest {
                        recipient_id,
                        content,
                        message_type,
                        attachment_url,
                    },
                )
                .await?;

            let _ = tx.send(WsMessage::MessageSent(MessageResponse::from(message)));
        }

        ClientMessage::MarkRead { message_id } => {
            state.message_service.mark_read(message_id, user_id).await?;
        }

        ClientMessage::Ping => {
            let _ = tx.send(WsMessage::Pong);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        interview::InMemoryInterviewStore,
        message::InMemoryMessageStore,
        state::Config,
        user::{InMemoryUserStore, NewUser, UserRole},
    };

    fn state() -> AppState {
        AppState::new(
            Config::for_tests(),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(InMemoryInterviewStore::new()),
            None,
        )
    }

    async fn user(state: &AppState, name: &str) -> Uuid {
        state
            .users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                role: UserRole::Student,
            })
            .await
            .unwrap()
            .id
    }

    fn socket(state: &AppState, user_id: Uuid) -> (Uuid, WsSender, mpsc::UnboundedReceiver<WsMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = state.registry.register(user_id, tx.clone());
        (connection_id, tx, rx)
    }

    #[tokio::test]
    async fn test_register_as_another_user_is_forbidden() {
        let state = state();
        let (ada, bob) = (user(&state, "Ada").await, user(&state, "Bob").await);
        let (connection_id, tx, mut rx) = socket(&state, ada);

        let frame = format!(r#"{{"type":"register","user_id":"{}"}}"#, bob);
        let err = process_client_message(&frame, ada, connection_id, &state, &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.code(), "FORBIDDEN");
        assert!(!state.registry.is_connected(bob));
        assert!(rx.try_recv().is_err());

        let frame = format!(r#"{{"type":"register","user_id":"{}"}}"#, ada);
        process_client_message(&frame, ada, connection_id, &state, &tx)
            .await
            .unwrap();
        match rx.try_recv() {
            Ok(WsMessage::Registered(payload)) => {
                assert_eq!(payload.user_id, ada);
                assert_eq!(payload.connection_id, connection_id);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_message_acks_sender_and_pushes_to_recipient() {
        let state = state();
        let (ada, bob) = (user(&state, "Ada").await, user(&state, "Bob").await);
        let (ada_conn, ada_tx, mut ada_rx) = socket(&state, ada);
        let (_, _bob_tx, mut bob_rx) = socket(&state, bob);

        let frame = format!(
            r#"{{"type":"send_message","recipient_id":"{}","content":"  hello  "}}"#,
            bob
        );
        process_client_message(&frame, ada, ada_conn, &state, &ada_tx)
            .await
            .unwrap();

        let sent = match ada_rx.try_recv() {
            Ok(WsMessage::MessageSent(message)) => message,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(sent.content, "hello");
        assert_eq!(sent.sender_id, ada);

        match bob_rx.try_recv() {
            Ok(WsMessage::ReceiveMessage(message)) => assert_eq!(message.id, sent.id),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(state.message_service.unread_count(bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_message_errors_surface_as_app_errors() {
        let state = state();
        let ada = user(&state, "Ada").await;
        let (conn, tx, mut rx) = socket(&state, ada);

        let frame = format!(r#"{{"type":"send_message","recipient_id":"{}","content":"me"}}"#, ada);
        let err = process_client_message(&frame, ada, conn, &state, &tx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let frame = format!(
            r#"{{"type":"send_message","recipient_id":"{}","content":"hi"}}"#,
            Uuid::new_v4()
        );
        let err = process_client_message(&frame, ada, conn, &state, &tx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mark_read_only_for_recipient() {
        let state = state();
        let (ada, bob) = (user(&state, "Ada").await, user(&state, "Bob").await);
        let message = state
            .message_service
            .send(
                ada,
                SendMessageRequest {
                    recipient_id: bob,
                    content: "read me".to_string(),
                    message_type: Default::default(),
                    attachment_url: None,
                },
            )
            .await
            .unwrap();
        let frame = format!(r#"{{"type":"mark_read","message_id":"{}"}}"#, message.id);

        let (ada_conn, ada_tx, _ada_rx) = socket(&state, ada);
        let err = process_client_message(&frame, ada, ada_conn, &state, &ada_tx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        let (bob_conn, bob_tx, _bob_rx) = socket(&state, bob);
        process_client_message(&frame, bob, bob_conn, &state, &bob_tx)
            .await
            .unwrap();
        assert_eq!(state.message_service.unread_count(bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ping_and_malformed_frames() {
        let state = state();
        let ada = user(&state, "Ada").await;
        let (conn, tx, mut rx) = socket(&state, ada);

        process_client_message(r#"{"type":"ping"}"#, ada, conn, &state, &tx)
            .await
            .unwrap();
        assert!(matches!(rx.try_recv(), Ok(WsMessage::Pong)));

        for frame in ["not json", r#"{"type":"shout"}"#, r#"{"type":"mark_read","message_id":"x"}"#] {
            let err = process_client_message(frame, ada, conn, &state, &tx)
                .await
                .unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR");
            assert!(err.public_message().starts_with("Invalid message format"));
        }
    }
}
