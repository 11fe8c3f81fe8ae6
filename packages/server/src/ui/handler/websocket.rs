//! WebSocket connection handlers.
//!
//! One socket per anonymous client. The handler owns the connection
//! lifecycle: it allocates the connection id, binds it to a user on
//! `bind-connection` (or implicitly on `join-queue`), dispatches inbound
//! events to the use cases, and runs disconnect cleanup when the socket
//! closes.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Mood, PusherChannel, SessionId, UserId},
    infrastructure::dto::websocket::{
        CallEndedMessage, InboundMessage, QueueErrorMessage, QueueStatusMessage, SignalKind,
    },
    ui::state::AppState,
    usecase::{EndCallOutcome, error::EndCallError},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This is the outbound half of every connection: notifications queued by the
/// use cases (via the connection registry) are drained here and written to
/// the socket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    tracing::info!("Connection '{}' opened", connection_id);

    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let state_clone = state.clone();
    let tx_clone = tx.clone();

    // Receive loop: parse and dispatch every inbound frame.
    let mut recv_task = tokio::spawn(async move {
        let mut bound_user: Option<UserId> = None;
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on connection '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_text(
                        &state_clone,
                        &tx_clone,
                        connection_id,
                        &mut bound_user,
                        &text,
                    )
                    .await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping on connection '{}'", connection_id);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Send loop: drain the pusher channel into the socket.
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Connection lifecycle cleanup: unbind, drop an abandoned queue entry,
    // end an abandoned session and notify the partner.
    let report = state.disconnect_usecase.execute(&connection_id).await;
    match &report.user_id {
        Some(user_id) => {
            tracing::info!(
                "Connection '{}' of user '{}' closed (last connection: {}, queue entry removed: {}, session ended: {})",
                connection_id,
                user_id.as_str(),
                report.last_connection,
                report.removed_queue_entry,
                report.ended_session
            );
        }
        None => {
            tracing::info!("Connection '{}' closed (never bound)", connection_id);
        }
    }
}

/// Parse one text frame and dispatch it to the matching use case.
async fn dispatch_text(
    state: &Arc<AppState>,
    tx: &PusherChannel,
    connection_id: ConnectionId,
    bound_user: &mut Option<UserId>,
    text: &str,
) {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                "Failed to parse message on connection '{}': {}",
                connection_id,
                e
            );
            let _ = tx.send(QueueErrorMessage::new("unrecognized message").to_json());
            return;
        }
    };

    match message {
        InboundMessage::BindConnection { user_id } => match UserId::new(user_id) {
            Ok(user) => {
                bind_connection(state, tx, connection_id, bound_user, user).await;
            }
            Err(e) => {
                tracing::warn!("Rejected bind on connection '{}': {}", connection_id, e);
                let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
            }
        },

        InboundMessage::JoinQueue { user_id, mood } => {
            let user = match UserId::new(user_id) {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!("Rejected join on connection '{}': {}", connection_id, e);
                    let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
                    return;
                }
            };
            let mood = match Mood::try_from(mood.as_str()) {
                Ok(mood) => mood,
                Err(e) => {
                    tracing::warn!(
                        "Rejected join of '{}' on connection '{}': {}",
                        user.as_str(),
                        connection_id,
                        e
                    );
                    let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
                    return;
                }
            };

            // A join on an unbound connection binds it implicitly.
            if bound_user.as_ref() != Some(&user) {
                bind_connection(state, tx, connection_id, bound_user, user.clone()).await;
            }

            match state
                .join_queue_usecase
                .execute(user, mood, connection_id)
                .await
            {
                Ok(position) => {
                    let _ = tx.send(QueueStatusMessage::waiting(mood.as_str(), position).to_json());
                }
                Err(e) => {
                    tracing::error!("Join failed on connection '{}': {}", connection_id, e);
                    let _ = tx.send(QueueErrorMessage::new("failed to join queue").to_json());
                }
            }
        }

        InboundMessage::LeaveQueue { user_id } => {
            let user = match UserId::new(user_id) {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!("Rejected leave on connection '{}': {}", connection_id, e);
                    let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
                    return;
                }
            };
            if let Err(e) = state.leave_queue_usecase.execute(&user).await {
                tracing::error!("Leave failed on connection '{}': {}", connection_id, e);
            }
            // Leaving is idempotent; the confirmation goes out either way.
            let _ = tx.send(QueueStatusMessage::left().to_json());
        }

        InboundMessage::SignalOffer {
            target_user_id,
            offer,
        } => {
            relay_signal(
                state,
                connection_id,
                bound_user,
                SignalKind::Offer,
                target_user_id,
                offer,
            )
            .await;
        }

        InboundMessage::SignalAnswer {
            target_user_id,
            answer,
        } => {
            relay_signal(
                state,
                connection_id,
                bound_user,
                SignalKind::Answer,
                target_user_id,
                answer,
            )
            .await;
        }

        InboundMessage::SignalIce {
            target_user_id,
            candidate,
        } => {
            relay_signal(
                state,
                connection_id,
                bound_user,
                SignalKind::Ice,
                target_user_id,
                candidate,
            )
            .await;
        }

        InboundMessage::EndCall {
            session_id,
            partner_id: _,
        } => {
            let Some(caller) = bound_user.clone() else {
                tracing::warn!(
                    "Dropping end-call on unbound connection '{}'",
                    connection_id
                );
                return;
            };
            let session_id = match SessionId::parse(&session_id) {
                Ok(session_id) => session_id,
                Err(e) => {
                    tracing::warn!("Rejected end-call on connection '{}': {}", connection_id, e);
                    let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
                    return;
                }
            };
            match state.end_call_usecase.execute(&caller, &session_id).await {
                Ok(EndCallOutcome::Ended { .. }) => {
                    let _ = tx.send(CallEndedMessage::new("call ended").to_json());
                }
                Ok(EndCallOutcome::AlreadyEnded) => {
                    // Idempotent repeat: no error, no duplicate notification.
                }
                Err(e @ EndCallError::SessionNotFound(_)) => {
                    tracing::warn!("End-call on connection '{}': {}", connection_id, e);
                    let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
                }
                Err(e @ EndCallError::NotParticipant(_, _)) => {
                    tracing::warn!("End-call on connection '{}': {}", connection_id, e);
                    let _ = tx.send(QueueErrorMessage::new(e.to_string()).to_json());
                }
            }
        }
    }
}

async fn bind_connection(
    state: &Arc<AppState>,
    tx: &PusherChannel,
    connection_id: ConnectionId,
    bound_user: &mut Option<UserId>,
    user: UserId,
) {
    state
        .connection_registry
        .bind(user.clone(), connection_id, tx.clone())
        .await;
    tracing::info!(
        "Connection '{}' bound to user '{}'",
        connection_id,
        user.as_str()
    );
    *bound_user = Some(user);
}

/// Forward one signaling frame. Best-effort: every failure is logged by the
/// use case and the frame is dropped without an error to the sender.
async fn relay_signal(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    bound_user: &Option<UserId>,
    kind: SignalKind,
    target_user_id: String,
    payload: serde_json::Value,
) {
    let Some(sender_user) = bound_user else {
        tracing::warn!(
            "Dropping {} on unbound connection '{}'",
            kind.as_str(),
            connection_id
        );
        return;
    };
    let target = match UserId::new(target_user_id) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(
                "Dropping {} with invalid target on connection '{}': {}",
                kind.as_str(),
                connection_id,
                e
            );
            return;
        }
    };
    let _ = state
        .relay_signal_usecase
        .execute(kind, sender_user, connection_id, &target, payload)
        .await;
}
