use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};

use tiltmaze_shared::protocol::{
    ClientMsg, DeviceRole, GameResetMsg, PlayerLeftMsg, ServerMsg, TiltUpdateMsg,
};

use crate::game_loop::{GameBroadcast, GameCommand};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // The first message must identify the player and device role.
    let (player_id, role) = match await_hello(&mut stream).await {
        Some(hello) => hello,
        None => return,
    };

    // Join the game
    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::Join {
            player_id: player_id.clone(),
            role,
            response: resp_tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let welcome = match resp_rx.await {
        Ok(welcome) => welcome,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!("Player {} connected as {:?}", player_id, role);

    let welcome_json = serde_json::to_string(&ServerMsg::Welcome(welcome)).unwrap();
    if sink.send(Message::Text(welcome_json.into())).await.is_err() {
        let _ = app_state
            .game_tx
            .send(GameCommand::Leave {
                player_id: player_id.clone(),
                role,
            })
            .await;
        return;
    }

    // Subscribe to broadcasts
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(client_msg) = serde_json::from_str::<ClientMsg>(&text) {
                            match client_msg {
                                // Duplicate hello on a live connection is a no-op.
                                ClientMsg::Hello { .. } => {}
                                ClientMsg::Tilt { tilt_x, tilt_z } => {
                                    let _ = app_state.game_tx.send(GameCommand::Tilt {
                                        player_id: player_id.clone(),
                                        tilt_x,
                                        tilt_z,
                                    }).await;
                                }
                                ClientMsg::PositionUpdate { pos, vel, finish_time } => {
                                    let _ = app_state.game_tx.send(GameCommand::PositionUpdate {
                                        player_id: player_id.clone(),
                                        pos,
                                        vel,
                                        finish_time,
                                    }).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let json = match &broadcast {
                            GameBroadcast::PlayerUpdate(msg) => {
                                serde_json::to_string(&ServerMsg::PlayerUpdate(msg.clone()))
                            }
                            GameBroadcast::PlayerLeft { player_id } => {
                                serde_json::to_string(&ServerMsg::PlayerLeft(PlayerLeftMsg {
                                    player_id: player_id.clone(),
                                }))
                            }
                            GameBroadcast::PhaseState(msg) => {
                                serde_json::to_string(&ServerMsg::PhaseState(msg.clone()))
                            }
                            GameBroadcast::GameReset { maze } => {
                                serde_json::to_string(&ServerMsg::GameReset(GameResetMsg {
                                    maze: *maze,
                                }))
                            }
                            GameBroadcast::TiltUpdate { player_id: for_player, tilt_x, tilt_z } => {
                                // Only the display driving this player's
                                // physics consumes its controller input.
                                if role != DeviceRole::Display || *for_player != player_id {
                                    continue;
                                }
                                serde_json::to_string(&ServerMsg::TiltUpdate(TiltUpdateMsg {
                                    player_id: for_player.clone(),
                                    tilt_x: *tilt_x,
                                    tilt_z: *tilt_z,
                                }))
                            }
                        };

                        if let Ok(json) = json {
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Player {} lagged by {} messages", player_id, n);
                        // Continue - the next phase_state resynchronizes
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .game_tx
        .send(GameCommand::Leave {
            player_id: player_id.clone(),
            role,
        })
        .await;
    tracing::info!("Player {} disconnected ({:?})", player_id, role);
}

/// Wait for the identifying hello. Any other first text message, a close or
/// an error drops the connection before it joins anything.
async fn await_hello(stream: &mut SplitStream<WebSocket>) -> Option<(String, DeviceRole)> {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(ClientMsg::Hello { player_id, role }) => Some((player_id, role)),
                    _ => None,
                };
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => {} // Ignore ping/pong/binary
        }
    }
    None
}
