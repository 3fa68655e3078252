//! The single authority task. Owns all game state; every join, leave,
//! kinematic write and phase tick is serialized through one mpsc queue and
//! runs to completion before the next, so there is no shared-state locking
//! anywhere in the model.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use tiltmaze_shared::protocol::{DeviceRole, PhaseStateMsg, PlayerUpdateMsg, WelcomeMsg};
use tiltmaze_shared::vec3::Vec3;

use crate::config::ServerConfig;
use crate::state::{GameState, LeaveEffect};

/// Commands from client connections to the game loop
pub enum GameCommand {
    Join {
        player_id: String,
        role: DeviceRole,
        response: oneshot::Sender<WelcomeMsg>,
    },
    Leave {
        player_id: String,
        role: DeviceRole,
    },
    PositionUpdate {
        player_id: String,
        pos: [f64; 3],
        vel: [f64; 3],
        finish_time: Option<f64>,
    },
    Tilt {
        player_id: String,
        tilt_x: f64,
        tilt_z: f64,
    },
}

/// Broadcasts from the game loop to all connected replicas
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    PlayerUpdate(PlayerUpdateMsg),
    PlayerLeft { player_id: String },
    PhaseState(PhaseStateMsg),
    GameReset { maze: u32 },
    TiltUpdate { player_id: String, tilt_x: f64, tilt_z: f64 },
}

/// Run the main game loop. Owns all game state.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
) {
    let mut state = GameState::new(&server_config);

    let mut tick_interval =
        tokio::time::interval(Duration::from_millis(server_config.phase_tick_ms));
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let outcome = state.phase_tick();
                if let Some(maze) = outcome.reset_maze {
                    tracing::info!("Round reset, maze {}", maze);
                    let _ = broadcast_tx.send(GameBroadcast::GameReset { maze });
                }
                // Published every tick, changed or not, so lagged replicas
                // resync from the next one they see.
                let _ = broadcast_tx.send(GameBroadcast::PhaseState(outcome.snapshot));
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    GameCommand::Join { player_id, role, response } => {
                        let player = state.handle_join(&player_id, role);
                        let _ = response.send(state.welcome_for(&player_id));
                        let _ = broadcast_tx.send(GameBroadcast::PlayerUpdate(PlayerUpdateMsg {
                            player,
                            phase: state.phases.phase,
                            time_left: state.phases.time_left,
                        }));
                    }
                    GameCommand::Leave { player_id, role } => {
                        match state.handle_leave(&player_id, role) {
                            LeaveEffect::Removed => {
                                tracing::info!("Player {} left", player_id);
                                let _ = broadcast_tx.send(GameBroadcast::PlayerLeft { player_id });
                            }
                            LeaveEffect::Updated(player) => {
                                let _ = broadcast_tx.send(GameBroadcast::PlayerUpdate(PlayerUpdateMsg {
                                    player,
                                    phase: state.phases.phase,
                                    time_left: state.phases.time_left,
                                }));
                            }
                            LeaveEffect::Unknown => {}
                        }
                    }
                    GameCommand::PositionUpdate { player_id, pos, vel, finish_time } => {
                        let updated = state.handle_position_update(
                            &player_id,
                            Vec3::from_array(pos),
                            Vec3::from_array(vel),
                            finish_time,
                        );
                        if let Some(player) = updated {
                            let _ = broadcast_tx.send(GameBroadcast::PlayerUpdate(PlayerUpdateMsg {
                                player,
                                phase: state.phases.phase,
                                time_left: state.phases.time_left,
                            }));
                        }
                    }
                    GameCommand::Tilt { player_id, tilt_x, tilt_z } => {
                        // Pure relay to the display driving this player.
                        let _ = broadcast_tx.send(GameBroadcast::TiltUpdate { player_id, tilt_x, tilt_z });
                    }
                }
            }

            else => break,
        }
    }

    tracing::info!("Game loop ended");
}
