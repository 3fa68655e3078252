use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::GameConfig;

/// Protocol version - increment when making breaking changes.
/// Clients check this and refuse to run against an incompatible server.
pub const PROTOCOL_VERSION: u32 = 1;

/// Which half of a player's device pair a connection represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    /// Phone sending tilt input
    Controller,
    /// Screen running the simulation for its player
    Display,
}

/// Game phase of the shared round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Joining,
    Playing,
    Ended,
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "player_update")]
    PlayerUpdate(PlayerUpdateMsg),
    #[serde(rename = "player_left")]
    PlayerLeft(PlayerLeftMsg),
    #[serde(rename = "phase_state")]
    PhaseState(PhaseStateMsg),
    #[serde(rename = "game_reset")]
    GameReset(GameResetMsg),
    #[serde(rename = "tilt_update")]
    TiltUpdate(TiltUpdateMsg),
}

/// Full synchronization snapshot sent once per connection.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub player_id: String,
    pub players: Vec<PlayerWire>,
    pub phase: Phase,
    pub time_left: u32,
    pub leaderboard: Vec<LeaderboardEntryWire>,
    /// Index into the shared maze catalog
    pub maze: u32,
    pub config: GameConfig,
}

/// A player was created or changed; carries the phase clock so a replica
/// that joined late needs no separate state dump.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateMsg {
    pub player: PlayerWire,
    pub phase: Phase,
    pub time_left: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeftMsg {
    pub player_id: String,
}

/// Published on every phase tick, changed or not, so a lagged replica
/// resynchronizes from the next one it sees.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PhaseStateMsg {
    pub phase: Phase,
    pub time_left: u32,
    pub leaderboard: Vec<LeaderboardEntryWire>,
}

/// Round reset: replicas rebuild the maze from the catalog index and move
/// every surviving player to its start cell with zero velocity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameResetMsg {
    pub maze: u32,
}

/// Controller tilt relayed to the display driving the same player.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TiltUpdateMsg {
    pub player_id: String,
    pub tilt_x: f64,
    pub tilt_z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: String,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    /// Seconds from race start to goal arrival; null while racing
    pub finish_time: Option<f64>,
    pub has_controller: bool,
    pub has_display: bool,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryWire {
    pub player_id: String,
    pub info: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// First message on every connection: who am I, which device am I.
    #[serde(rename = "hello")]
    Hello {
        #[serde(rename = "playerId")]
        player_id: String,
        role: DeviceRole,
    },
    /// Raw tilt sample from a controller, roughly [-1, 1] per axis.
    #[serde(rename = "tilt")]
    Tilt {
        #[serde(rename = "tiltX")]
        tilt_x: f64,
        #[serde(rename = "tiltZ")]
        tilt_z: f64,
    },
    /// Kinematic state computed by the display replica driving this player.
    #[serde(rename = "position_update")]
    PositionUpdate {
        pos: [f64; 3],
        vel: [f64; 3],
        #[serde(rename = "finishTime")]
        finish_time: Option<f64>,
    },
}

// === Conversion helpers ===

/// Round to 4 decimal places (plenty for world coordinates, trims JSON size)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}
