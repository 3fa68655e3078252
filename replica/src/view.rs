//! Local mirror of the authoritative state.
//!
//! Applying the server's messages in arrival order reproduces the authority's
//! state on every replica; resets are derived locally from the maze catalog
//! index rather than shipped player-by-player.

use tiltmaze_shared::config::GameConfig;
use tiltmaze_shared::maze::Maze;
use tiltmaze_shared::protocol::{LeaderboardEntryWire, Phase, PlayerWire, ServerMsg};
use tiltmaze_shared::vec3::Vec3;

/// Mirrored player entry.
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub id: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub finish_time: Option<f64>,
    pub has_controller: bool,
    pub has_display: bool,
    pub color: u32,
}

pub fn wire_to_player(w: &PlayerWire) -> PlayerView {
    PlayerView {
        id: w.id.clone(),
        position: Vec3::from_array(w.pos),
        velocity: Vec3::from_array(w.vel),
        finish_time: w.finish_time,
        has_controller: w.has_controller,
        has_display: w.has_display,
        color: w.color,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Derived read-only copy of the authoritative game state.
pub struct ReplicaView {
    pub state: ConnectionState,
    pub self_id: String,
    pub protocol_mismatch: bool,

    pub players: Vec<PlayerView>,
    pub phase: Phase,
    pub time_left: u32,
    pub leaderboard: Vec<LeaderboardEntryWire>,
    pub maze: Maze,
    pub config: GameConfig,
}

impl ReplicaView {
    pub fn new(self_id: String) -> Self {
        let config = GameConfig::default();
        let maze = Maze::from_catalog(0, &config);
        Self {
            state: ConnectionState::Connecting,
            self_id,
            protocol_mismatch: false,
            players: Vec::new(),
            phase: Phase::Joining,
            time_left: 0,
            leaderboard: Vec::new(),
            maze,
            config,
        }
    }

    /// Apply one server message. Handlers are idempotent, so replays or a
    /// gap followed by the next full snapshot leave the view consistent.
    pub fn apply(&mut self, msg: &ServerMsg) {
        match msg {
            ServerMsg::Welcome(w) => {
                self.config = w.config.clone();
                self.maze = Maze::from_catalog(w.maze, &self.config);
                self.players = w.players.iter().map(wire_to_player).collect();
                self.phase = w.phase;
                self.time_left = w.time_left;
                self.leaderboard = w.leaderboard.clone();
            }
            ServerMsg::PlayerUpdate(u) => {
                self.upsert(&u.player);
                self.phase = u.phase;
                self.time_left = u.time_left;
            }
            ServerMsg::PlayerLeft(l) => {
                self.players.retain(|p| p.id != l.player_id);
            }
            ServerMsg::PhaseState(p) => {
                self.phase = p.phase;
                self.time_left = p.time_left;
                self.leaderboard = p.leaderboard.clone();
            }
            ServerMsg::GameReset(r) => {
                self.maze = Maze::from_catalog(r.maze, &self.config);
                let start = self.maze.start_world;
                for player in &mut self.players {
                    player.position = start;
                    player.velocity = Vec3::ZERO;
                    player.finish_time = None;
                }
                self.leaderboard.clear();
            }
            // Consumed by the pilot, not the view.
            ServerMsg::TiltUpdate(_) => {}
        }
    }

    pub fn player(&self, id: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut PlayerView> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    fn upsert(&mut self, wire: &PlayerWire) {
        match self.player_mut(&wire.id) {
            Some(player) => *player = wire_to_player(wire),
            None => self.players.push(wire_to_player(wire)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiltmaze_shared::protocol::{
        GameResetMsg, PhaseStateMsg, PlayerLeftMsg, PlayerUpdateMsg, WelcomeMsg,
        PROTOCOL_VERSION,
    };

    fn wire(id: &str, x: f64, finish: Option<f64>) -> PlayerWire {
        PlayerWire {
            id: id.to_string(),
            pos: [x, 3.5, 0.0],
            vel: [0.1, 0.0, 0.0],
            finish_time: finish,
            has_controller: true,
            has_display: true,
            color: 0xd400ff,
        }
    }

    fn welcome(players: Vec<PlayerWire>, maze: u32) -> ServerMsg {
        ServerMsg::Welcome(WelcomeMsg {
            protocol_version: PROTOCOL_VERSION,
            player_id: "me".to_string(),
            players,
            phase: Phase::Joining,
            time_left: 30,
            leaderboard: vec![],
            maze,
            config: GameConfig::default(),
        })
    }

    #[test]
    fn welcome_builds_the_mirror() {
        let mut view = ReplicaView::new("me".to_string());
        view.apply(&welcome(vec![wire("me", -26.0, None), wire("p2", 1.0, None)], 2));
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.maze.index, 2);
        assert_eq!(view.phase, Phase::Joining);
        assert_eq!(view.time_left, 30);
    }

    #[test]
    fn player_update_upserts_and_syncs_clock() {
        let mut view = ReplicaView::new("me".to_string());
        view.apply(&welcome(vec![wire("me", -26.0, None)], 0));

        view.apply(&ServerMsg::PlayerUpdate(PlayerUpdateMsg {
            player: wire("p2", 4.0, None),
            phase: Phase::Playing,
            time_left: 90,
        }));
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.phase, Phase::Playing);
        assert_eq!(view.time_left, 90);

        // Same player again overwrites, no duplicate entry.
        view.apply(&ServerMsg::PlayerUpdate(PlayerUpdateMsg {
            player: wire("p2", 8.0, Some(5.5)),
            phase: Phase::Playing,
            time_left: 89,
        }));
        assert_eq!(view.players.len(), 2);
        let p2 = view.player("p2").unwrap();
        assert_eq!(p2.position.x, 8.0);
        assert_eq!(p2.finish_time, Some(5.5));
    }

    #[test]
    fn player_left_removes_entry() {
        let mut view = ReplicaView::new("me".to_string());
        view.apply(&welcome(vec![wire("me", -26.0, None), wire("p2", 1.0, None)], 0));
        view.apply(&ServerMsg::PlayerLeft(PlayerLeftMsg {
            player_id: "p2".to_string(),
        }));
        assert_eq!(view.players.len(), 1);
        assert!(view.player("p2").is_none());

        // Duplicate delivery is harmless.
        view.apply(&ServerMsg::PlayerLeft(PlayerLeftMsg {
            player_id: "p2".to_string(),
        }));
        assert_eq!(view.players.len(), 1);
    }

    #[test]
    fn phase_state_overwrites_clock_and_board() {
        let mut view = ReplicaView::new("me".to_string());
        view.apply(&welcome(vec![wire("me", -26.0, None)], 0));
        view.apply(&ServerMsg::PhaseState(PhaseStateMsg {
            phase: Phase::Ended,
            time_left: 10,
            leaderboard: vec![LeaderboardEntryWire {
                player_id: "me".to_string(),
                info: "Finished in 9.0s".to_string(),
            }],
        }));
        assert_eq!(view.phase, Phase::Ended);
        assert_eq!(view.leaderboard.len(), 1);
    }

    #[test]
    fn reset_derives_respawn_locally() {
        let mut view = ReplicaView::new("me".to_string());
        view.apply(&welcome(vec![wire("me", 10.0, Some(7.0))], 0));
        view.apply(&ServerMsg::GameReset(GameResetMsg { maze: 1 }));

        assert_eq!(view.maze.index, 1);
        assert!(view.leaderboard.is_empty());
        let me = view.player("me").unwrap();
        assert_eq!(me.position, view.maze.start_world);
        assert_eq!(me.velocity, Vec3::ZERO);
        assert_eq!(me.finish_time, None);
        // Device pairing survives the reset.
        assert!(me.has_controller && me.has_display);
    }
}
