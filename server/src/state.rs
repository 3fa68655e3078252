//! Central authoritative state owned by the game loop task.
//!
//! Handlers mutate state and return plain effect values; all publishing
//! happens in the game loop, so this type stays headless and testable.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tiltmaze_shared::config::GameConfig;
use tiltmaze_shared::maze::{catalog, Maze};
use tiltmaze_shared::protocol::{
    DeviceRole, LeaderboardEntryWire, Phase, PhaseStateMsg, PlayerWire, WelcomeMsg,
    PROTOCOL_VERSION,
};
use tiltmaze_shared::vec3::Vec3;

use crate::config::ServerConfig;
use crate::leaderboard;
use crate::phase::{PhaseController, PhaseTimers, Transition};
use crate::registry::{LeaveOutcome, PlayerRegistry, UpdateOutcome};

/// Effect of a leave, with the snapshot to publish when the player survives.
pub enum LeaveEffect {
    Removed,
    Updated(PlayerWire),
    Unknown,
}

/// Result of one phase tick.
pub struct TickOutcome {
    /// Snapshot to broadcast unconditionally
    pub snapshot: PhaseStateMsg,
    /// New maze index when this tick performed the ended -> joining reset
    pub reset_maze: Option<u32>,
    pub transition: Transition,
}

pub struct GameState {
    pub config: GameConfig,
    pub registry: PlayerRegistry,
    pub phases: PhaseController,
    pub maze: Maze,
    pub leaderboard: Vec<LeaderboardEntryWire>,
    rng: ChaCha8Rng,
}

impl GameState {
    pub fn new(server_config: &ServerConfig) -> Self {
        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(server_config.rng_seed);
        let index = rng.gen_range(0..catalog().len()) as u32;
        let maze = Maze::from_catalog(index, &config);

        Self {
            config,
            registry: PlayerRegistry::new(),
            phases: PhaseController::new(PhaseTimers {
                joining: server_config.joining_secs,
                playing: server_config.playing_secs,
                ended: server_config.ended_secs,
            }),
            maze,
            leaderboard: Vec::new(),
            rng,
        }
    }

    /// Attach a device; creates the player at the start cell on first join.
    pub fn handle_join(&mut self, id: &str, role: DeviceRole) -> PlayerWire {
        let start = self.maze.start_world;
        self.registry.join(id, role, start).to_wire()
    }

    pub fn handle_leave(&mut self, id: &str, role: DeviceRole) -> LeaveEffect {
        match self.registry.leave(id, role) {
            LeaveOutcome::Removed => LeaveEffect::Removed,
            LeaveOutcome::RoleDetached => match self.registry.get(id) {
                Some(player) => LeaveEffect::Updated(player.to_wire()),
                None => LeaveEffect::Unknown,
            },
            LeaveOutcome::Unknown => LeaveEffect::Unknown,
        }
    }

    /// Accept an advisory-authoritative kinematic write. Returns the snapshot
    /// to publish, or None when the player is already gone.
    pub fn handle_position_update(
        &mut self,
        id: &str,
        position: Vec3,
        velocity: Vec3,
        finish_time: Option<f64>,
    ) -> Option<PlayerWire> {
        match self
            .registry
            .update_position(id, position, velocity, finish_time)
        {
            UpdateOutcome::UnknownPlayer => None,
            UpdateOutcome::Applied { finished_now } => {
                if finished_now {
                    self.recompute_leaderboard();
                }
                self.registry.get(id).map(|p| p.to_wire())
            }
        }
    }

    /// Advance the round cycle by one second.
    pub fn phase_tick(&mut self) -> TickOutcome {
        let transition = self.phases.tick(self.registry.ready_players().len());

        let mut reset_maze = None;
        match transition {
            Transition::RaceEnded => self.recompute_leaderboard(),
            Transition::ResetToJoining => reset_maze = Some(self.reset_round()),
            _ => {}
        }
        // Keep distance entries live while a race is running.
        if self.phases.phase == Phase::Playing {
            self.recompute_leaderboard();
        }

        TickOutcome {
            snapshot: self.phase_snapshot(),
            reset_maze,
            transition,
        }
    }

    pub fn phase_snapshot(&self) -> PhaseStateMsg {
        PhaseStateMsg {
            phase: self.phases.phase,
            time_left: self.phases.time_left,
            leaderboard: self.leaderboard.clone(),
        }
    }

    pub fn players_wire(&self) -> Vec<PlayerWire> {
        self.registry
            .players_ordered()
            .iter()
            .map(|p| p.to_wire())
            .collect()
    }

    pub fn welcome_for(&self, player_id: &str) -> WelcomeMsg {
        WelcomeMsg {
            protocol_version: PROTOCOL_VERSION,
            player_id: player_id.to_string(),
            players: self.players_wire(),
            phase: self.phases.phase,
            time_left: self.phases.time_left,
            leaderboard: self.leaderboard.clone(),
            maze: self.maze.index,
            config: self.config.clone(),
        }
    }

    fn recompute_leaderboard(&mut self) {
        let players = self.registry.players_ordered();
        self.leaderboard = leaderboard::rank(&players, self.maze.goal_world);
    }

    /// Pick a fresh maze, respawn everyone, clear the board.
    fn reset_round(&mut self) -> u32 {
        let index = self.rng.gen_range(0..catalog().len()) as u32;
        self.maze = Maze::from_catalog(index, &self.config);
        self.registry.reset_all(self.maze.start_world);
        self.leaderboard.clear();
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiltmaze_shared::vec3::vec3;

    fn test_config() -> ServerConfig {
        ServerConfig {
            joining_secs: 3,
            playing_secs: 5,
            ended_secs: 2,
            rng_seed: 12345,
            ..Default::default()
        }
    }

    fn ready_player(state: &mut GameState, id: &str) {
        state.handle_join(id, DeviceRole::Controller);
        state.handle_join(id, DeviceRole::Display);
    }

    #[test]
    fn join_spawns_at_maze_start() {
        let mut state = GameState::new(&test_config());
        let wire = state.handle_join("alice", DeviceRole::Display);
        assert_eq!(wire.pos[0], state.maze.start_world.x);
        assert_eq!(wire.pos[2], state.maze.start_world.z);
        assert_eq!(wire.finish_time, None);
    }

    #[test]
    fn maze_selection_is_seed_deterministic() {
        let a = GameState::new(&test_config());
        let b = GameState::new(&test_config());
        assert_eq!(a.maze.index, b.maze.index);
    }

    #[test]
    fn lobby_restarts_with_no_ready_players() {
        let mut state = GameState::new(&test_config());
        state.handle_join("alice", DeviceRole::Display); // display only, not ready
        for _ in 0..2 {
            assert_eq!(state.phase_tick().transition, Transition::None);
        }
        let outcome = state.phase_tick();
        assert_eq!(outcome.transition, Transition::JoiningRestarted);
        assert_eq!(outcome.snapshot.phase, Phase::Joining);
        assert_eq!(outcome.snapshot.time_left, 3);
    }

    #[test]
    fn race_starts_with_a_ready_player() {
        let mut state = GameState::new(&test_config());
        ready_player(&mut state, "alice");
        for _ in 0..2 {
            state.phase_tick();
        }
        let outcome = state.phase_tick();
        assert_eq!(outcome.transition, Transition::RaceStarted);
        assert_eq!(outcome.snapshot.phase, Phase::Playing);
        assert_eq!(outcome.snapshot.time_left, 5);
    }

    #[test]
    fn finish_update_recomputes_leaderboard() {
        let mut state = GameState::new(&test_config());
        ready_player(&mut state, "alice");
        ready_player(&mut state, "bob");

        state.handle_position_update("alice", vec3(22.0, 3.5, 22.0), Vec3::ZERO, Some(8.2));
        assert_eq!(state.leaderboard.len(), 2);
        assert_eq!(state.leaderboard[0].player_id, "alice");
        assert!(state.leaderboard[0].info.starts_with("Finished in 8.2"));
        assert!(state.leaderboard[1].info.starts_with("Distance:"));
    }

    #[test]
    fn update_for_unknown_player_is_dropped() {
        let mut state = GameState::new(&test_config());
        assert!(state
            .handle_position_update("ghost", Vec3::ZERO, Vec3::ZERO, None)
            .is_none());
    }

    #[test]
    fn playing_ticks_keep_leaderboard_live() {
        let mut state = GameState::new(&test_config());
        ready_player(&mut state, "alice");
        for _ in 0..3 {
            state.phase_tick();
        }
        assert_eq!(state.phases.phase, Phase::Playing);
        // Move closer to the goal; next tick refreshes the distance entry.
        let goal = state.maze.goal_world;
        state
            .registry
            .update_position("alice", vec3(goal.x - 5.0, 3.5, goal.z), Vec3::ZERO, None);
        let outcome = state.phase_tick();
        assert_eq!(outcome.snapshot.leaderboard[0].info, "Distance: 5.00");
    }

    #[test]
    fn full_cycle_resets_players_and_board() {
        let mut state = GameState::new(&test_config());
        ready_player(&mut state, "alice");

        // joining (3 ticks) -> playing
        for _ in 0..3 {
            state.phase_tick();
        }
        state.handle_position_update("alice", vec3(22.0, 3.5, 22.0), Vec3::ZERO, Some(2.0));

        // playing (5) -> ended
        let mut saw_ended = false;
        for _ in 0..5 {
            if state.phase_tick().transition == Transition::RaceEnded {
                saw_ended = true;
            }
        }
        assert!(saw_ended);
        assert!(!state.leaderboard.is_empty());

        // ended (2) -> joining with full reset
        let mut reset = None;
        for _ in 0..2 {
            let outcome = state.phase_tick();
            if outcome.reset_maze.is_some() {
                reset = outcome.reset_maze;
            }
        }
        assert!(reset.is_some());
        assert_eq!(state.phases.phase, Phase::Joining);
        assert!(state.leaderboard.is_empty());

        let player = state.registry.get("alice").unwrap();
        assert_eq!(player.finish_time, None);
        assert_eq!(player.position, state.maze.start_world);
        assert!(player.is_ready());
    }

    #[test]
    fn welcome_carries_full_sync_state() {
        let mut state = GameState::new(&test_config());
        ready_player(&mut state, "alice");
        let welcome = state.welcome_for("alice");
        assert_eq!(welcome.protocol_version, PROTOCOL_VERSION);
        assert_eq!(welcome.players.len(), 1);
        assert_eq!(welcome.maze, state.maze.index);
        assert_eq!(welcome.phase, Phase::Joining);
        assert_eq!(welcome.time_left, 3);
    }
}
