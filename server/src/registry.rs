//! Player registry: the authoritative set of participants and their
//! kinematic state. All operations are total and idempotent; a stale update
//! racing a leave is silently dropped.

use std::collections::HashMap;

use tiltmaze_shared::protocol::DeviceRole;
use tiltmaze_shared::vec3::Vec3;

use crate::player::Player;

/// Outcome of a leave operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The role flag was cleared but the other device is still attached
    RoleDetached,
    /// Both roles are now detached; the player entry was deleted
    Removed,
    /// No such player; nothing happened
    Unknown,
}

/// Outcome of an authoritative position overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied {
        /// The finish time transitioned from null to set on this update
        finished_now: bool,
    },
    /// No such player (expected race with a leave); update dropped
    UnknownPlayer,
}

#[derive(Default)]
pub struct PlayerRegistry {
    players: HashMap<String, Player>,
    joined_total: u32,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-attach. A repeat join for an already-attached role is a
    /// no-op beyond returning the current snapshot.
    pub fn join(&mut self, id: &str, role: DeviceRole, start: Vec3) -> &Player {
        let player = self.players.entry(id.to_string()).or_insert_with(|| {
            let order = self.joined_total;
            self.joined_total += 1;
            Player::new(id.to_string(), start, order)
        });
        player.attach(role);
        player
    }

    /// Clear one role flag; delete the player when both are gone.
    pub fn leave(&mut self, id: &str, role: DeviceRole) -> LeaveOutcome {
        match self.players.get_mut(id) {
            None => LeaveOutcome::Unknown,
            Some(player) => {
                player.detach(role);
                if player.has_any_role() {
                    LeaveOutcome::RoleDetached
                } else {
                    self.players.remove(id);
                    LeaveOutcome::Removed
                }
            }
        }
    }

    /// Authoritative overwrite of a player's kinematic state. The first
    /// non-null finish time wins; later values never change it.
    pub fn update_position(
        &mut self,
        id: &str,
        position: Vec3,
        velocity: Vec3,
        finish_time: Option<f64>,
    ) -> UpdateOutcome {
        match self.players.get_mut(id) {
            None => UpdateOutcome::UnknownPlayer,
            Some(player) => {
                player.position = position;
                player.velocity = velocity;
                let finished_now = player.finish_time.is_none() && finish_time.is_some();
                if finished_now {
                    player.finish_time = finish_time;
                }
                UpdateOutcome::Applied { finished_now }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    /// Players with both device roles attached. These gate the
    /// joining -> playing transition.
    pub fn ready_players(&self) -> Vec<&Player> {
        self.players.values().filter(|p| p.is_ready()).collect()
    }

    /// All players, sorted by join order. This is the iteration order every
    /// consumer sees, so replicas and the leaderboard agree on ties.
    pub fn players_ordered(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.join_order);
        players
    }

    /// Move every surviving player to the start of a fresh maze.
    pub fn reset_all(&mut self, start: Vec3) {
        for player in self.players.values_mut() {
            player.reset_for_round(start);
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::color_for_join_order;
    use tiltmaze_shared::vec3::vec3;

    const START: Vec3 = Vec3 {
        x: -26.0,
        y: 3.5,
        z: -26.0,
    };

    #[test]
    fn join_creates_with_defaults() {
        let mut registry = PlayerRegistry::new();
        let player = registry.join("alice", DeviceRole::Controller, START);
        assert_eq!(player.position, START);
        assert_eq!(player.velocity, Vec3::ZERO);
        assert_eq!(player.finish_time, None);
        assert!(player.has_controller);
        assert!(!player.has_display);
        assert_eq!(player.join_order, 0);
    }

    #[test]
    fn join_is_idempotent() {
        let mut registry = PlayerRegistry::new();
        registry.join("alice", DeviceRole::Controller, START);
        let first = registry.get("alice").unwrap().clone();
        registry.join("alice", DeviceRole::Controller, START);
        let second = registry.get("alice").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(first.color, second.color);
        assert_eq!(first.join_order, second.join_order);
        assert_eq!(first.has_controller, second.has_controller);
        assert_eq!(first.has_display, second.has_display);
    }

    #[test]
    fn second_role_attaches_to_same_entry() {
        let mut registry = PlayerRegistry::new();
        registry.join("alice", DeviceRole::Controller, START);
        registry.join("alice", DeviceRole::Display, START);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ready_players().len(), 1);
    }

    #[test]
    fn colors_cycle_in_join_order() {
        let mut registry = PlayerRegistry::new();
        registry.join("a", DeviceRole::Display, START);
        registry.join("b", DeviceRole::Display, START);
        registry.join("c", DeviceRole::Display, START);
        let colors: Vec<u32> = registry.players_ordered().iter().map(|p| p.color).collect();
        assert_eq!(colors[0], color_for_join_order(0));
        assert_eq!(colors[1], color_for_join_order(1));
        assert_eq!(colors[2], color_for_join_order(2));
    }

    #[test]
    fn full_detach_deletes_player() {
        let mut registry = PlayerRegistry::new();
        registry.join("alice", DeviceRole::Controller, START);
        registry.join("alice", DeviceRole::Display, START);

        assert_eq!(
            registry.leave("alice", DeviceRole::Controller),
            LeaveOutcome::RoleDetached
        );
        assert_eq!(
            registry.leave("alice", DeviceRole::Display),
            LeaveOutcome::Removed
        );
        assert!(registry.get("alice").is_none());
    }

    #[test]
    fn leave_unknown_is_noop() {
        let mut registry = PlayerRegistry::new();
        assert_eq!(
            registry.leave("ghost", DeviceRole::Display),
            LeaveOutcome::Unknown
        );
    }

    #[test]
    fn update_for_deleted_player_is_dropped() {
        let mut registry = PlayerRegistry::new();
        registry.join("alice", DeviceRole::Display, START);
        registry.leave("alice", DeviceRole::Display);
        let outcome =
            registry.update_position("alice", vec3(1.0, 3.5, 1.0), Vec3::ZERO, Some(5.0));
        assert_eq!(outcome, UpdateOutcome::UnknownPlayer);
    }

    #[test]
    fn finish_time_is_set_once() {
        let mut registry = PlayerRegistry::new();
        registry.join("alice", DeviceRole::Display, START);

        let first = registry.update_position("alice", START, Vec3::ZERO, Some(7.5));
        assert_eq!(first, UpdateOutcome::Applied { finished_now: true });

        let second = registry.update_position("alice", START, Vec3::ZERO, Some(99.0));
        assert_eq!(
            second,
            UpdateOutcome::Applied {
                finished_now: false
            }
        );
        assert_eq!(registry.get("alice").unwrap().finish_time, Some(7.5));

        // A null arriving later does not clear it either.
        registry.update_position("alice", START, Vec3::ZERO, None);
        assert_eq!(registry.get("alice").unwrap().finish_time, Some(7.5));
    }

    #[test]
    fn reset_restores_kinematics_but_not_devices() {
        let mut registry = PlayerRegistry::new();
        registry.join("alice", DeviceRole::Controller, START);
        registry.join("alice", DeviceRole::Display, START);
        registry.update_position("alice", vec3(10.0, 3.5, 4.0), vec3(0.2, 0.0, 0.0), Some(3.0));

        let new_start = vec3(-22.0, 3.5, -22.0);
        registry.reset_all(new_start);
        let player = registry.get("alice").unwrap();
        assert_eq!(player.position, new_start);
        assert_eq!(player.velocity, Vec3::ZERO);
        assert_eq!(player.finish_time, None);
        assert!(player.is_ready());
    }

    #[test]
    fn join_order_keeps_counting_after_removals() {
        let mut registry = PlayerRegistry::new();
        registry.join("a", DeviceRole::Display, START);
        registry.leave("a", DeviceRole::Display);
        registry.join("b", DeviceRole::Display, START);
        // "b" is the second human ever seen, not the first.
        assert_eq!(registry.get("b").unwrap().join_order, 1);
    }
}
