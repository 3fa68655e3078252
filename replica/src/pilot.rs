//! The local physics driver for the player this display replica owns.
//!
//! Whichever replica receives a player's controller input computes that
//! player's physics and publishes it; the authority accepts the writes
//! as-is. The pilot runs only while the phase is `playing` and the player
//! has not finished - outside that window it is idle and produces nothing.

use std::time::Instant;

use tiltmaze_shared::physics;
use tiltmaze_shared::protocol::{round4, ClientMsg, Phase};

use crate::view::ReplicaView;

pub struct Pilot {
    player_id: String,
    tilt_x: f64,
    tilt_z: f64,
    race_start: Option<Instant>,
    finish_time: Option<f64>,
}

impl Pilot {
    pub fn new(player_id: String) -> Self {
        Self {
            player_id,
            tilt_x: 0.0,
            tilt_z: 0.0,
            race_start: None,
            finish_time: None,
        }
    }

    /// Record the latest controller sample. Arrival cadence is whatever the
    /// transport delivers; the sample is held until the next one.
    pub fn set_tilt(&mut self, tilt_x: f64, tilt_z: f64) {
        self.tilt_x = tilt_x;
        self.tilt_z = tilt_z;
    }

    /// Track phase changes: arm the race clock on the first `playing`
    /// observation, drop stale race state when a new lobby opens.
    pub fn observe_phase(&mut self, phase: Phase) {
        match phase {
            Phase::Playing => {
                if self.race_start.is_none() {
                    self.race_start = Some(Instant::now());
                }
            }
            Phase::Joining => {
                self.race_start = None;
                self.finish_time = None;
                self.tilt_x = 0.0;
                self.tilt_z = 0.0;
            }
            Phase::Ended => {}
        }
    }

    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    /// One integration tick. Updates the local mirror and returns the
    /// position update to publish, or None while idle.
    pub fn step(&mut self, view: &mut ReplicaView) -> Option<ClientMsg> {
        if view.phase != Phase::Playing || self.finish_time.is_some() {
            return None;
        }

        let (position, velocity) = {
            let player = view.player(&self.player_id)?;
            (player.position, player.velocity)
        };

        let result = physics::step(
            &view.config,
            &view.maze,
            position,
            velocity,
            self.tilt_x,
            self.tilt_z,
        );

        if result.reached_goal {
            self.finish_time = self
                .race_start
                .map(|start| start.elapsed().as_secs_f64());
        }

        // Keep the mirror current so rendering follows without a round trip.
        if let Some(player) = view.player_mut(&self.player_id) {
            player.position = result.position;
            player.velocity = result.velocity;
            player.finish_time = self.finish_time;
        }

        Some(ClientMsg::PositionUpdate {
            pos: [
                round4(result.position.x),
                round4(result.position.y),
                round4(result.position.z),
            ],
            vel: [
                round4(result.velocity.x),
                round4(result.velocity.y),
                round4(result.velocity.z),
            ],
            finish_time: self.finish_time,
        })
    }
}
