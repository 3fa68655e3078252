use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Game tuning shared by the authority and every replica.
///
/// Sent to each client inside the welcome message so that a display replica
/// integrates physics with exactly the values the authority expects.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../controller/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Side length of one maze cell in world units
    pub cell_size: f64,
    /// Wall box height (rendering only; collisions are 2D)
    pub wall_height: f64,
    /// Collision radius of the player sphere
    pub ball_radius: f64,
    /// Fixed y of every sphere; the vertical axis is not simulated
    pub ball_height: f64,
    /// Horizontal distance to the goal below which a player finishes
    pub capture_radius: f64,
    /// Target speed at full tilt (world units per tick)
    pub tilt_speed: f64,
    /// Per-tick interpolation factor from current toward target velocity
    pub velocity_blend: f64,
    /// Per-tick friction multiplier
    pub damping: f64,
    /// Below this tilt magnitude and speed, velocity snaps to zero
    pub rest_threshold: f64,
    /// Velocity kept on the contact axis after a wall hit (0 = dead stop)
    pub wall_restitution: f64,
    /// Clearance pushed beyond exact wall contact to avoid re-collision
    pub collision_epsilon: f64,
    /// Extra margin kept from the outer bounds when clamping
    pub bounds_margin: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            wall_height: 3.0,
            ball_radius: 1.0,
            ball_height: 3.5,
            capture_radius: 3.0,
            tilt_speed: 0.6,
            velocity_blend: 0.15,
            damping: 0.99,
            rest_threshold: 0.01,
            wall_restitution: 0.0,
            collision_epsilon: 0.01,
            bounds_margin: 0.1,
        }
    }
}
