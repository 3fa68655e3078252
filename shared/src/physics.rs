//! Per-tick sphere physics: tilt-driven velocity blending, wall collision
//! resolution and goal detection.
//!
//! Pure functions over [`GameConfig`] and [`Maze`]; the display replica that
//! owns a player's controller input runs these and publishes the result, so
//! no I/O or clocks live here.

use crate::config::GameConfig;
use crate::maze::{Maze, Wall};
use crate::vec3::{horizontal_distance, horizontal_length, vec3, Vec3};

/// Outcome of one integration tick.
#[derive(Debug, Clone, Copy)]
pub struct StepResult {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Whether the position ended within the goal capture radius
    pub reached_goal: bool,
}

/// Push a candidate position out of every overlapping wall.
///
/// The sphere is treated as a square AABB of its diameter. Each wall is
/// resolved along its smaller-penetration axis (X wins exact ties, which
/// keeps every replica's resolution identical), with an epsilon of clearance
/// beyond exact contact. Corrections apply sequentially in wall order; this
/// is not a simultaneous multi-contact solve, and concave corners can see
/// minor tunneling. Always returns a usable pair.
pub fn resolve_walls(
    config: &GameConfig,
    walls: &[Wall],
    position: Vec3,
    velocity: Vec3,
) -> (Vec3, Vec3) {
    let mut pos = position;
    let mut vel = velocity;
    let radius = config.ball_radius;

    for wall in walls {
        let reach_x = wall.half_x + radius;
        let reach_z = wall.half_z + radius;
        let dx = pos.x - wall.center.x;
        let dz = pos.z - wall.center.z;

        if dx.abs() < reach_x && dz.abs() < reach_z {
            let pen_x = reach_x - dx.abs();
            let pen_z = reach_z - dz.abs();

            if pen_x <= pen_z {
                let normal = if dx > 0.0 { 1.0 } else { -1.0 };
                pos.x = wall.center.x + normal * (reach_x + config.collision_epsilon);
                vel.x = -vel.x * config.wall_restitution;
            } else {
                let normal = if dz > 0.0 { 1.0 } else { -1.0 };
                pos.z = wall.center.z + normal * (reach_z + config.collision_epsilon);
                vel.z = -vel.z * config.wall_restitution;
            }
        }
    }

    (pos, vel)
}

/// Advance one player by one tick under the current tilt sample.
///
/// Tilt components are expected in roughly [-1, 1]; the sample is held
/// between arrivals, so irregular input cadence only changes how often the
/// target velocity moves, never the integration itself.
pub fn step(
    config: &GameConfig,
    maze: &Maze,
    position: Vec3,
    velocity: Vec3,
    tilt_x: f64,
    tilt_z: f64,
) -> StepResult {
    let mut vel = velocity;

    // Blend toward the tilt target for smooth acceleration.
    let target_x = tilt_x * config.tilt_speed;
    let target_z = tilt_z * config.tilt_speed;
    vel.x += (target_x - vel.x) * config.velocity_blend;
    vel.z += (target_z - vel.z) * config.velocity_blend;

    // Friction, with a snap to rest so the sphere never drifts forever.
    vel.x *= config.damping;
    vel.z *= config.damping;
    let tilt_mag = (tilt_x * tilt_x + tilt_z * tilt_z).sqrt();
    if tilt_mag < config.rest_threshold && horizontal_length(vel) < config.rest_threshold {
        vel.x = 0.0;
        vel.z = 0.0;
    }

    let candidate = vec3(position.x + vel.x, position.y, position.z + vel.z);
    let (mut pos, mut vel) = resolve_walls(config, &maze.walls, candidate, vel);

    // Outer bounds clamp, per axis; hitting a bound kills that component.
    let limit = maze.half_size - config.ball_radius - config.bounds_margin;
    if pos.x > limit {
        pos.x = limit;
        vel.x = 0.0;
    } else if pos.x < -limit {
        pos.x = -limit;
        vel.x = 0.0;
    }
    if pos.z > limit {
        pos.z = limit;
        vel.z = 0.0;
    } else if pos.z < -limit {
        pos.z = -limit;
        vel.z = 0.0;
    }

    pos.y = config.ball_height;

    let reached_goal = horizontal_distance(pos, maze.goal_world) < config.capture_radius;

    StepResult {
        position: pos,
        velocity: vel,
        reached_goal,
    }
}
