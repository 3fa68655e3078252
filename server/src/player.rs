use tiltmaze_shared::protocol::{round4, DeviceRole, PlayerWire};
use tiltmaze_shared::vec3::Vec3;

/// One human participant. Exists while at least one device role is attached;
/// identity and color survive round resets, kinematics do not.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds from race start to goal arrival; set once per round
    pub finish_time: Option<f64>,
    pub has_controller: bool,
    pub has_display: bool,
    pub color: u32,
    /// Monotonic join sequence; drives color assignment and tie ordering
    pub join_order: u32,
}

/// Fixed neon palette, cycled by join order.
pub const PALETTE: [u32; 8] = [
    0xd400ff, // magenta
    0x00f7ff, // cyan
    0x39ff14, // green
    0xffe600, // yellow
    0xff6ec7, // pink
    0xff5e00, // orange
    0x4d6fff, // blue
    0x00ffa3, // mint
];

pub fn color_for_join_order(order: u32) -> u32 {
    PALETTE[order as usize % PALETTE.len()]
}

impl Player {
    pub fn new(id: String, start: Vec3, join_order: u32) -> Self {
        Self {
            id,
            position: start,
            velocity: Vec3::ZERO,
            finish_time: None,
            has_controller: false,
            has_display: false,
            color: color_for_join_order(join_order),
            join_order,
        }
    }

    /// Both device roles attached?
    pub fn is_ready(&self) -> bool {
        self.has_controller && self.has_display
    }

    pub fn attach(&mut self, role: DeviceRole) {
        match role {
            DeviceRole::Controller => self.has_controller = true,
            DeviceRole::Display => self.has_display = true,
        }
    }

    pub fn detach(&mut self, role: DeviceRole) {
        match role {
            DeviceRole::Controller => self.has_controller = false,
            DeviceRole::Display => self.has_display = false,
        }
    }

    pub fn has_any_role(&self) -> bool {
        self.has_controller || self.has_display
    }

    /// Back to the start cell of a fresh maze; device flags untouched.
    pub fn reset_for_round(&mut self, start: Vec3) {
        self.position = start;
        self.velocity = Vec3::ZERO;
        self.finish_time = None;
    }

    pub fn to_wire(&self) -> PlayerWire {
        PlayerWire {
            id: self.id.clone(),
            pos: [
                round4(self.position.x),
                round4(self.position.y),
                round4(self.position.z),
            ],
            vel: [
                round4(self.velocity.x),
                round4(self.velocity.y),
                round4(self.velocity.z),
            ],
            finish_time: self.finish_time,
            has_controller: self.has_controller,
            has_display: self.has_display,
            color: self.color,
        }
    }
}
