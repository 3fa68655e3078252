//! Bot pilots that synthesize phone-tilt input.
//!
//! Used by the load test to exercise the full join -> tilt -> physics ->
//! position-update pipeline with plausible input streams.

use rand::Rng;

/// Bot personality affects how often and how hard the phone "tilts"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotPersonality {
    /// Holds a direction for a while, firm tilt
    Steady,
    /// Frequent small corrections
    Wobbly,
    /// Unpredictable timing and amplitude
    Chaotic,
}

impl BotPersonality {
    /// Seconds between direction changes (min, max)
    fn retarget_range(&self) -> (f64, f64) {
        match self {
            BotPersonality::Steady => (2.0, 4.0),
            BotPersonality::Wobbly => (0.5, 1.5),
            BotPersonality::Chaotic => (0.1, 2.5),
        }
    }

    /// Tilt magnitude for a fresh direction
    fn amplitude(&self, rng: &mut impl Rng) -> f64 {
        match self {
            BotPersonality::Steady => 0.7 + rng.gen::<f64>() * 0.3, // 0.7-1.0
            BotPersonality::Wobbly => 0.3 + rng.gen::<f64>() * 0.5, // 0.3-0.8
            BotPersonality::Chaotic => 0.1 + rng.gen::<f64>() * 0.9, // 0.1-1.0
        }
    }

    fn random_delay(&self, rng: &mut impl Rng) -> f64 {
        let (min, max) = self.retarget_range();
        min + rng.gen::<f64>() * (max - min)
    }

    /// Select a random personality
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => BotPersonality::Steady,
            1 => BotPersonality::Wobbly,
            _ => BotPersonality::Chaotic,
        }
    }
}

/// A synthetic controller: call `tick` at any cadence, read the held sample.
#[derive(Debug)]
pub struct BotPilot {
    pub personality: BotPersonality,
    tilt_x: f64,
    tilt_z: f64,
    retarget_in: f64,
}

impl BotPilot {
    pub fn new(personality: BotPersonality, rng: &mut impl Rng) -> Self {
        let mut bot = Self {
            personality,
            tilt_x: 0.0,
            tilt_z: 0.0,
            retarget_in: 0.0,
        };
        bot.retarget(rng);
        bot
    }

    /// Advance the bot clock and return the current tilt sample.
    pub fn tick(&mut self, dt: f64, rng: &mut impl Rng) -> (f64, f64) {
        self.retarget_in -= dt;
        if self.retarget_in <= 0.0 {
            self.retarget(rng);
        }
        (self.tilt_x, self.tilt_z)
    }

    fn retarget(&mut self, rng: &mut impl Rng) {
        let angle = rng.gen::<f64>() * std::f64::consts::TAU;
        let amplitude = self.personality.amplitude(rng);
        self.tilt_x = angle.cos() * amplitude;
        self.tilt_z = angle.sin() * amplitude;
        self.retarget_in = self.personality.random_delay(rng);
    }
}
