/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Lobby countdown before a race can start (seconds)
    pub joining_secs: u32,
    /// Race duration (seconds)
    pub playing_secs: u32,
    /// Result screen duration before the next lobby (seconds)
    pub ended_secs: u32,
    /// Phase tick interval in milliseconds (1000 = the nominal 1 Hz tick;
    /// tests shrink this to run the whole cycle fast)
    pub phase_tick_ms: u64,
    /// Seed for maze selection
    pub rng_seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9001".to_string(),
            joining_secs: 30,
            playing_secs: 120,
            ended_secs: 10,
            phase_tick_ms: 1000,
            rng_seed: 42,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.joining_secs == 0 || self.playing_secs == 0 || self.ended_secs == 0 {
            return Err("phase durations must be at least 1 second".to_string());
        }
        if self.phase_tick_ms == 0 {
            return Err("phase_tick_ms must be at least 1".to_string());
        }
        Ok(())
    }
}
