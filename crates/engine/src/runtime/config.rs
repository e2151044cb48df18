use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_tps: u32,
    /// Upper bound on scheduler ticks; `None` runs until every script ends.
    pub max_ticks: Option<u64>,
    pub stop_when_idle: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: Some(600),
            stop_when_idle: true,
        }
    }
}

impl RunConfig {
    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}
