use std::time::{Duration, Instant};
use tracing::debug;

/// Timed section of work. Logs `Starting` on creation and `Time Elapsed`
/// when dropped.
pub struct Topic {
    name: String,
    started: Instant,
}

impl Topic {
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(topic = %name, "Starting");
        Self {
            name,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Topic {
    fn drop(&mut self) {
        debug!(
            topic = %self.name,
            seconds = self.started.elapsed().as_secs_f64(),
            "Time Elapsed"
        );
    }
}
