//! Frame clock
//!
//! Wall-clock elapsed time for the session, sampled once per frame so every
//! consumer (shader uniforms, spin animation) sees the same instant.

use std::time::Instant;

pub struct FrameClock {
    started: Instant,
    elapsed: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            elapsed: 0.0,
        }
    }

    /// Samples the clock. Call once at the top of the frame.
    pub fn tick(&mut self) -> f32 {
        self.elapsed = self.started.elapsed().as_secs_f32();
        self.elapsed
    }

    /// Elapsed seconds as of the last tick.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_monotonic() {
        let mut clock = FrameClock::new();
        let first = clock.tick();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = clock.tick();
        assert!(second > first);
        assert_eq!(clock.elapsed(), second);
    }
}
