//! Session (countdown) timer state machine.
//!
//! Output is one more modulation signal for the renderer: progress while
//! running, plus a red completion flash that fades linearly over five
//! seconds. Time is passed in explicitly so the frame loop drives it with
//! wall-clock and the tests drive it with simulated seconds.

use std::time::Duration;

use tracing::info;

use crate::params::TimerConfig;

/// Timer output consumed read-only by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimerSignal {
    /// elapsed / duration, clamped to [0, 1]
    pub progress: f32,
    /// Post-completion flash, 1.0 at completion fading linearly to 0
    pub completion_flash: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Flashing,
}

pub struct SessionTimer {
    config: TimerConfig,
    state: TimerState,
    duration_s: f64,
    started_at_s: f64,
    last_tick_s: f64,
    progress: f32,
    completion_flash: f32,
}

impl SessionTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            state: TimerState::Idle,
            duration_s: 0.0,
            started_at_s: 0.0,
            last_tick_s: 0.0,
            progress: 0.0,
            completion_flash: 0.0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn signal(&self) -> TimerSignal {
        TimerSignal {
            progress: self.progress,
            completion_flash: self.completion_flash,
        }
    }

    /// Start a session, cancelling any in-flight timer or flash.
    pub fn start(&mut self, duration: Duration, now_s: f64) {
        self.state = TimerState::Running;
        self.duration_s = duration.as_secs_f64();
        self.started_at_s = now_s;
        self.last_tick_s = now_s;
        self.progress = 0.0;
        self.completion_flash = 0.0;
        info!(minutes = (self.duration_s / 60.0) as u32, "session started");
    }

    /// Stop early: skips the completion flash entirely.
    pub fn stop(&mut self) {
        if self.state != TimerState::Idle {
            info!("session stopped");
        }
        self.state = TimerState::Idle;
        self.progress = 0.0;
        self.completion_flash = 0.0;
    }

    /// Advance the state machine; call every frame.
    pub fn tick(&mut self, now_s: f64) {
        match self.state {
            TimerState::Idle => {}
            TimerState::Running => {
                if now_s - self.last_tick_s < self.config.tick_interval_s {
                    return;
                }
                self.last_tick_s = now_s;

                let elapsed = now_s - self.started_at_s;
                if self.duration_s > 0.0 {
                    self.progress = (elapsed / self.duration_s).clamp(0.0, 1.0) as f32;
                }
                if elapsed >= self.duration_s {
                    self.progress = 1.0;
                    self.completion_flash = 1.0;
                    self.state = TimerState::Flashing;
                    info!("session complete");
                }
            }
            TimerState::Flashing => {
                let ticks = ((now_s - self.last_tick_s) / self.config.flash_interval_s) as u32;
                if ticks == 0 {
                    return;
                }
                self.last_tick_s += ticks as f64 * self.config.flash_interval_s;
                self.completion_flash =
                    (self.completion_flash - self.config.flash_step * ticks as f32).max(0.0);
                if self.completion_flash <= 0.0 {
                    self.state = TimerState::Idle;
                    self.progress = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> SessionTimer {
        SessionTimer::new(TimerConfig::default())
    }

    #[test]
    fn idle_timer_reports_zero() {
        let mut t = timer();
        t.tick(100.0);
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.signal(), TimerSignal::default());
    }

    #[test]
    fn progress_tracks_elapsed_over_duration() {
        let mut t = timer();
        t.start(Duration::from_secs(600), 0.0);
        t.tick(300.0);
        assert_eq!(t.state(), TimerState::Running);
        assert!((t.signal().progress - 0.5).abs() < 1.0e-3);
    }

    #[test]
    fn ticks_are_rate_limited_while_running() {
        let mut t = timer();
        t.start(Duration::from_secs(600), 0.0);
        // Below the 0.1s tick interval: progress untouched.
        t.tick(0.05);
        assert_eq!(t.signal().progress, 0.0);
        t.tick(0.2);
        assert!(t.signal().progress > 0.0);
    }

    #[test]
    fn completion_enters_flash_then_fades_to_idle() {
        let mut t = timer();
        t.start(Duration::from_secs(600), 0.0);

        t.tick(600.0);
        assert_eq!(t.state(), TimerState::Flashing);
        assert_eq!(t.signal().progress, 1.0);
        assert_eq!(t.signal().completion_flash, 1.0);

        // 0.01 per 0.05s tick: gone after 5 seconds.
        let mut now = 600.0;
        while now < 605.5 {
            now += 0.05;
            t.tick(now);
        }
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.signal().completion_flash, 0.0);
        assert_eq!(t.signal().progress, 0.0);
    }

    #[test]
    fn flash_fade_is_linear() {
        let mut t = timer();
        t.start(Duration::from_secs(10), 0.0);
        t.tick(10.0);

        t.tick(12.5); // halfway through the 5s fade
        let flash = t.signal().completion_flash;
        assert!((flash - 0.5).abs() < 0.02);
    }

    #[test]
    fn early_stop_skips_the_flash() {
        let mut t = timer();
        t.start(Duration::from_secs(600), 0.0);
        t.tick(300.0);
        t.stop();
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.signal().completion_flash, 0.0);
    }

    #[test]
    fn restart_while_flashing_is_a_fresh_start() {
        let mut t = timer();
        t.start(Duration::from_secs(10), 0.0);
        t.tick(10.0);
        assert_eq!(t.state(), TimerState::Flashing);

        t.start(Duration::from_secs(60), 11.0);
        assert_eq!(t.state(), TimerState::Running);
        assert_eq!(t.signal().completion_flash, 0.0);
        assert_eq!(t.signal().progress, 0.0);
    }
}
