//! Published signal state shared between the audio thread and the frame loop.
//!
//! The extractor runs on the capture callback thread and the frame scheduler
//! reads once per frame, so the whole contract is consistent reads of three
//! scalars. Each field is an independently meaningful `AtomicU32` bit-cast
//! float; tearing across fields is tolerated by design.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytemuck::{Pod, Zeroable};

/// Smoothed perceptual audio signals, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioSignals {
    /// Perceptual loudness
    pub level: f32,
    /// High-vs-low spectral-energy ratio
    pub frequency: f32,
    /// Derived combination of the two
    pub intensity: f32,
}

/// Lock-free publication point for [`AudioSignals`].
#[derive(Debug, Default)]
pub struct SignalHub {
    level: AtomicU32,
    frequency: AtomicU32,
    intensity: AtomicU32,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new set of signals (audio thread).
    pub fn publish(&self, signals: AudioSignals) {
        self.level.store(signals.level.to_bits(), Ordering::Relaxed);
        self.frequency
            .store(signals.frequency.to_bits(), Ordering::Relaxed);
        self.intensity
            .store(signals.intensity.to_bits(), Ordering::Relaxed);
    }

    /// Read the current signals by value (frame loop, overlay UI).
    ///
    /// Safe to poll at any rate; has no side effects.
    pub fn audio(&self) -> AudioSignals {
        AudioSignals {
            level: f32::from_bits(self.level.load(Ordering::Relaxed)),
            frequency: f32::from_bits(self.frequency.load(Ordering::Relaxed)),
            intensity: f32::from_bits(self.intensity.load(Ordering::Relaxed)),
        }
    }
}

/// Decaying touch pulse, owned and ticked by the frame scheduler.
#[derive(Debug, Clone)]
pub struct TouchTransient {
    value: f32,
    decay_per_frame: f32,
    epsilon: f32,
}

impl TouchTransient {
    pub fn new(decay_per_frame: f32, epsilon: f32) -> Self {
        Self {
            value: 0.0,
            decay_per_frame,
            epsilon,
        }
    }

    /// Set the pulse to full strength.
    pub fn trigger(&mut self) {
        self.value = 1.0;
    }

    /// Apply one frame of geometric decay.
    pub fn decay_frame(&mut self) {
        self.value *= self.decay_per_frame;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// True once the pulse has faded below the negligible threshold.
    pub fn is_negligible(&self) -> bool {
        self.value < self.epsilon
    }
}

/// Discrete events the window/input collaborator fires into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Tap on the orb: full-strength touch pulse
    Touch,
    /// Forwarded to the overlay collaborator (emoji feedback)
    ShowEmoji,
    /// Begin a countdown session of the given length
    StartTimer(Duration),
    /// Cancel the session early (skips the completion flash)
    StopTimer,
}

/// Everything the presentation layer can poll, read by value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SignalSnapshot {
    pub level: f32,
    pub frequency: f32,
    pub intensity: f32,
    pub touch: f32,
    pub timer_progress: f32,
    pub timer_flash: f32,
}

/// Per-frame uniform snapshot handed to both the compute and render passes.
///
/// Field order and padding match the WGSL `FrameUniforms` structs in
/// `sim.wgsl` and `orb.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub dt: f32,
    pub level: f32,
    pub frequency: f32,
    pub intensity: f32,
    pub touch: f32,
    pub timer_progress: f32,
    pub timer_flash: f32,
    pub _padding: [f32; 2],
}

impl FrameUniforms {
    pub fn new(resolution: [f32; 2], time: f32, dt: f32, snapshot: &SignalSnapshot) -> Self {
        Self {
            resolution,
            time,
            dt,
            level: snapshot.level,
            frequency: snapshot.frequency,
            intensity: snapshot.intensity,
            touch: snapshot.touch,
            timer_progress: snapshot.timer_progress,
            timer_flash: snapshot.timer_flash,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_roundtrips_published_values() {
        let hub = SignalHub::new();
        assert_eq!(hub.audio(), AudioSignals::default());

        let signals = AudioSignals {
            level: 0.75,
            frequency: 0.4,
            intensity: 0.575,
        };
        hub.publish(signals);
        assert_eq!(hub.audio(), signals);

        // Polling repeatedly must not change anything.
        for _ in 0..10 {
            assert_eq!(hub.audio(), signals);
        }
    }

    #[test]
    fn touch_decays_geometrically() {
        let mut touch = TouchTransient::new(0.92, 1.0e-3);
        touch.trigger();
        for _ in 0..10 {
            touch.decay_frame();
        }
        assert!((touch.value() - 0.92_f32.powi(10)).abs() < 1.0e-6);
        assert!((touch.value() - 0.434).abs() < 0.001);

        for _ in 0..50 {
            touch.decay_frame();
        }
        assert!(touch.value() < 0.01);
        assert!(touch.value() > 0.0, "pulse decays but never goes negative");
    }

    #[test]
    fn touch_negligible_below_epsilon() {
        let mut touch = TouchTransient::new(0.92, 1.0e-3);
        touch.trigger();
        assert!(!touch.is_negligible());
        for _ in 0..100 {
            touch.decay_frame();
        }
        assert!(touch.is_negligible());
    }

    #[test]
    fn frame_uniforms_layout_matches_wgsl() {
        // The WGSL structs assume a 48-byte layout with the pad at offset 40.
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 48);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }
}
