//! Parameter definitions with documented units and defaults.
//!
//! All magic numbers live here with:
//! - Units (seconds, normalized-device coordinates, per-frame factors)
//! - Documented ranges and meanings
//! - The shader-side copies they must stay in sync with

/// Orb particle physics parameters.
///
/// The same constants are hardcoded in `sim.wgsl`; the CPU step in
/// `particles.rs` and the compute kernel share them and apply the same
/// forces, differing only in how neighbor reads interleave.
#[derive(Debug, Clone)]
pub struct OrbPhysics {
    /// Number of particles (fixed at startup, never resized)
    pub particle_count: usize,

    /// Outer boundary radius in normalized device coordinates
    pub outer_radius: f32,

    /// Inner exclusion radius (particles are pushed out to it exactly)
    pub inner_radius: f32,

    /// Fraction of boundary overshoot kept after re-projection.
    /// 0.0 = hard clamp, 1.0 = no correction.
    pub overshoot_absorption: f32,

    /// Euler integration scale applied to the summed force
    pub damping: f32,

    /// Base pull toward the origin
    pub center_attraction: f32,

    /// How much audio level amplifies the center pull (1 + level * gain)
    pub level_attraction_gain: f32,

    /// Weight of the angular/radial flow-field steering term
    pub flow_weight: f32,

    /// Tangential swirl weight, scaled by audio level
    pub vorticity_gain: f32,

    /// Outward radial wave weight, scaled by audio level
    pub radial_wave_gain: f32,

    /// Tangential angular wave weight, scaled by audio level
    pub angular_wave_gain: f32,

    /// Outward push preventing total collapse, proportional to distance
    pub center_repulsion: f32,

    /// Pseudo-neighbors sampled per particle (fixed stride, not true NN)
    pub neighbor_count: usize,

    /// Index stride between pseudo-neighbors (coprime with particle_count)
    pub neighbor_stride: usize,

    /// Repulsion kicks in below this separation (NDC)
    pub neighbor_threshold: f32,

    /// Inverse-square repulsion gain
    pub neighbor_gain: f32,

    /// Per-neighbor force magnitude cap (keeps near-overlaps finite)
    pub neighbor_force_cap: f32,

    /// Per-particle phase step in radians (golden angle, breaks lockstep)
    pub phase_step: f32,
}

impl Default for OrbPhysics {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            outer_radius: 0.88,
            inner_radius: 0.05,
            overshoot_absorption: 0.3,
            damping: 0.01,
            center_attraction: 0.1,
            level_attraction_gain: 2.0,
            flow_weight: 0.05,
            vorticity_gain: 0.08,
            radial_wave_gain: 0.04,
            angular_wave_gain: 0.03,
            center_repulsion: 0.015,
            neighbor_count: 5,
            neighbor_stride: 199,
            neighbor_threshold: 0.08,
            neighbor_gain: 2.0e-4,
            neighbor_force_cap: 0.5,
            phase_step: 2.399_963, // golden angle in radians
        }
    }
}

/// Audio feature extraction configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Nominal capture block size (samples)
    pub block_size: usize,

    /// How many leading samples feed the band-energy split (cost control)
    pub band_window: usize,

    /// RMS -> level gain, tuned so typical speech saturates near 1.0
    pub level_gain: f32,

    /// Band ratio -> frequency gain
    pub frequency_gain: f32,

    /// Low-index third energy weight
    pub low_weight: f32,

    /// Middle third: share credited to the high band
    pub mid_high_share: f32,

    /// Middle third: share credited to the low band
    pub mid_low_share: f32,

    /// High-index third energy weight
    pub high_weight: f32,

    /// Below this summed band energy the block counts as silence
    pub silence_floor: f32,

    /// Band ratio reported for silent blocks
    pub silence_ratio: f32,

    /// EMA weight kept on the previous value (small = fast response)
    pub smoothing: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            band_window: 512,
            level_gain: 50.0,
            frequency_gain: 1.5,
            low_weight: 1.2,
            mid_high_share: 0.7,
            mid_low_share: 0.3,
            high_weight: 1.5,
            silence_floor: 0.001,
            silence_ratio: 0.4,
            smoothing: 0.15,
        }
    }
}

/// Touch transient and hold-gesture parameters.
#[derive(Debug, Clone)]
pub struct TouchParams {
    /// Multiplicative decay applied to the touch pulse every frame
    pub decay_per_frame: f32,

    /// Below this the pulse is treated as negligible
    pub epsilon: f32,

    /// Holds shorter than this are taps, longer ones start the timer (seconds)
    pub hold_threshold_s: f32,

    /// Session minutes granted per held second
    pub minutes_per_held_second: f32,
}

impl Default for TouchParams {
    fn default() -> Self {
        Self {
            decay_per_frame: 0.92,
            epsilon: 1.0e-3,
            hold_threshold_s: 1.0,
            minutes_per_held_second: 1.0,
        }
    }
}

/// Session timer configuration.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Progress recompute period while running (seconds)
    pub tick_interval_s: f64,

    /// Completion flash decrement per flash tick
    pub flash_step: f32,

    /// Flash tick period (seconds); 0.01 per 0.05s = 5s total fade
    pub flash_interval_s: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_s: 0.1,
            flash_step: 0.01,
            flash_interval_s: 0.05,
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Nominal frame delta advanced per tick (seconds); display runs Fifo
    pub frame_dt: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 300,
            window_height: 300,
            frame_dt: 1.0 / 60.0,
        }
    }
}

/// Recording mode configuration.
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}
