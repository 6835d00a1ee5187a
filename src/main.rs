//! Fluidorb - a floating, always-on-top orb that reacts to your microphone.
//!
//! The shape breathes with loudness, the palette follows the spectral tilt,
//! taps send a pulse through the surface, and holding the orb starts a
//! countdown session that tints it as it runs.

mod analysis;
mod audio;
mod cli;
mod params;
mod particles;
mod rendering;
mod signals;
mod timer;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId, WindowLevel},
};

use audio::AudioSystem;
use cli::Args;
use params::{AudioConfig, OrbPhysics, RecordingConfig, RenderConfig, TimerConfig, TouchParams};
use particles::ParticleField;
use rendering::RenderSystem;
use signals::{FrameUniforms, SignalHub, SignalSnapshot, TouchTransient, TriggerEvent};
use timer::SessionTimer;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Core state
    field: ParticleField,
    hub: Arc<SignalHub>,
    audio: Option<AudioSystem>,
    timer: SessionTimer,
    touch: TouchTransient,

    // Configuration
    render_config: RenderConfig,
    touch_params: TouchParams,
    recording_config: Option<RecordingConfig>,
    force_synthetic: bool,
    cpu_sim: bool,
    startup_timer_minutes: Option<f32>,

    // Time tracking
    start_time: Instant,
    time_s: f32,
    frame_num: usize,
    pressed_at: Option<Instant>,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let render_config = RenderConfig::default();
        let touch_params = TouchParams::default();
        let touch = TouchTransient::new(touch_params.decay_per_frame, touch_params.epsilon);

        Ok(Self {
            window: None,
            render_system: None,
            field: ParticleField::new(OrbPhysics::default()),
            hub: Arc::new(SignalHub::new()),
            audio: None,
            timer: SessionTimer::new(TimerConfig::default()),
            touch,
            render_config,
            touch_params,
            recording_config: args.create_recording_config()?,
            force_synthetic: args.synthetic,
            cpu_sim: args.cpu_sim,
            startup_timer_minutes: args.timer,
            start_time: Instant::now(),
            time_s: 0.0,
            frame_num: 0,
            pressed_at: None,
        })
    }

    /// Seconds since startup, for timer ticks and trigger timestamps.
    fn now_s(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// The single capability surface the window/input layer fires into the
    /// core.
    fn fire(&mut self, event: TriggerEvent) {
        match event {
            TriggerEvent::Touch => self.touch.trigger(),
            TriggerEvent::ShowEmoji => {
                // Overlay feedback lives in a separate presentation layer;
                // it polls the hub and reacts to this trigger.
                debug!("show-emoji trigger forwarded to overlay");
            }
            TriggerEvent::StartTimer(duration) => {
                let now = self.now_s();
                self.timer.start(duration, now);
            }
            TriggerEvent::StopTimer => self.timer.stop(),
        }
    }

    /// Everything the presentation layer may poll, read by value.
    fn snapshot(&self) -> SignalSnapshot {
        let audio = self.hub.audio();
        let timer = self.timer.signal();
        SignalSnapshot {
            level: audio.level,
            frequency: audio.frequency,
            intensity: audio.intensity,
            touch: self.touch.value(),
            timer_progress: timer.progress,
            timer_flash: timer.completion_flash,
        }
    }

    /// Map a completed press to a tap (touch pulse) or a hold (start timer).
    fn finish_press(&mut self) {
        let Some(pressed_at) = self.pressed_at.take() else {
            return;
        };
        let held_s = pressed_at.elapsed().as_secs_f32();

        if held_s >= self.touch_params.hold_threshold_s {
            let minutes = (held_s * self.touch_params.minutes_per_held_second)
                .round()
                .max(1.0);
            self.fire(TriggerEvent::StartTimer(Duration::from_secs_f32(
                minutes * 60.0,
            )));
        } else {
            self.fire(TriggerEvent::Touch);
            self.fire(TriggerEvent::ShowEmoji);
        }
    }

    /// Run one frame: advance time, decay transients, tick the timer, then
    /// simulate and render. Returns false when the app should exit.
    fn render_frame(&mut self) -> bool {
        let (Some(render_system), Some(window)) = (&self.render_system, &self.window) else {
            return true;
        };
        if self.audio.is_none() {
            return true;
        }

        // Nominal frame delta; the display callback paces us at ~60Hz.
        self.time_s += self.render_config.frame_dt;
        self.touch.decay_frame();
        self.timer.tick(self.now_s());

        let size = window.inner_size();
        let uniforms = FrameUniforms::new(
            [size.width as f32, size.height as f32],
            self.time_s,
            self.render_config.frame_dt,
            &self.snapshot(),
        );

        // The simulation for this frame completes before the render pass
        // reads the particle buffer: on the GPU both passes share one
        // encoder; on the CPU the step happens before the upload.
        if self.cpu_sim {
            self.field.step(&uniforms);
            render_system.upload_particles(&self.field.particles);
        }
        render_system.update_uniforms(&uniforms);

        match render_system.render(self.frame_num, !self.cpu_sim) {
            Ok(()) => self.frame_num += 1,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = window.inner_size();
                if let Some(rs) = &mut self.render_system {
                    rs.resize(size.width, size.height);
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                warn!("surface out of memory, exiting");
                return false;
            }
            // Dropped frame: skip it and retry on the next tick.
            Err(e) => debug!("skipped frame: {e:?}"),
        }

        if let Some(rec) = &self.recording_config {
            if self.frame_num >= rec.total_frames() {
                info!("recording finished ({} frames)", self.frame_num);
                return false;
            }
        }
        true
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Floating orb: small, transparent, undecorated, always on top.
        // Placement and the rest of the window chrome stay with the OS.
        let window_attributes = Window::default_attributes()
            .with_title("Fluidorb")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ))
            .with_transparent(true)
            .with_decorations(false)
            .with_window_level(WindowLevel::AlwaysOnTop);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.field,
            self.recording_config.clone(),
        )) {
            Ok(rs) => rs,
            Err(e) => {
                // No degraded rendering mode exists; report and stop.
                tracing::error!("failed to initialize rendering: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let audio = AudioSystem::new(
            AudioConfig::default(),
            Arc::clone(&self.hub),
            self.recording_config.as_ref(),
            self.force_synthetic,
        );

        if let Some(minutes) = self.startup_timer_minutes {
            self.fire(TriggerEvent::StartTimer(Duration::from_secs_f32(
                minutes * 60.0,
            )));
        }

        info!(synthetic = audio.is_synthetic(), "fluidorb is running");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.audio = Some(audio);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(rs) = &mut self.render_system {
                    rs.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match (state, button) {
                (ElementState::Pressed, MouseButton::Left) => {
                    self.pressed_at = Some(Instant::now());
                }
                (ElementState::Released, MouseButton::Left) => self.finish_press(),
                (ElementState::Pressed, MouseButton::Right) => {
                    self.fire(TriggerEvent::StopTimer);
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                if !self.render_frame() {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fluidorb=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
