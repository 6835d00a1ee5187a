//! Microphone capture feeding the feature extractor.
//!
//! The cpal callback thread owns the extractor and publishes smoothed
//! signals into the shared hub; the render loop never blocks on audio. When
//! no input device can be opened the synthetic generator takes over on a
//! background thread so downstream signals keep moving.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{info, warn};

use crate::analysis::{FeatureExtractor, SyntheticSignal};
use crate::params::{AudioConfig, RecordingConfig};
use crate::signals::SignalHub;

type SharedWavWriter = Arc<Mutex<hound::WavWriter<std::io::BufWriter<std::fs::File>>>>;

/// Audio capture system; holds the stream (or the fallback thread) alive.
pub struct AudioSystem {
    _stream: Option<cpal::Stream>,
    synthetic_running: Option<Arc<AtomicBool>>,
}

impl AudioSystem {
    /// Start capture, or fall back to the synthetic signal generator.
    ///
    /// A missing or denied input device is a degraded-but-safe state, not an
    /// error: it is logged once and the generator keeps the hub fresh.
    pub fn new(
        config: AudioConfig,
        hub: Arc<SignalHub>,
        recording_config: Option<&RecordingConfig>,
        force_synthetic: bool,
    ) -> Self {
        if !force_synthetic {
            match Self::try_capture(&config, Arc::clone(&hub), recording_config) {
                Ok(stream) => {
                    return Self {
                        _stream: Some(stream),
                        synthetic_running: None,
                    };
                }
                Err(e) => {
                    warn!("audio capture unavailable ({e:#}); using synthetic signals");
                }
            }
        } else {
            info!("synthetic signals forced on");
        }

        Self {
            _stream: None,
            synthetic_running: Some(Self::spawn_synthetic(config, hub)),
        }
    }

    /// True when the fallback generator is driving the signals.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic_running.is_some()
    }

    fn try_capture(
        config: &AudioConfig,
        hub: Arc<SignalHub>,
        recording_config: Option<&RecordingConfig>,
    ) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no audio input device found"))?;

        let stream_config = device
            .default_input_config()
            .context("failed to get input config")?;
        let sample_rate = stream_config.sample_rate().0;
        let channels = stream_config.channels() as usize;

        info!(
            device = device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate, channels, "audio capture started"
        );

        // Record the mono capture stream to WAV alongside the frames.
        let wav_writer: Option<SharedWavWriter> = match recording_config {
            Some(rec) => {
                let spec = hound::WavSpec {
                    channels: 1,
                    sample_rate,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(rec.audio_path(), spec)
                    .context("failed to create WAV writer")?;
                Some(Arc::new(Mutex::new(writer)))
            }
            None => None,
        };

        let mut extractor = FeatureExtractor::new(config.clone());
        let mut mono = Vec::with_capacity(config.block_size);

        let stream = device
            .build_input_stream(
                &stream_config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Downmix interleaved frames by taking channel 0.
                    mono.clear();
                    mono.extend(data.chunks(channels).map(|frame| frame[0]));

                    if let Some(signals) = extractor.process(&mono) {
                        hub.publish(signals);
                    }

                    if let Some(ref writer) = wav_writer {
                        if let Ok(mut w) = writer.lock() {
                            for &sample in &mono {
                                let _ = w.write_sample(sample);
                            }
                        }
                    }
                },
                |err| warn!("audio stream error: {err}"),
                None,
            )
            .context("failed to build input stream")?;

        stream.play().context("failed to start input stream")?;
        Ok(stream)
    }

    /// Publish deterministic synthetic signals at the nominal block cadence.
    fn spawn_synthetic(config: AudioConfig, hub: Arc<SignalHub>) -> Arc<AtomicBool> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        // Nominal block cadence at 44.1kHz.
        let period = Duration::from_secs_f64(config.block_size as f64 / 44_100.0);

        thread::spawn(move || {
            let synth = SyntheticSignal;
            let start = Instant::now();
            while flag.load(Ordering::Relaxed) {
                hub.publish(synth.sample(start.elapsed().as_secs_f32()));
                thread::sleep(period);
            }
        });

        running
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        if let Some(flag) = &self.synthetic_running {
            flag.store(false, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_synthetic_publishes_moving_signals() {
        let hub = Arc::new(SignalHub::new());
        let system = AudioSystem::new(AudioConfig::default(), Arc::clone(&hub), None, true);
        assert!(system.is_synthetic());

        // The generator runs at block cadence (~23ms); give it a moment.
        thread::sleep(Duration::from_millis(100));
        let signals = hub.audio();
        assert!(signals.level > 0.0);
        assert!((0.0..=1.0).contains(&signals.level));
        assert!((0.0..=1.0).contains(&signals.frequency));
    }
}
