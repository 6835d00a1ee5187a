//! Command-line argument parsing.

use clap::Parser;

use crate::params::RecordingConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Fluidorb")]
#[command(about = "Floating audio-reactive ferrofluid orb", long_about = None)]
pub struct Args {
    /// Record frames and microphone audio (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Use the synthetic signal generator instead of the microphone
    #[arg(long)]
    pub synthetic: bool,

    /// Run the particle step on the CPU and upload positions each frame
    /// (reference path for GPU-parity checks)
    #[arg(long)]
    pub cpu_sim: bool,

    /// Start a countdown session of this many minutes at launch
    #[arg(long, value_name = "MINUTES")]
    pub timer: Option<f32>,
}

impl Args {
    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> anyhow::Result<Option<RecordingConfig>> {
        self.record
            .map(|duration| -> anyhow::Result<RecordingConfig> {
                let config = RecordingConfig::new(duration);
                std::fs::create_dir_all(config.frames_dir())?;
                Ok(config)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_live_gpu_mode() {
        let args = Args::parse_from(["fluidorb"]);
        assert!(args.record.is_none());
        assert!(!args.synthetic);
        assert!(!args.cpu_sim);
        assert!(args.timer.is_none());
    }

    #[test]
    fn record_flag_parses_duration() {
        let args = Args::parse_from(["fluidorb", "--record", "2.5", "--cpu-sim"]);
        assert_eq!(args.record, Some(2.5));
        assert!(args.cpu_sim);
    }
}
