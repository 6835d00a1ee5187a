//! Fluidorb library - audio-reactive ferrofluid orb

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod fields;
pub mod params;
pub mod particles;
pub mod rendering;
pub mod signals;
pub mod timer;
