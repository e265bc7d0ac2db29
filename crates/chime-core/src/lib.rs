//! # chime-core
//!
//! Core types, error handling, and configuration for the Chime alarm-clock
//! audio controller.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DecoderConfig, MixerConfig, PlayerConfig};
pub use error::{Error, Result};
pub use types::{PlaybackState, TrackTags, VolumeLevel};
