//! # chime-player
//!
//! Audio playback controller for the Chime alarm-clock appliance.
//!
//! The controller supervises one external decoder process per logical
//! audio source. Commands go in on the decoder's stdin; there is no
//! structured output protocol, so song completion is inferred from the
//! presence of status chatter on stdout/stderr combined with wall-clock
//! timeouts. Callers drive the whole machine by polling
//! [`MusicPlayer::poll_state`].

pub mod decoder;
pub mod equalizer;
pub mod metadata;
pub mod mixer;
pub mod player;

pub use decoder::{Decoder, DecoderProcess};
pub use mixer::Mixer;
pub use player::{MusicPlayer, SharedPlayer};
