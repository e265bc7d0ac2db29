//! Common types shared across the application.

use serde::{Deserialize, Serialize};

/// Playback state of the controller.
///
/// `Stopped` is both the initial state and the terminal state between
/// songs; the controller never reports anything finer grained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Logical volume level (0 to 100 percent).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);
    pub const DEFAULT: Self = Self(70);

    /// Step applied by `up`/`down`.
    pub const STEP: u8 = 5;

    /// Build a level from any integer, clamping to [0, 100].
    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub const fn as_percent(&self) -> u8 {
        self.0
    }

    /// One step louder, saturating at 100.
    pub fn up(self) -> Self {
        Self::new(i32::from(self.0) + i32::from(Self::STEP))
    }

    /// One step quieter, saturating at 0.
    pub fn down(self) -> Self {
        Self::new(i32::from(self.0) - i32::from(Self::STEP))
    }
}

impl Default for VolumeLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i32> for VolumeLevel {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

/// Title/artist pair read from a file's tags. Either field may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
}

impl TrackTags {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}
