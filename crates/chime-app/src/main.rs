//! # Chime
//!
//! Minimal command-line caller for the playback controller: plays each
//! file given on the command line and polls until it finishes. The full
//! appliance wires the same controller to its alarm and sleep-timer
//! sources instead.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chime_core::{PlaybackState, PlayerConfig};
use chime_player::MusicPlayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Poll cadence. Well under the tightest rolling timeout (buffer grace
/// 1 s + 1 s slack), so an active decoder is never misread as silent.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chime=info,chime_player=debug".into()),
        )
        .init();

    info!("Starting chime v{}", env!("CARGO_PKG_VERSION"));

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        anyhow::bail!("usage: chime <file> [file ...]");
    }

    let mut player = MusicPlayer::new(PlayerConfig::load());

    for file in files {
        player.play(&file);
        if !player.song_title().is_empty() {
            info!("Now playing: {} / {}", player.song_title(), player.song_artist());
        }
        while player.poll_state() == PlaybackState::Playing {
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    Ok(())
}
