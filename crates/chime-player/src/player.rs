//! Playback state machine.
//!
//! The controller never receives a "song finished" event from the
//! decoder. Instead, every state poll drains the decoder's pipes and
//! treats the presence of status chatter as proof of progress; once the
//! chatter stops and the buffered audio has had time to play out, the
//! song is considered over. A decoder that goes silent suspiciously soon
//! after a load never started at all and is torn down so the next play
//! gets a fresh process.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chime_core::{PlaybackState, PlayerConfig, VolumeLevel};
use tracing::{debug, info, warn};

use crate::decoder::{Decoder, DecoderProcess};
use crate::metadata;
use crate::mixer::Mixer;

/// Startup allowance before a silent decoder is declared stopped.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(45);
/// Playback that ends in silence within this window counts as a crash.
const CRASH_WINDOW: Duration = Duration::from_secs(60);
/// Slack added on top of the decoder's buffer grace when rolling the
/// deadline forward.
const ACTIVITY_SLACK: Duration = Duration::from_secs(1);

/// Shared handle to one controller.
///
/// The appliance funnels several logical sources (alarm, sleep timer,
/// meditation) through a single controller; each source holds one of
/// these. The controller is single-threaded by contract, hence
/// `Rc<RefCell<_>>` rather than a lock.
pub type SharedPlayer = Rc<RefCell<MusicPlayer>>;

/// Playback controller driving one external decoder process.
pub struct MusicPlayer {
    config: PlayerConfig,
    mixer: Mixer,
    state: PlaybackState,
    volume: VolumeLevel,
    /// Exclusively owned child, present only between lazy start and
    /// crash teardown.
    decoder: Option<Box<dyn Decoder>>,
    /// Meaningful only while `state == Playing`.
    timeout_deadline: Instant,
    /// When the last load command was issued. Used solely to classify a
    /// stop as crash vs. normal end.
    play_started_at: Instant,
    song_title: String,
    song_artist: String,
}

impl MusicPlayer {
    pub fn new(config: PlayerConfig) -> Self {
        let mixer = Mixer::new(config.mixer.clone());
        let now = Instant::now();
        Self {
            config,
            mixer,
            state: PlaybackState::Stopped,
            volume: VolumeLevel::default(),
            decoder: None,
            timeout_deadline: now,
            play_started_at: now,
            song_title: String::new(),
            song_artist: String::new(),
        }
    }

    /// Wrap the controller for use by multiple logical sources.
    pub fn into_shared(self) -> SharedPlayer {
        Rc::new(RefCell::new(self))
    }

    /// Start playing `path`, stopping any current song first.
    ///
    /// A nonexistent path is a silent no-op apart from the tag reset; the
    /// filename title default below applies only to files that exist.
    pub fn play(&mut self, path: &Path) {
        if self.state == PlaybackState::Playing {
            self.stop();
        }

        self.song_title.clear();
        self.song_artist.clear();
        match metadata::read_tags(path) {
            Ok(tags) => {
                self.song_title = tags.title;
                self.song_artist = tags.artist;
            }
            Err(e) => debug!("No tags for {}: {e}", path.display()),
        }

        if !path.is_file() {
            debug!("Ignoring play request for missing file {}", path.display());
            return;
        }

        if self.decoder.is_none() {
            match DecoderProcess::start(&self.config) {
                Ok(process) => self.decoder = Some(Box::new(process)),
                Err(e) => warn!("{e}"),
            }
        }

        self.play_started_at = Instant::now();
        if self.song_title.is_empty() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                self.song_title = name.to_string();
            }
        }
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.send(&format!("LOAD {}", path.display()));
        }
        self.timeout_deadline = Instant::now() + STARTUP_TIMEOUT;
        self.state = PlaybackState::Playing;
        info!("Playing {}", path.display());
    }

    /// Stop playback.
    ///
    /// The decoder is paused, not terminated, so the next song can reuse
    /// the running process. State changes synchronously; no confirmation
    /// is awaited.
    pub fn stop(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.send("PAUSE");
        }
        self.state = PlaybackState::Stopped;
    }

    /// Current playback state.
    ///
    /// This is a deliberate side-effecting poll, not a getter: each call
    /// drains the decoder's pipes (the decoder stalls if nobody does),
    /// re-arms or expires the end-of-song timeout, and may tear down a
    /// crashed process. Callers are expected to invoke it repeatedly
    /// while playing.
    pub fn poll_state(&mut self) -> PlaybackState {
        if self.state != PlaybackState::Playing {
            return self.state;
        }

        let (running, drained, grace) = match self.decoder.as_mut() {
            Some(decoder) => {
                let running = decoder.is_running();
                let drained = decoder.drain_output() + decoder.drain_errors();
                (running, drained, decoder.buffer_grace())
            }
            None => (false, 0, Duration::ZERO),
        };

        let now = Instant::now();
        if running && drained > 0 {
            // Status chatter means the decoder is still working; keep the
            // deadline ahead of whatever audio its buffer still holds.
            self.timeout_deadline = now + grace + ACTIVITY_SLACK;
            return self.state;
        }

        if !running || now >= self.timeout_deadline {
            self.state = PlaybackState::Stopped;
            if self.play_started_at.elapsed() < CRASH_WINDOW {
                // Silence this early means the decoder never actually
                // started on this song. Tear it down; the next play will
                // spawn a fresh process.
                info!("Decoder produced no output, discarding the process");
                if let Some(mut decoder) = self.decoder.take() {
                    decoder.terminate();
                }
            } else {
                debug!("Song finished");
            }
        }

        self.state
    }

    /// Clamp and store `value`, then push it to the system mixer.
    pub fn set_volume(&mut self, value: i32) {
        self.volume = VolumeLevel::new(value);
        self.apply_volume();
    }

    pub fn volume_up(&mut self) {
        self.volume = self.volume.up();
        self.apply_volume();
    }

    pub fn volume_down(&mut self) {
        self.volume = self.volume.down();
        self.apply_volume();
    }

    fn apply_volume(&self) {
        if let Err(e) = self.mixer.apply(self.volume) {
            warn!("{e}");
        }
    }

    pub const fn volume(&self) -> VolumeLevel {
        self.volume
    }

    /// Configure the equalizer profile path managed at decoder start.
    pub fn set_equalizer_path(&mut self, path: impl Into<PathBuf>) {
        self.config.equalizer_path = Some(path.into());
    }

    /// Title of the current song: from tags, or the file name when the
    /// file exists but carries no usable tags. Empty otherwise.
    pub fn song_title(&self) -> &str {
        &self.song_title
    }

    pub fn song_artist(&self) -> &str {
        &self.song_artist
    }
}
