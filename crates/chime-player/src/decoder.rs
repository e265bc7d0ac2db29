//! Decoder subprocess supervision.
//!
//! Owns at most one child process and its three pipe endpoints. The pipes
//! are switched to non-blocking mode at spawn so the per-poll drains never
//! stall the controller, no matter what the decoder is doing.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use chime_core::{Error, PlayerConfig, Result};
use tracing::{debug, info, warn};

use crate::equalizer;

/// Output sample rate both decoder variants are configured for.
const SAMPLE_RATE: u64 = 44100;
/// 16-bit samples.
const BYTES_PER_SAMPLE: u64 = 2;
const CHANNELS: u64 = 2;

/// Seconds of audio the fallback decoder holds in its output buffer.
/// Embedded ARM appliances get a much deeper buffer than desktop builds.
#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
const FALLBACK_BUFFER_SECS: u64 = 18;
#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
const FALLBACK_BUFFER_SECS: u64 = 3;

/// The preferred decoder buffers almost nothing.
const PREFERRED_GRACE: Duration = Duration::from_secs(1);

/// Bytes read per drain iteration.
const DRAIN_CHUNK: usize = 4096;
/// At most this many chunks are drained per pipe per poll.
const DRAIN_MAX_CHUNKS: usize = 16;

/// Interface between the playback state machine and the decoder process.
///
/// The state machine only ever observes liveness and pipe activity, so the
/// whole controller can be exercised against a scripted fake.
pub trait Decoder {
    /// Write a single newline-terminated command. No acknowledgement is
    /// expected and none is read.
    fn send(&mut self, line: &str);

    /// Read and discard whatever is currently available on stdout,
    /// returning the number of bytes drained. Never blocks.
    fn drain_output(&mut self) -> usize;

    /// Same as [`Decoder::drain_output`], for stderr.
    fn drain_errors(&mut self) -> usize;

    /// Whether the child process is still alive.
    fn is_running(&mut self) -> bool;

    /// Forcibly stop the process. Idempotent.
    fn terminate(&mut self);

    /// How long audio may keep playing out of the decoder's internal
    /// buffer after its status chatter stops.
    fn buffer_grace(&self) -> Duration;
}

/// A supervised external decoder process with piped stdio.
pub struct DecoderProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    stderr: ChildStderr,
    buffer_grace: Duration,
}

impl DecoderProcess {
    /// Spawn a decoder according to `config`.
    ///
    /// Writes the equalizer profile first when one is configured but
    /// missing, then probes `$PATH` for the preferred binary and falls
    /// back to the buffered variant when it is absent.
    pub fn start(config: &PlayerConfig) -> Result<Self> {
        if let Some(eq_path) = &config.equalizer_path {
            if !eq_path.exists() {
                if let Err(e) = equalizer::write_flat_profile(eq_path) {
                    warn!("{e}");
                }
            }
        }

        let (mut command, buffer_grace) = match find_in_path(&config.decoder.preferred) {
            Some(path) => {
                debug!("Using preferred decoder {}", path.display());
                let mut command = Command::new(path);
                command.args(["-R", "-"]);
                (command, PREFERRED_GRACE)
            }
            None => {
                let buffer_kb =
                    SAMPLE_RATE * BYTES_PER_SAMPLE * CHANNELS * FALLBACK_BUFFER_SECS / 1024;
                debug!(
                    "Preferred decoder absent, using {} with a {buffer_kb} KB buffer",
                    config.decoder.fallback
                );
                let mut command = Command::new(&config.decoder.fallback);
                command.args(["-b", &buffer_kb.to_string()]);
                (command, Duration::from_secs(FALLBACK_BUFFER_SECS))
            }
        };

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Spawn(e.to_string()))?;

        // The pipes exist at this point, spawn() just created them.
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn("no stdout pipe".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Spawn("no stderr pipe".to_string()))?;

        set_nonblocking(stdout.as_raw_fd()).map_err(|e| Error::Spawn(e.to_string()))?;
        set_nonblocking(stderr.as_raw_fd()).map_err(|e| Error::Spawn(e.to_string()))?;

        info!(
            "Decoder started (pid {}, buffer grace {}s)",
            child.id(),
            buffer_grace.as_secs()
        );

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            buffer_grace,
        })
    }
}

impl Decoder for DecoderProcess {
    fn send(&mut self, line: &str) {
        if let Err(e) = writeln!(self.stdin, "{line}").and_then(|()| self.stdin.flush()) {
            warn!("Failed to send '{line}' to decoder: {e}");
        }
    }

    fn drain_output(&mut self) -> usize {
        drain_pipe(&mut self.stdout)
    }

    fn drain_errors(&mut self) -> usize {
        drain_pipe(&mut self.stderr)
    }

    fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!("Decoder exited with {status}");
                false
            }
            Err(e) => {
                warn!("Failed to query decoder status: {e}");
                false
            }
        }
    }

    fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    fn buffer_grace(&self) -> Duration {
        self.buffer_grace
    }
}

impl Drop for DecoderProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Resolve `program` against `$PATH`, or take it verbatim when it already
/// contains a path separator.
fn find_in_path(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return path.is_file().then_some(path);
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Read and discard currently available bytes, in bounded chunks.
fn drain_pipe(pipe: &mut impl Read) -> usize {
    let mut buf = [0u8; DRAIN_CHUNK];
    let mut total = 0;
    for _ in 0..DRAIN_MAX_CHUNKS {
        match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Pipe read failed: {e}");
                break;
            }
        }
    }
    total
}

#[allow(unsafe_code)]
fn set_nonblocking(fd: RawFd) -> std::io::Result<()> {
    // SAFETY: fcntl on a fd owned by our Child; no pointers involved.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_core::DecoderConfig;

    fn unlaunchable_config() -> PlayerConfig {
        PlayerConfig {
            decoder: DecoderConfig {
                preferred: "chime-test-no-such-decoder".to_string(),
                fallback: "chime-test-no-such-fallback".to_string(),
            },
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn test_find_in_path() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("chime-test-no-such-decoder").is_none());
    }

    #[test]
    fn test_start_failure_is_spawn_error() {
        let err = DecoderProcess::start(&unlaunchable_config()).err().unwrap();
        assert!(matches!(err, Error::Spawn(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_start_writes_missing_equalizer_profile() {
        let dir = tempfile::tempdir().unwrap();
        let eq_path = dir.path().join("eq.cfg");
        let mut config = unlaunchable_config();
        config.equalizer_path = Some(eq_path.clone());

        // The profile is written before the spawn attempt, so it exists
        // even though no decoder binary is available.
        assert!(DecoderProcess::start(&config).is_err());
        assert!(eq_path.exists());
    }

    #[test]
    fn test_drain_pipe_nonblocking() {
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut stdin = child.stdin.take().unwrap();
        let mut stdout = child.stdout.take().unwrap();
        set_nonblocking(stdout.as_raw_fd()).unwrap();

        // Nothing written yet: the drain must return without blocking.
        assert_eq!(drain_pipe(&mut stdout), 0);

        stdin.write_all(b"some decoder chatter\n").unwrap();
        stdin.flush().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        assert!(drain_pipe(&mut stdout) > 0);

        let _ = child.kill();
        let _ = child.wait();
    }
}
