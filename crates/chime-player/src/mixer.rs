//! External mixer invocation.

use std::process::Command;

use chime_core::{Error, MixerConfig, Result, VolumeLevel};
use tracing::debug;

/// One-shot wrapper around the system mixer command.
pub struct Mixer {
    config: MixerConfig,
}

impl Mixer {
    pub const fn new(config: MixerConfig) -> Self {
        Self { config }
    }

    /// Synchronously set the mixer control to `level` percent and wait
    /// for the command to finish.
    pub fn apply(&self, level: VolumeLevel) -> Result<()> {
        let percent = format!("{}%", level.as_percent());
        debug!("Setting {} to {percent}", self.config.control);

        let output = Command::new(&self.config.program)
            .args(["-q", "sset", &self.config.control, &percent])
            .output()
            .map_err(|e| Error::Mixer(format!("{}: {e}", self.config.program)))?;

        if !output.status.success() {
            return Err(Error::Mixer(format!(
                "{} exited with {}",
                self.config.program, output.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer_with(program: &str) -> Mixer {
        Mixer::new(MixerConfig {
            program: program.to_string(),
            control: "Master".to_string(),
        })
    }

    #[test]
    fn test_missing_program_is_mixer_error() {
        let err = mixer_with("chime-test-no-such-mixer")
            .apply(VolumeLevel::new(50))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Mixer(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_successful_invocation() {
        // `true` ignores the mixer arguments and exits 0.
        assert!(mixer_with("true").apply(VolumeLevel::new(50)).is_ok());
    }

    #[test]
    fn test_nonzero_exit_is_mixer_error() {
        let err = mixer_with("false")
            .apply(VolumeLevel::new(50))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Mixer(_)));
    }
}
