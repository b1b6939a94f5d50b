//! Error types shared by the synthesis pipeline and its collaborators.

use std::path::PathBuf;

/// Errors surfaced by constructors, configuration and device I/O.
///
/// Numeric trouble inside the envelope (an exhausted or empty ramp) is not
/// an error: [`crate::dsp::envelope::Envelope::process`] reports it as
/// `None` and the phase is skipped.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A constructor or setter received a value it cannot work with.
    #[error("invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        param: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The audio output could not be opened or written.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// No note-trigger hardware (MIDI) is available.
    #[error("no trigger device: {0}")]
    NoTriggerDevice(String),

    /// A note name could not be parsed or is outside the wave bank.
    #[error("unknown note: {0}")]
    UnknownNote(String),

    /// The configuration file is not valid TOML for [`crate::config::SynthConfig`].
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// Reading a file failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to start a worker thread.
    #[error("failed to spawn thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl SynthError {
    /// Shorthand for an [`SynthError::InvalidParameter`].
    pub fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        SynthError::InvalidParameter {
            param,
            reason: reason.into(),
        }
    }
}

/// Convenience result type for the crate.
pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn invalid_parameter_display() {
        let err = SynthError::invalid("frequency", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'frequency': must be positive, got 0"
        );
    }

    #[test]
    fn io_error_exposes_source() {
        let err = SynthError::Io {
            path: PathBuf::from("/missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/missing.toml"));
    }

    #[test]
    fn device_errors_have_no_source() {
        assert!(SynthError::DeviceUnavailable("x".into()).source().is_none());
        assert!(SynthError::NoTriggerDevice("y".into()).source().is_none());
    }
}
