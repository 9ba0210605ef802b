use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceError {
    message: String,
}

impl VoiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for VoiceError {}

/// Speech-to-text capture, started and stopped by the user.
pub trait VoiceCapture: Send {
    fn start(&mut self) -> Result<(), VoiceError>;

    /// Stop capturing and return the recognized text, if any.
    fn stop(&mut self) -> Option<String>;
}

/// Used where no speech recognizer is available.
#[derive(Debug, Default)]
pub struct UnsupportedVoiceCapture;

impl VoiceCapture for UnsupportedVoiceCapture {
    fn start(&mut self) -> Result<(), VoiceError> {
        Err(VoiceError::new(
            "Voice input is not supported in this environment",
        ))
    }

    fn stop(&mut self) -> Option<String> {
        None
    }
}
