use std::error::Error;
use std::fmt;

use crate::core::config::ConfigError;
use crate::core::gateway::GatewayError;
use crate::core::image::ImageError;
use crate::core::keyring::KeyringAccessError;
use crate::core::session_store::StoreError;
use crate::core::voice::VoiceError;

/// Failure of a user action. None of them end the process: sessions and the
/// active session stay as they were.
#[derive(Debug)]
pub enum AppError {
    /// A send is already in flight.
    SendInProgress,
    /// Neither text nor an image was given.
    EmptyTurn,
    Gateway(GatewayError),
    Store(StoreError),
    Image(ImageError),
    Config(ConfigError),
    Credential(KeyringAccessError),
    /// The API answered 401 to the candidate key.
    CredentialRejected,
    VoiceUnavailable(VoiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::SendInProgress => write!(f, "A message is already being sent"),
            AppError::EmptyTurn => write!(f, "Type a message or attach an image first"),
            AppError::Gateway(err) => write!(f, "{err}"),
            AppError::Store(err) => write!(f, "{err}"),
            AppError::Image(err) => write!(f, "{err}"),
            AppError::Config(err) => write!(f, "{err}"),
            AppError::Credential(err) => write!(f, "{err}"),
            AppError::CredentialRejected => write!(f, "The API key was rejected by the API"),
            AppError::VoiceUnavailable(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Gateway(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Image(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Credential(err) => Some(err),
            AppError::VoiceUnavailable(err) => Some(err),
            AppError::SendInProgress | AppError::EmptyTurn | AppError::CredentialRejected => None,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        AppError::Image(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<KeyringAccessError> for AppError {
    fn from(err: KeyringAccessError) -> Self {
        AppError::Credential(err)
    }
}

impl From<VoiceError> for AppError {
    fn from(err: VoiceError) -> Self {
        AppError::VoiceUnavailable(err)
    }
}
