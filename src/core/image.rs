//! Image attachments for vision turns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::data::path_display;

/// An image selected by the user and waiting to be sent with the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingImage {
    /// `data:<mime>;base64,<payload>` URL, ready to be sent as `image_url`.
    pub data: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug)]
pub enum ImageError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    NotAnImage {
        path: PathBuf,
    },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Read { path, source } => {
                write!(f, "Failed to read image {}: {}", path_display(path), source)
            }
            ImageError::NotAnImage { path } => {
                write!(f, "{} is not an image file", path_display(path))
            }
        }
    }
}

impl Error for ImageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImageError::Read { source, .. } => Some(source),
            ImageError::NotAnImage { .. } => None,
        }
    }
}

impl PendingImage {
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            data: format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)),
            mime_type: mime_type.to_string(),
        }
    }

    /// Read an image from disk, rejecting anything without an `image/*` type.
    pub fn from_path(path: &Path) -> Result<Self, ImageError> {
        let mime_type = mime_type_for(path).ok_or_else(|| ImageError::NotAnImage {
            path: path.to_path_buf(),
        })?;
        let bytes = fs::read(path).map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(&bytes, mime_type))
    }

    /// Size of the decoded payload in bytes, estimated from the base64 length.
    pub fn approximate_size(&self) -> usize {
        let payload = self
            .data
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default();
        payload.len() / 4 * 3
    }
}

/// Guess an image MIME type from a file extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_path_builds_data_url() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("photo.PNG");
        fs::write(&path, [1u8, 2, 3]).expect("write");

        let image = PendingImage::from_path(&path).expect("load image");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "data:image/png;base64,AQID");
        assert_eq!(image.approximate_size(), 3);
    }

    #[test]
    fn non_image_files_are_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").expect("write");

        let err = PendingImage::from_path(&path).expect_err("should reject");
        assert!(matches!(err, ImageError::NotAnImage { .. }));
    }

    #[test]
    fn missing_files_report_read_errors() {
        let dir = TempDir::new().expect("temp dir");
        let err = PendingImage::from_path(&dir.path().join("gone.jpg")).expect_err("missing");
        assert!(matches!(err, ImageError::Read { .. }));
    }
}
