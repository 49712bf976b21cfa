use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by everything outside the pure content encoder and
/// display formatter, which cannot fail.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The content does not fit in any QR version at the requested level.
    #[error("Could not encode content: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Invalid color '{0}': expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    #[error("Invalid error correction level: {0}")]
    InvalidErrorCorrection(String),

    #[error("No QR code found in image")]
    NoCodeFound,

    #[error("Failed to decode QR code: {0}")]
    Decode(String),

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("History entry not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_) => 3,
            Error::NoCodeFound | Error::Decode(_) => 2,
            Error::InvalidColor(_)
            | Error::InvalidSettings(_)
            | Error::UnknownContentType(_)
            | Error::InvalidErrorCorrection(_)
            | Error::ConfigParse { .. } => 64,
            Error::Io(_)
            | Error::Json(_)
            | Error::Image(_)
            | Error::Encode(_)
            | Error::ConfigSerialize(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
