use serde::Serialize;

/// A selected file or requested language the core refuses to accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported file type for {name}: {mime_type}")]
    UnsupportedFileType { name: String, mime_type: String },
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Failures of the audio capture/playback side of voice mode.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),
    #[error("Audio device error: {0}")]
    Device(String),
    #[error("Audio encoding error: {0}")]
    Encode(#[from] hound::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API url {value}: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidNumber { key: String, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
