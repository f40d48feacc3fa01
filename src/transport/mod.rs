pub mod http;

pub use http::TransportClient;

use crate::models::Language;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One document as submitted to `/upload`.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub language: Language,
    pub use_voice: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    #[serde(alias = "text")]
    pub response: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "voice_url")]
    pub audio_url: Option<String>,
}

/// A single recorded clip as submitted to `/voice`.
#[derive(Debug, Clone)]
pub struct VoicePayload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VoiceResponse {
    #[serde(alias = "response")]
    pub text: String,
    #[serde(default, alias = "voice_url")]
    pub audio_url: Option<String>,
    /// What the server heard, when it reports it.
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SupportedLanguages {
    #[serde(default)]
    pub translation: BTreeMap<String, String>,
    #[serde(default)]
    pub voice: BTreeMap<String, String>,
}

/// The remote operations the sessions depend on. Single attempt, no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn upload(&self, payload: UploadPayload) -> Result<UploadResponse, TransportError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;

    async fn voice(&self, payload: VoicePayload) -> Result<VoiceResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Serialize for TransportError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
