use super::{
    ChatRequest, ChatResponse, HealthStatus, SupportedLanguages, Transport, TransportError,
    UploadPayload, UploadResponse, VoicePayload, VoiceResponse,
};
use crate::config::{mask_secret, ClientConfig};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// reqwest-backed client for the assistant backend. Holds only connection
/// config; every call is a single attempt.
#[derive(Debug, Clone)]
pub struct TransportClient {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct ApiKeyRequest<'a> {
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

impl TransportClient {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path)?)
    }

    /// Turn a server-relative audio path like `/static/audio/x.mp3` into an
    /// absolute URL. Unparseable values are passed through untouched.
    fn resolve_audio(&self, audio_url: Option<String>) -> Option<String> {
        let raw = audio_url.filter(|u| !u.trim().is_empty())?;
        match self.base_url.join(&raw) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::debug!("Keeping unresolvable audio url {}: {}", raw, e);
                Some(raw)
            }
        }
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let resp = self.client.get(self.endpoint("health")?).send().await?;
        decode(resp).await
    }

    /// `GET /languages`
    pub async fn languages(&self) -> Result<SupportedLanguages, TransportError> {
        let resp = self.client.get(self.endpoint("languages")?).send().await?;
        decode(resp).await
    }

    /// `POST /set-openai-key`: hand the backend an API key for its answer engine.
    pub async fn set_openai_key(
        &self,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<String, TransportError> {
        tracing::info!("Configuring backend OpenAI key {}", mask_secret(api_key));
        let resp = self
            .client
            .post(self.endpoint("set-openai-key")?)
            .json(&ApiKeyRequest { api_key, base_url })
            .send()
            .await?;
        let data: MessageResponse = decode(resp).await?;
        Ok(data.message)
    }
}

#[async_trait]
impl Transport for TransportClient {
    async fn upload(&self, payload: UploadPayload) -> Result<UploadResponse, TransportError> {
        tracing::debug!(
            "Uploading {} ({} bytes, {})",
            payload.filename,
            payload.bytes.len(),
            payload.mime_type
        );
        let part = Part::bytes(payload.bytes.to_vec())
            .file_name(payload.filename)
            .mime_str(&payload.mime_type)?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.endpoint("upload")?)
            .multipart(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        let resp = self
            .client
            .post(self.endpoint("chat")?)
            .json(request)
            .send()
            .await?;
        let mut data: ChatResponse = decode(resp).await?;
        data.audio_url = self.resolve_audio(data.audio_url.take());
        Ok(data)
    }

    async fn voice(&self, payload: VoicePayload) -> Result<VoiceResponse, TransportError> {
        let part = Part::bytes(payload.bytes.to_vec())
            .file_name(payload.filename)
            .mime_str(&payload.mime_type)?;
        let form = Form::new().part("audio", part);

        let resp = self
            .client
            .post(self.endpoint("voice")?)
            .multipart(form)
            .send()
            .await?;
        let mut data: VoiceResponse = decode(resp).await?;
        data.audio_url = self.resolve_audio(data.audio_url.take());
        Ok(data)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, TransportError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(TransportError::Api {
            status,
            message: text,
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| TransportError::Parse(e.to_string()))
}
