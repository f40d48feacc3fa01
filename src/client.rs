use crate::config::ClientConfig;
use crate::conversation::ConversationSession;
use crate::error::ConfigError;
use crate::models::UploadedFile;
use crate::transport::{Transport, TransportClient, TransportError};
use crate::upload::UploadSession;
use crate::voice::VoiceChannel;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The session pair a UI shell drives: one upload set and one conversation,
/// sharing a single transport.
pub struct NexusClient {
    pub uploads: UploadSession,
    pub conversation: ConversationSession,
    transport: Arc<TransportClient>,
}

impl NexusClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(TransportClient::new(config)?);
        let shared: Arc<dyn Transport> = transport.clone();
        tracing::info!("Assistant backend at {}", config.api_url);
        Ok(Self {
            uploads: UploadSession::new(shared.clone(), config),
            conversation: ConversationSession::new(shared, config),
            transport,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&ClientConfig::from_env()?)
    }

    pub fn with_voice(mut self, voice: VoiceChannel) -> Self {
        self.conversation = self.conversation.with_voice(voice);
        self
    }

    /// Direct access for the backend's auxiliary endpoints (health, languages,
    /// API key).
    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// Upload everything pending and, when documents became available, let the
    /// conversation greet the user.
    pub async fn upload_and_announce(&self) -> Vec<UploadedFile> {
        let before = self.uploads.snapshot().successful().len();
        let ready = self.uploads.upload_all().await;
        if ready.len() > before {
            self.conversation.documents_ready(ready.len());
        }
        ready
    }
}
