//! Client core for a document assistant: upload documents, then ask questions
//! about them in a conversation, by text or by voice.
//!
//! [`UploadSession`] and [`ConversationSession`] own all state; a UI shell
//! reads their snapshots (or subscribes to changes) and forwards user intents
//! as method calls. Both talk to the backend through a [`Transport`], by
//! default the reqwest-based [`TransportClient`].

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod file_types;
pub mod logging;
pub mod models;
pub mod transport;
pub mod upload;
pub mod voice;

pub use client::{ClientError, NexusClient};
pub use config::ClientConfig;
pub use conversation::{ConversationSession, ConversationState, RecordingOutcome, SendOutcome};
pub use error::{ConfigError, ValidationError, VoiceError};
pub use models::{
    ConversationConfig, FileId, Language, Message, Role, SessionPhase, UploadStatus, UploadedFile,
};
pub use transport::{Transport, TransportClient, TransportError};
pub use upload::{SelectedFile, UploadSession, UploadState};
pub use voice::{AudioInput, AudioPlayer, AudioStream, VoiceChannel};
