use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Uploads ──

/// Client-side identity of a selected file: creation millis plus a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn generate() -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        FileId(format!("{}-{}", Utc::now().timestamp_millis(), &random[..9]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success {
        message: String,
        server_filename: String,
    },
    Error {
        reason: String,
    },
}

impl UploadStatus {
    fn rank(&self) -> u8 {
        match self {
            UploadStatus::Pending => 0,
            UploadStatus::Uploading => 1,
            UploadStatus::Success { .. } | UploadStatus::Error { .. } => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub status: UploadStatus,
}

impl UploadedFile {
    pub fn pending(name: String, size: u64, mime_type: String) -> Self {
        Self {
            id: FileId::generate(),
            name,
            size,
            mime_type,
            status: UploadStatus::Pending,
        }
    }

    /// Moves the status exactly one step forward. Returns false (and leaves the
    /// status untouched) for any other transition.
    pub fn advance(&mut self, next: UploadStatus) -> bool {
        if next.rank() != self.status.rank() + 1 {
            return false;
        }
        self.status = next;
        true
    }
}

// ── Conversation ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    SystemError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub audio_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Hands out timestamp-derived message ids that stay strictly increasing even
/// when two messages are created within the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct MessageClock {
    last: u64,
}

impl MessageClock {
    pub fn next_id(&mut self, now: DateTime<Utc>) -> MessageId {
        let millis = now.timestamp_millis().max(0) as u64;
        self.last = millis.max(self.last + 1);
        MessageId(self.last)
    }

    pub fn message(&mut self, role: Role, content: String, audio_url: Option<String>) -> Message {
        let now = Utc::now();
        Message {
            id: self.next_id(now),
            role,
            content,
            audio_url,
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Hi,
            Language::Hi => Language::En,
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            other => Err(ValidationError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub language: Language,
    pub voice_mode: bool,
    pub recording: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Recording,
    Sending,
}
