use crate::config::ClientConfig;
use crate::error::{ValidationError, VoiceError};
use crate::models::{ConversationConfig, Message, MessageClock, Role, SessionPhase};
use crate::transport::{ChatRequest, Transport};
use crate::voice::VoiceChannel;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Appended in place of an answer when a chat request fails.
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Appended in place of an answer when a voice request fails.
pub const VOICE_ERROR_MESSAGE: &str =
    "Sorry, I couldn't process your voice message. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant answered and the answer was appended.
    Delivered,
    /// The request failed and an error message was appended.
    Failed,
    /// Nothing was appended and no request was made.
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingOutcome {
    Started,
    Delivered,
    Failed,
    /// The recording held no audio and was dropped without a request.
    Discarded,
    PermissionDenied,
    /// No voice channel is attached to this conversation.
    Unavailable,
    /// The call did not fit the current phase (already recording, not
    /// recording, or busy sending).
    Ignored,
}

/// Read-only view of a conversation handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    /// Append-only, in insertion order.
    pub messages: Vec<Message>,
    pub config: ConversationConfig,
    pub phase: SessionPhase,
    /// Composer contents.
    pub draft: String,
    #[serde(skip)]
    clock: MessageClock,
}

impl ConversationState {
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Sending
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, role: Role, content: String, audio_url: Option<String>) {
        let message = self.clock.message(role, content, audio_url);
        self.messages.push(message);
    }
}

/// Marks a request lifecycle. Dropping it before `complete` (the caller gave
/// up on the future) still returns the session to `Idle`.
struct InFlight<'a> {
    state: &'a watch::Sender<ConversationState>,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a watch::Sender<ConversationState>) -> Self {
        Self { state, done: false }
    }

    fn complete(mut self, apply: impl FnOnce(&mut ConversationState)) {
        self.done = true;
        self.state.send_modify(|s| {
            apply(s);
            s.phase = SessionPhase::Idle;
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state.send_modify(|s| s.phase = SessionPhase::Idle);
        }
    }
}

/// Message history plus the request lifecycle around it. At most one request
/// (text or voice) is outstanding at any time.
pub struct ConversationSession {
    transport: Arc<dyn Transport>,
    voice: Option<VoiceChannel>,
    state: watch::Sender<ConversationState>,
}

impl ConversationSession {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        let state = ConversationState {
            config: ConversationConfig {
                language: config.language,
                ..ConversationConfig::default()
            },
            ..ConversationState::default()
        };
        Self {
            transport,
            voice: None,
            state: watch::Sender::new(state),
        }
    }

    pub fn with_voice(mut self, voice: VoiceChannel) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    // ── Text ──

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.draft = text);
    }

    pub async fn send_draft(&self) -> SendOutcome {
        let draft = self.state.borrow().draft.clone();
        self.send_text(&draft).await
    }

    /// Append the user's message right away, then ask the backend. Empty text
    /// and calls made while another request is outstanding are rejected.
    pub async fn send_text(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Rejected(RejectReason::Empty);
        }

        let mut request = None;
        self.state.send_if_modified(|s| {
            if s.phase != SessionPhase::Idle {
                return false;
            }
            s.push(Role::User, text.to_string(), None);
            s.draft.clear();
            s.phase = SessionPhase::Sending;
            request = Some(ChatRequest {
                message: text.to_string(),
                language: s.config.language,
                use_voice: s.config.voice_mode,
            });
            true
        });
        let Some(request) = request else {
            tracing::debug!("Request already in flight; rejecting message");
            return SendOutcome::Rejected(RejectReason::Busy);
        };

        let in_flight = InFlight::new(&self.state);
        tracing::debug!(
            "Sending chat message (language={}, voice={})",
            request.language,
            request.use_voice
        );
        match self.transport.chat(&request).await {
            Ok(resp) => {
                let audio_url = resp.audio_url.clone();
                in_flight.complete(|s| s.push(Role::Assistant, resp.response, resp.audio_url));
                if let Some(url) = audio_url.filter(|_| request.use_voice) {
                    self.play(&url);
                }
                SendOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                in_flight.complete(|s| s.push(Role::SystemError, CHAT_ERROR_MESSAGE.to_string(), None));
                SendOutcome::Failed
            }
        }
    }

    // ── Config ──

    pub fn toggle_language(&self) {
        self.state
            .send_modify(|s| s.config.language = s.config.language.toggled());
    }

    pub fn set_language(&self, code: &str) -> Result<(), ValidationError> {
        let language = code.parse()?;
        self.state.send_modify(|s| s.config.language = language);
        Ok(())
    }

    /// Flip voice mode. Recording is a separate intent.
    pub fn toggle_voice_mode(&self) {
        self.state
            .send_modify(|s| s.config.voice_mode = !s.config.voice_mode);
    }

    /// Greet the user once their documents are ready to be queried.
    pub fn documents_ready(&self, count: usize) {
        if count == 0 {
            return;
        }
        let greeting = format!(
            "Welcome to NEXUS! I've processed {} document(s). Ask me anything about your documents.",
            count
        );
        self.state
            .send_modify(|s| s.push(Role::Assistant, greeting, None));
    }

    // ── Voice ──

    pub fn start_recording(&self) -> RecordingOutcome {
        let Some(voice) = &self.voice else {
            return RecordingOutcome::Unavailable;
        };

        let claimed = self.state.send_if_modified(|s| {
            if s.phase != SessionPhase::Idle {
                return false;
            }
            s.phase = SessionPhase::Recording;
            s.config.recording = true;
            true
        });
        if !claimed {
            return RecordingOutcome::Ignored;
        }

        match voice.begin() {
            Ok(()) => RecordingOutcome::Started,
            Err(e) => {
                self.state.send_modify(|s| {
                    s.phase = SessionPhase::Idle;
                    s.config.recording = false;
                });
                tracing::warn!("Could not start recording: {}", e);
                match e {
                    VoiceError::PermissionDenied(_) => RecordingOutcome::PermissionDenied,
                    _ => RecordingOutcome::Failed,
                }
            }
        }
    }

    /// Finish the recording and send it to the voice endpoint. The answer is
    /// appended like a chat answer and its audio played.
    pub async fn stop_recording(&self) -> RecordingOutcome {
        let Some(voice) = &self.voice else {
            return RecordingOutcome::Unavailable;
        };

        let claimed = self.state.send_if_modified(|s| {
            if s.phase != SessionPhase::Recording {
                return false;
            }
            s.phase = SessionPhase::Sending;
            s.config.recording = false;
            true
        });
        if !claimed {
            return RecordingOutcome::Ignored;
        }
        let in_flight = InFlight::new(&self.state);

        let payload = match voice.finish() {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!("Recording was empty; nothing sent");
                in_flight.complete(|_| {});
                return RecordingOutcome::Discarded;
            }
            Err(e) => {
                tracing::warn!("Could not finalise recording: {}", e);
                in_flight.complete(|s| s.push(Role::SystemError, VOICE_ERROR_MESSAGE.to_string(), None));
                return RecordingOutcome::Failed;
            }
        };

        match self.transport.voice(payload).await {
            Ok(resp) => {
                let audio_url = resp.audio_url.clone();
                in_flight.complete(|s| {
                    if let Some(transcript) = resp.transcript.filter(|t| !t.trim().is_empty()) {
                        s.push(Role::User, transcript, None);
                    }
                    s.push(Role::Assistant, resp.text, resp.audio_url);
                });
                if let Some(url) = audio_url {
                    voice.play(&url);
                }
                RecordingOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!("Voice request failed: {}", e);
                in_flight.complete(|s| s.push(Role::SystemError, VOICE_ERROR_MESSAGE.to_string(), None));
                RecordingOutcome::Failed
            }
        }
    }

    fn play(&self, audio_url: &str) {
        match &self.voice {
            Some(voice) => voice.play(audio_url),
            None => tracing::debug!("Answer audio available at {}", audio_url),
        }
    }
}
