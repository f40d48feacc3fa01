//! Voice mode plumbing: microphone capture, clip finalisation and playback of
//! spoken answers.
//!
//! Platform audio is reached through [`AudioInput`] and [`AudioPlayer`]; the
//! UI shell supplies implementations for whatever device layer it runs on.
//! Captured PCM chunks are buffered until the recording stops, then encoded
//! into a single WAV clip for the `/voice` endpoint.

use crate::error::VoiceError;
use crate::transport::VoicePayload;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

pub const RECORDING_FILENAME: &str = "recording.wav";
pub const RECORDING_MIME: &str = "audio/wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

/// Receives interleaved 16-bit PCM chunks from a running capture.
pub type ChunkSink = mpsc::UnboundedSender<Vec<i16>>;

/// A running capture. No chunks are delivered after `stop`.
pub trait AudioStream: Send {
    fn stop(&mut self);
}

/// Microphone access.
pub trait AudioInput: Send + Sync {
    /// Ask for the microphone and start pushing chunks into `sink`.
    /// A refusal must come back as [`VoiceError::PermissionDenied`].
    fn open(&self, format: AudioFormat, sink: ChunkSink) -> Result<Box<dyn AudioStream>, VoiceError>;
}

/// Plays an answer's audio, addressed by absolute URL.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, audio_url: &str) -> Result<(), VoiceError>;
}

struct ActiveRecording {
    stream: Box<dyn AudioStream>,
    chunks: mpsc::UnboundedReceiver<Vec<i16>>,
}

/// Capture and playback half of voice mode. The owning conversation drives
/// its phases; this type only holds the devices and the chunk buffer.
pub struct VoiceChannel {
    input: Arc<dyn AudioInput>,
    player: Option<Arc<dyn AudioPlayer>>,
    format: AudioFormat,
    active: Mutex<Option<ActiveRecording>>,
}

impl VoiceChannel {
    pub fn new(input: Arc<dyn AudioInput>) -> Self {
        Self {
            input,
            player: None,
            format: AudioFormat::default(),
            active: Mutex::new(None),
        }
    }

    pub fn with_player(mut self, player: Arc<dyn AudioPlayer>) -> Self {
        self.player = Some(player);
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_recording(&self) -> bool {
        self.active().is_some()
    }

    /// Open the microphone and start buffering. Does nothing if a capture is
    /// already running.
    pub(crate) fn begin(&self) -> Result<(), VoiceError> {
        let mut active = self.active();
        if active.is_some() {
            return Ok(());
        }
        let (sink, chunks) = mpsc::unbounded_channel();
        let stream = self.input.open(self.format, sink)?;
        tracing::debug!(
            "Recording started ({} Hz, {} channel(s))",
            self.format.sample_rate,
            self.format.channels
        );
        *active = Some(ActiveRecording { stream, chunks });
        Ok(())
    }

    /// Stop the capture and turn everything buffered into one WAV clip.
    /// `None` when nothing was recorded.
    pub(crate) fn finish(&self) -> Result<Option<VoicePayload>, VoiceError> {
        let Some(mut recording) = self.active().take() else {
            return Ok(None);
        };
        recording.stream.stop();
        drop(recording.stream);

        let mut samples = Vec::new();
        while let Ok(chunk) = recording.chunks.try_recv() {
            samples.extend_from_slice(&chunk);
        }
        tracing::debug!("Recording stopped with {} samples", samples.len());
        if samples.is_empty() {
            return Ok(None);
        }

        let wav = encode_wav(&samples, self.format)?;
        Ok(Some(VoicePayload {
            filename: RECORDING_FILENAME.to_string(),
            mime_type: RECORDING_MIME.to_string(),
            bytes: wav.into(),
        }))
    }

    /// Play an answer's audio. Playback problems are logged, never raised.
    pub(crate) fn play(&self, audio_url: &str) {
        match &self.player {
            Some(player) => {
                if let Err(e) = player.play(audio_url) {
                    tracing::warn!("Audio playback failed for {}: {}", audio_url, e);
                }
            }
            None => tracing::debug!("No audio player attached; skipping {}", audio_url),
        }
    }

    fn active(&self) -> std::sync::MutexGuard<'_, Option<ActiveRecording>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Encode 16-bit PCM samples as a WAV file in memory.
pub fn encode_wav(samples: &[i16], format: AudioFormat) -> Result<Vec<u8>, VoiceError> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
