//! Shared helpers for the integration tests.

#![allow(dead_code)]

use nexus_client::voice::{AudioFormat, ChunkSink};
use nexus_client::{AudioInput, AudioPlayer, AudioStream, ClientConfig, NexusClient, VoiceError};
use std::sync::Mutex;
use std::time::Duration;

/// Client pointed at a mock server, with no pause between uploads.
pub fn client_for(base_url: &str) -> NexusClient {
    let mut config = ClientConfig::new(base_url).expect("valid url");
    config.upload_delay = Duration::ZERO;
    config.request_timeout = Some(Duration::from_secs(5));
    NexusClient::new(&config).expect("client builds")
}

/// Microphone that hands over one fixed chunk as soon as it is opened.
pub struct ToneMicrophone;

struct Silent;

impl AudioStream for Silent {
    fn stop(&mut self) {}
}

impl AudioInput for ToneMicrophone {
    fn open(&self, _format: AudioFormat, sink: ChunkSink) -> Result<Box<dyn AudioStream>, VoiceError> {
        let tone: Vec<i16> = (0..1600).map(|i| ((i % 32) * 512) as i16).collect();
        sink.send(tone)
            .map_err(|e| VoiceError::Device(e.to_string()))?;
        Ok(Box::new(Silent))
    }
}

#[derive(Default)]
pub struct CollectingPlayer {
    pub played: Mutex<Vec<String>>,
}

impl AudioPlayer for CollectingPlayer {
    fn play(&self, audio_url: &str) -> Result<(), VoiceError> {
        self.played.lock().unwrap().push(audio_url.to_string());
        Ok(())
    }
}
