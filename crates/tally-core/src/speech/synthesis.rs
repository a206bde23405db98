use std::io::Cursor;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::warn;

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";

/// Fallback voice when none is configured ("Rachel", an ElevenLabs stock
/// voice).
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Text-to-speech client for an ElevenLabs-compatible endpoint.
pub struct SpeechSynthesizer {
    api_key: String,
    voice_id: String,
    client: reqwest::Client,
}

impl SpeechSynthesizer {
    pub fn new(api_key: String, voice_id: Option<String>) -> Self {
        Self {
            api_key,
            voice_id: voice_id.unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Generate audio for the given text. Returns MP3 bytes.
    pub async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/text-to-speech/{}",
            ELEVENLABS_API_BASE, self.voice_id
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": "eleven_turbo_v2",
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send text-to-speech request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Text-to-speech error ({}): {}", status, error_text);
        }

        let audio_bytes = response
            .bytes()
            .await
            .context("Failed to read audio response")?
            .to_vec();

        Ok(audio_bytes)
    }
}

/// Plays synthesized audio through the default output device. Absence of
/// an audio device is not an error - playback calls just report failure.
pub struct SpeechPlayer {
    /// Output stream must be kept alive for the duration of playback.
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    sink: Mutex<Option<Sink>>,
}

impl SpeechPlayer {
    pub fn new() -> Self {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok((stream, handle)) => (Some(stream), Some(handle)),
            Err(e) => {
                warn!("Failed to initialize audio output: {}", e);
                (None, None)
            }
        };
        Self {
            _stream: stream,
            stream_handle,
            sink: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.stream_handle.is_some()
    }

    /// Start playing an in-memory MP3, replacing whatever was playing.
    pub fn play(&self, audio_bytes: Vec<u8>) -> Result<()> {
        let handle = self
            .stream_handle
            .as_ref()
            .context("Audio output not available")?;

        let source =
            Decoder::new(Cursor::new(audio_bytes)).context("Failed to decode audio")?;
        let sink = Sink::try_new(handle).context("Failed to create audio sink")?;
        sink.append(source);

        let mut guard = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.take() {
            old.stop();
        }
        *guard = Some(sink);
        Ok(())
    }

    pub fn stop(&self) {
        let mut guard = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sink) = guard.take() {
            sink.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        let guard = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().is_some_and(|s| !s.empty())
    }
}

impl Default for SpeechPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation_without_device_is_ok() {
        let player = SpeechPlayer::new();
        // Created either way; playback state just reports stopped.
        assert!(!player.is_playing());
    }

    #[tokio::test]
    #[ignore] // Requires actual API key
    async fn test_text_to_speech() {
        let api_key =
            std::env::var("TALLY_ELEVENLABS_API_KEY").expect("TALLY_ELEVENLABS_API_KEY not set");
        let synth = SpeechSynthesizer::new(api_key, None);
        let audio = synth.text_to_speech("Milk added to shopping.").await.unwrap();
        assert!(!audio.is_empty());
    }
}
