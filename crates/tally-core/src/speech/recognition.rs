use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::SPEECH_LOCALE;

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Speech-to-text client for an ElevenLabs-compatible endpoint. The
/// language is pinned to the app locale rather than auto-detected.
pub struct SpeechRecognizer {
    api_key: String,
    client: reqwest::Client,
}

impl SpeechRecognizer {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Transcribe a WAV recording to text.
    pub async fn transcribe(&self, wav_bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/speech-to-text", ELEVENLABS_API_BASE);

        // Locale pin: "en-US" -> ISO 639-1 "en".
        let language = SPEECH_LOCALE.split('-').next().unwrap_or(SPEECH_LOCALE);

        let file_part = reqwest::multipart::Part::bytes(wav_bytes)
            .file_name("clip.wav")
            .mime_str("audio/wav")
            .context("Failed to build audio part")?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model_id", "scribe_v1")
            .text("language_code", language.to_string());

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to send transcription request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcription error ({}): {}", status, error_text);
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(transcription.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual API key and a microphone recording
    async fn test_transcribe() {
        let api_key =
            std::env::var("TALLY_ELEVENLABS_API_KEY").expect("TALLY_ELEVENLABS_API_KEY not set");
        let recognizer = SpeechRecognizer::new(api_key);

        let clip = crate::speech::record_clip(std::time::Duration::from_secs(3)).unwrap();
        let text = recognizer.transcribe(clip.wav_bytes).await.unwrap();
        assert!(!text.is_empty());
    }
}
