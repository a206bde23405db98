use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Optional `config.json` in the data dir. Environment variables win
/// over anything set here.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    openrouter_api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    elevenlabs_api_key: Option<String>,
    #[serde(default)]
    voice_id: Option<String>,
}

impl FileConfig {
    fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("config.json");
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    /// OpenRouter-compatible API key for the assistant. None means offline mode.
    pub llm_api_key: Option<String>,
    /// Model id sent with every chat completion request.
    pub llm_model: String,
    /// ElevenLabs-compatible API key for speech synthesis/recognition.
    pub speech_api_key: Option<String>,
    /// Voice id used for spoken replies.
    pub voice_id: Option<String>,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let file = FileConfig::load(&data_dir);
        Self {
            llm_api_key: std::env::var("TALLY_OPENROUTER_API_KEY")
                .ok()
                .or(file.openrouter_api_key),
            llm_model: std::env::var("TALLY_MODEL")
                .ok()
                .or(file.model)
                .unwrap_or_else(|| crate::constants::DEFAULT_MODEL.to_string()),
            speech_api_key: std::env::var("TALLY_ELEVENLABS_API_KEY")
                .ok()
                .or(file.elevenlabs_api_key),
            voice_id: std::env::var("TALLY_VOICE_ID").ok().or(file.voice_id),
            data_dir,
        }
    }

    /// Platform data directory (`~/.local/share/tally` on Linux), falling back
    /// to a relative directory when the platform dirs are unavailable.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("tally"))
            .unwrap_or_else(|| PathBuf::from("tally_data"))
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(Self::default_data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig::load(dir.path());
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn test_config_file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"model": "openai/gpt-4o", "voice_id": "abc123"}"#,
        )
        .unwrap();

        let config = FileConfig::load(dir.path());
        assert_eq!(config.model.as_deref(), Some("openai/gpt-4o"));
        assert_eq!(config.voice_id.as_deref(), Some("abc123"));
        assert!(config.elevenlabs_api_key.is_none());
    }

    #[test]
    fn test_unparsable_config_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{nope").unwrap();
        let config = FileConfig::load(dir.path());
        assert!(config.model.is_none());
    }
}
