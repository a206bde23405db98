use anyhow::{Context, Result};

use crate::models::ChatMessage;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Chat-completions client for an OpenRouter-compatible endpoint. One
/// request per user turn: system prompt + trailing transcript + the
/// command JSON schema, structured output enforced via `response_format`.
pub struct LlmClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Send one assistant turn and return the raw JSON payload the model
    /// produced. Parsing into a command happens on the caller's side so a
    /// malformed response can degrade to an apology instead of an error.
    pub async fn request_command(
        &self,
        system_prompt: &str,
        transcript: &[ChatMessage],
    ) -> Result<String> {
        let url = format!("{}/chat/completions", OPENROUTER_API_BASE);

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": system_prompt,
        })];
        for msg in transcript {
            messages.push(serde_json::json!({
                "role": msg.role(),
                "content": msg.text,
            }));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "assistant_command",
                    "strict": true,
                    "schema": super::command_schema(),
                },
            },
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completion error ({}): {}", status, error_text);
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to extract message content from response")?
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual API key
    async fn test_request_command() {
        let api_key =
            std::env::var("TALLY_OPENROUTER_API_KEY").expect("TALLY_OPENROUTER_API_KEY not set");
        let client = LlmClient::new(api_key, "openai/gpt-4o-mini".to_string());

        let transcript = vec![ChatMessage::user("add milk to my shopping list")];
        let raw = client
            .request_command("You manage the user's lists.", &transcript)
            .await
            .unwrap();

        assert!(raw.contains("action"));
    }
}
