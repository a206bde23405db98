use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One structured action returned by the model per user turn.
///
/// Category and item fields carry free-text names; the interpreter
/// resolves them against the store case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AssistantCommand {
    AddItem {
        category: String,
        content: String,
        #[serde(default)]
        due_date: Option<String>,
        #[serde(default)]
        notes: Option<String>,
    },
    UpdateItem {
        category: String,
        item: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        completed: Option<bool>,
        #[serde(default)]
        due_date: Option<String>,
        #[serde(default)]
        notes: Option<String>,
    },
    DeleteItem {
        category: String,
        item: String,
    },
    CreateCategory {
        name: String,
        #[serde(default)]
        icon: Option<String>,
    },
    RenameCategory {
        category: String,
        name: String,
    },
    DeleteCategory {
        category: String,
    },
    /// Second step of the non-empty-category delete flow.
    ConfirmDeleteCategory {
        category: String,
    },
    MergeCategories {
        source: String,
        destination: String,
    },
    /// Filtered bulk delete of completed items, optionally scoped to one
    /// category.
    ClearCompleted {
        #[serde(default)]
        category: Option<String>,
    },
    /// Plain conversational answer, no mutation.
    Reply {
        message: String,
    },
}

/// The JSON schema sent with every request via `response_format`.
/// Mirrors the serde representation above (`action` tag + per-variant
/// fields flattened into one object).
pub fn command_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "action": {
                "type": "string",
                "enum": [
                    "add_item",
                    "update_item",
                    "delete_item",
                    "create_category",
                    "rename_category",
                    "delete_category",
                    "confirm_delete_category",
                    "merge_categories",
                    "clear_completed",
                    "reply",
                ],
            },
            "category": { "type": "string" },
            "item": { "type": "string" },
            "content": { "type": "string" },
            "name": { "type": "string" },
            "icon": { "type": "string" },
            "completed": { "type": "boolean" },
            "due_date": { "type": "string", "description": "ISO date, YYYY-MM-DD" },
            "notes": { "type": "string" },
            "source": { "type": "string" },
            "destination": { "type": "string" },
            "message": { "type": "string" },
        },
        "required": ["action"],
        "additionalProperties": false,
    })
}

/// Parse the raw model output into a command. Tolerates the code fences
/// some models wrap JSON in even when structured output is requested.
pub fn parse_command(raw: &str) -> Result<AssistantCommand> {
    let trimmed = strip_code_fences(raw);
    serde_json::from_str(trimmed).context("Model response was not a valid command")
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_item() {
        let cmd = parse_command(
            r#"{"action": "add_item", "category": "Shopping", "content": "milk"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            AssistantCommand::AddItem {
                category: "Shopping".to_string(),
                content: "milk".to_string(),
                due_date: None,
                notes: None,
            }
        );
    }

    #[test]
    fn test_parse_with_code_fence() {
        let raw = "```json\n{\"action\": \"reply\", \"message\": \"Done!\"}\n```";
        let cmd = parse_command(raw).unwrap();
        assert_eq!(
            cmd,
            AssistantCommand::Reply {
                message: "Done!".to_string()
            }
        );
    }

    #[test]
    fn test_parse_clear_completed_without_scope() {
        let cmd = parse_command(r#"{"action": "clear_completed"}"#).unwrap();
        assert_eq!(cmd, AssistantCommand::ClearCompleted { category: None });
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_command("I added milk for you!").is_err());
        assert!(parse_command(r#"{"action": "launch_rocket"}"#).is_err());
    }

    #[test]
    fn test_schema_lists_every_action() {
        let schema = command_schema();
        let actions = schema["properties"]["action"]["enum"].as_array().unwrap();
        // One schema entry per serde variant.
        assert_eq!(actions.len(), 10);
    }
}
