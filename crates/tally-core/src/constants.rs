use std::time::Duration;

/// How long a recorded undo action stays available before the slot is cleared.
pub const UNDO_EXPIRY: Duration = Duration::from_secs(10);

/// Locale pin for speech recognition.
pub const SPEECH_LOCALE: &str = "en-US";

/// Default model for the assistant when none is configured.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Maximum number of chat messages kept in the persisted transcript.
pub const CHAT_HISTORY_LIMIT: usize = 200;

/// How many trailing transcript messages are sent with each assistant turn.
pub const CHAT_CONTEXT_WINDOW: usize = 20;

/// Shown when no API key is configured and the assistant cannot be reached.
pub const OFFLINE_REPLY: &str =
    "I'm offline right now - no API key is configured, so I can't help with your lists. \
     You can still manage everything with the keyboard.";

/// Shown when the model's response could not be parsed into a command.
pub const APOLOGY_REPLY: &str = "Sorry, I didn't quite get that. Could you rephrase?";
