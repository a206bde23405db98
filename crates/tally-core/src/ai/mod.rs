pub mod client;
pub mod command;
pub mod interpreter;

pub use client::LlmClient;
pub use command::{command_schema, parse_command, AssistantCommand};
pub use interpreter::{system_prompt, Interpreter, Outcome};
