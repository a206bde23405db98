pub mod capture;
pub mod recognition;
pub mod synthesis;

pub use capture::{record_clip, RecordedClip};
pub use recognition::SpeechRecognizer;
pub use synthesis::{SpeechPlayer, SpeechSynthesizer};
