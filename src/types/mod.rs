//! Value types passed between callers, managers and providers.

pub mod options;
pub mod result;
pub mod speech;

pub use options::{GenerationOptions, GenerationOptionsBuilder, ResponseFormat};
pub use result::{GenerationResult, StructuredResult, TokenUsage};
pub use speech::{AudioFormat, SpeechOptions, SpeechResult};
