pub mod gemini;
pub mod generator;

pub use gemini::GeminiClient;
pub use generator::{AiError, GenerationRequest, ModelTier, TextGenerator};
