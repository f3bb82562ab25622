use async_trait::async_trait;

/// Which configured model a request should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelTier {
    #[default]
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: ModelTier,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop_sequences: Vec<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn on(mut self, model: ModelTier) -> Self {
        self.model = model;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Quota exceeded")]
    QuotaExceeded,

    #[error("AI request failed: {0}")]
    Upstream(String),

    #[error("AI returned an empty response")]
    EmptyResponse,
}

impl AiError {
    /// Errors that a retry on another model or prompt cannot fix.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AiError::InvalidApiKey | AiError::QuotaExceeded)
    }
}

/// A hosted text model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError>;
}
