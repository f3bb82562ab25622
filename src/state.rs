use std::sync::Arc;

use anyhow::Context;

use crate::{
    ai::TextGenerator,
    auth::{AuthService, DEFAULT_BCRYPT_COST},
    chatbot::ChatbotService,
    interview::{InterviewService, InterviewStore},
    message::{MessageService, MessageStore},
    upload::UploadService,
    user::{UserService, UserStore},
    websocket::{ConnectionRegistry, DeliveryRelay},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub registry: ConnectionRegistry,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub message_service: MessageService,
    pub upload_service: UploadService,
    pub chatbot_service: ChatbotService,
    pub interview_service: InterviewService,
}

impl AppState {
    /// Wires every service over the given stores. `generator` is `None` when
    /// no AI provider is configured.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        interviews: Arc<dyn InterviewStore>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let registry = ConnectionRegistry::new();

        let auth_service = AuthService::new(
            users.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
            config.bcrypt_cost,
        );
        let user_service = UserService::new(users.clone());
        let message_service =
            MessageService::new(messages, users.clone(), DeliveryRelay::new(registry.clone()));
        let upload_service = UploadService::new(&config.upload_dir, &config.public_base_url);
        let chatbot_service = ChatbotService::new(generator.clone());
        let interview_service = InterviewService::new(interviews, generator);

        Self {
            config: Arc::new(config),
            users,
            registry,
            auth_service,
            user_service,
            message_service,
            upload_service,
            chatbot_service,
            interview_service,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub upload_dir: String,
    pub cors_origins: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_fallback_model: String,
    pub gemini_base_url: String,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let host = var_or("HOST", "127.0.0.1");
        let port = parsed_or("PORT", 5000u16)?;
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let cors_origins = var_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            jwt_secret,
            jwt_expiration_hours: parsed_or("JWT_EXPIRATION_HOURS", 24i64)?,
            bcrypt_cost: parsed_or("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            host,
            port,
            public_base_url,
            upload_dir: var_or("UPLOAD_DIR", "uploads"),
            cors_origins,
            gemini_api_key,
            gemini_model: var_or("GEMINI_MODEL", "gemini-2.5-pro"),
            gemini_fallback_model: var_or("GEMINI_FALLBACK_MODEL", "gemini-2.5-flash"),
            gemini_base_url: var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
        })
    }

    /// Settings for tests and local runs without an environment.
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 24,
            bcrypt_cost: 4,
            host: "127.0.0.1".to_string(),
            port: 5000,
            public_base_url: "http://127.0.0.1:5000".to_string(),
            upload_dir: std::env::temp_dir()
                .join("alumni-link-uploads")
                .to_string_lossy()
                .into_owned(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            gemini_api_key: None,
            gemini_model: "gemini-2.5-pro".to_string(),
            gemini_fallback_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}
