use std::sync::{Arc, LazyLock};

use chrono::Utc;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::ai::{AiError, GenerationRequest, ModelTier, TextGenerator};
use crate::error::{AppError, Result};
use crate::user::{User, UserRole};

use super::chatbot_dto::{ChatResponse, ChatbotHealthResponse, SuggestionsResponse};

pub const MAX_CHAT_MESSAGE_CHARS: usize = 1000;

const BASE_SUGGESTIONS: [&str; 4] = [
    "How do I prepare for technical interviews?",
    "What career paths are available in my field?",
    "How to build a professional network?",
    "Tips for balancing coursework and projects",
];

const STUDENT_SUGGESTIONS: [&str; 3] = [
    "How to get research opportunities?",
    "What skills are employers looking for?",
    "How to choose between grad school and industry?",
];

const ALUMNI_SUGGESTIONS: [&str; 3] = [
    "How to transition to management roles?",
    "Tips for mentoring students effectively",
    "How to stay updated with industry trends?",
];

const CANNED_REPLIES: [&str; 4] = [
    "I'm having trouble connecting to the AI service right now. Please try again later.",
    "I'm currently unavailable. Feel free to ask alumni in our community while I'm getting fixed!",
    "Temporary service disruption. Our team is working on restoring AI capabilities.",
    "I can't process your request at the moment. Please try again in a few minutes.",
];

const CAREER_REPLY: &str = "I'm currently unable to access career resources. Check our alumni network for professionals in your field!";

static TRIPLE_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*{3}(.*?)\*{3}").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static HEADINGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());

/// Strips the markdown artifacts the model tends to emit despite being told not to.
pub fn clean_response(raw: &str) -> String {
    let cleaned = TRIPLE_STAR.replace_all(raw, "");
    let cleaned = BLANK_LINES.replace_all(&cleaned, "\n\n");
    let cleaned = cleaned.trim();
    let cleaned = HEADINGS.replace_all(cleaned, "");
    let cleaned = BOLD.replace_all(&cleaned, "${1}");
    let cleaned = ITALIC.replace_all(&cleaned, "${1}");
    let cleaned = CODE_BLOCK.replace_all(&cleaned, "");
    cleaned.into_owned()
}

/// Reply used when no model could answer.
pub fn canned_reply(message: &str) -> String {
    let lowered = message.to_lowercase();
    if lowered.contains("career") || lowered.contains("job") {
        return CAREER_REPLY.to_string();
    }

    CANNED_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CANNED_REPLIES[0])
        .to_string()
}

pub fn suggestions_for(role: UserRole) -> Vec<String> {
    let specific: &[&str] = match role {
        UserRole::Student => &STUDENT_SUGGESTIONS,
        UserRole::Alumni => &ALUMNI_SUGGESTIONS,
    };

    BASE_SUGGESTIONS
        .iter()
        .chain(specific.iter())
        .map(|s| s.to_string())
        .collect()
}

fn chat_prompt(user: &User, message: &str) -> String {
    format!(
        r#"You are an AI assistant for AlumniLink, a platform connecting students and alumni.
Your role is to help students with their academic doubts, career guidance, and provide helpful advice.

User Context:
- User Name: {name}
- User Role: {role}
- Platform: AlumniLink (Student-Alumni networking platform)

Guidelines for your responses:
1. Be helpful, informative, and encouraging
2. Provide practical, actionable advice
3. Keep responses concise but comprehensive
4. If it's a technical question, provide clear explanations with examples
5. For career advice, offer specific, actionable guidance
6. Encourage networking and connecting with alumni when relevant
7. Be supportive and motivational
8. If you don't know something, be honest and suggest alternative resources
9. DO NOT use markdown formatting like *** or ** in your responses
10. Use plain text only without special formatting
11. Avoid using code blocks or backticks
12. Structure your response naturally using line breaks only

Student Question: "{message}"

Please provide a helpful response:"#,
        name = user.name,
        role = user.role,
        message = message,
    )
}

#[derive(Clone)]
pub struct ChatbotService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatbotService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn chat(&self, user: &User, message: &str) -> Result<ChatResponse> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }
        if message.chars().count() > MAX_CHAT_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "Message cannot exceed {} characters",
                MAX_CHAT_MESSAGE_CHARS
            )));
        }

        let generator = self.generator.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "AI service is currently unavailable. Please check the server configuration."
                    .to_string(),
            )
        })?;

        let primary = GenerationRequest {
            prompt: chat_prompt(user, trimmed),
            model: ModelTier::Primary,
            temperature: Some(0.7),
            top_p: Some(0.9),
            stop_sequences: vec!["**".to_string(), "***".to_string(), "```".to_string()],
        };

        let (text, fallback) = match generator.generate(primary).await {
            Ok(raw) => (clean_response(&raw), false),
            Err(AiError::InvalidApiKey) => {
                return Err(AppError::ServiceUnavailable(
                    "AI service configuration error. Please contact support.".to_string(),
                ))
            }
            Err(AiError::QuotaExceeded) => {
                return Err(AppError::ServiceUnavailable(
                    "AI service is temporarily unavailable due to high demand. Please try again later."
                        .to_string(),
                ))
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Primary chat generation failed, trying fallback model");
                let bare = GenerationRequest::new(trimmed).on(ModelTier::Fallback);
                match generator.generate(bare).await {
                    Ok(raw) => (clean_response(&raw), true),
                    Err(e) => {
                        warn!(user_id = %user.id, error = %e, "Fallback chat generation failed, using canned reply");
                        (canned_reply(trimmed), true)
                    }
                }
            }
        };

        info!(user_id = %user.id, role = %user.role, fallback, "Chatbot interaction");

        Ok(ChatResponse {
            message: text,
            timestamp: Utc::now(),
            success: true,
            fallback,
        })
    }

    pub fn suggestions(&self, role: UserRole) -> SuggestionsResponse {
        SuggestionsResponse {
            suggestions: suggestions_for(role),
            user_role: role,
        }
    }

    /// Reports configuration and, when configured, pings the model once.
    pub async fn health(&self) -> ChatbotHealthResponse {
        let mut health = ChatbotHealthResponse {
            status: "OK".to_string(),
            gemini_configured: self.generator.is_some(),
            gemini_working: None,
            gemini_error: None,
            timestamp: Utc::now(),
        };

        if let Some(generator) = &self.generator {
            match generator.generate(GenerationRequest::new("Hello")).await {
                Ok(text) => health.gemini_working = Some(!text.is_empty()),
                Err(e) => {
                    debug!(error = %e, "Chatbot health check failed");
                    health.gemini_working = Some(false);
                    health.gemini_error = Some(e.to_string());
                }
            }
        }

        health
    }
}
