use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::{GenerationRequest, ModelTier, TextGenerator};
use crate::error::{AppError, Result};
use crate::pagination::{PaginatedResponse, Pagination};

use super::interview_dto::{
    GenerateInterviewRequest, GeneratedInterviewResponse, InterviewDetail, InterviewStatsResponse,
    InterviewSummary, InterviewView, QuestionResult, SubmissionResponse, SubmissionResults,
    SubmitInterviewRequest,
};
use super::interview_models::{
    score_answers, Completion, Difficulty, Interview, NewInterview, Question, OPTIONS_PER_QUESTION,
    QUESTIONS_PER_INTERVIEW,
};
use super::interview_repository::InterviewStore;

pub const HISTORY_DEFAULT_LIMIT: u32 = 10;
pub const HISTORY_MAX_LIMIT: u32 = 50;

#[derive(Deserialize)]
struct GeneratedQuestions {
    #[serde(default)]
    questions: Vec<GeneratedQuestion>,
}

#[derive(Deserialize)]
struct GeneratedQuestion {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(rename = "correctAnswer", alias = "correct_answer")]
    correct_answer: Option<i64>,
    #[serde(default)]
    explanation: Option<String>,
}

fn invalid(reason: &str) -> AppError {
    AppError::AiInvalidResponse(format!("Invalid AI response format: {}", reason))
}

/// Extracts and validates the question set from raw model output.
///
/// The output may wrap the JSON in prose or code fences; everything between
/// the first `{` and the last `}` is taken as the payload.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>> {
    let start = raw.find('{').ok_or_else(|| invalid("no JSON object found"))?;
    let end = raw.rfind('}').ok_or_else(|| invalid("no JSON object found"))?;
    if end < start {
        return Err(invalid("no JSON object found"));
    }

    let parsed: GeneratedQuestions =
        serde_json::from_str(&raw[start..=end]).map_err(|e| invalid(&e.to_string()))?;

    if parsed.questions.len() != QUESTIONS_PER_INTERVIEW {
        return Err(invalid(&format!(
            "expected {} questions, got {}",
            QUESTIONS_PER_INTERVIEW,
            parsed.questions.len()
        )));
    }

    parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(index, q)| {
            let position = index + 1;
            let question = q.question.trim().to_string();
            if question.is_empty() {
                return Err(invalid(&format!("question {} has no text", position)));
            }

            let options: Vec<String> = q.options.iter().map(|o| o.trim().to_string()).collect();
            if options.len() != OPTIONS_PER_QUESTION || options.iter().any(String::is_empty) {
                return Err(invalid(&format!(
                    "question {} must have {} non-empty options",
                    position, OPTIONS_PER_QUESTION
                )));
            }

            let correct_answer = match q.correct_answer {
                Some(answer) if (0..OPTIONS_PER_QUESTION as i64).contains(&answer) => answer as u8,
                _ => {
                    return Err(invalid(&format!(
                        "question {} has an invalid correct answer",
                        position
                    )))
                }
            };

            Ok(Question {
                question,
                options,
                correct_answer,
                explanation: q.explanation.unwrap_or_default(),
            })
        })
        .collect()
}

fn full_prompt(topic: &str, difficulty: Difficulty, role: &str) -> String {
    format!(
        r#"Generate exactly 5 multiple-choice interview questions for the following:

Topic: {topic}
Difficulty Level: {difficulty}
Role: {role}

Requirements:
1. Each question should have exactly 4 options (A, B, C, D)
2. Questions should be relevant to the {role} role and {topic} topic
3. Difficulty should match the {difficulty} level
4. Include a brief explanation for the correct answer
5. Format the response as valid JSON

Expected JSON format:
{{
  "questions": [
    {{
      "question": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Brief explanation of why this is correct"
    }}
  ]
}}

Make sure the correctAnswer is the index (0-3) of the correct option in the options array."#
    )
}

fn compact_prompt(topic: &str, difficulty: Difficulty, role: &str) -> String {
    format!(
        r#"Return only JSON: {{"questions":[{{"question":"...","options":["...","...","...","..."],"correctAnswer":0,"explanation":"..."}}]}} with exactly 5 {difficulty} multiple-choice questions about {topic} for a {role}. correctAnswer is the 0-3 index of the right option."#
    )
}

fn required(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct InterviewService {
    interviews: Arc<dyn InterviewStore>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl InterviewService {
    pub fn new(interviews: Arc<dyn InterviewStore>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            interviews,
            generator,
        }
    }

    pub async fn generate(
        &self,
        user_id: Uuid,
        request: GenerateInterviewRequest,
    ) -> Result<GeneratedInterviewResponse> {
        let (topic, difficulty, role) = match (
            required(&request.topic),
            required(&request.difficulty),
            required(&request.role),
        ) {
            (Some(topic), Some(difficulty), Some(role)) => (topic, difficulty, role),
            _ => {
                return Err(AppError::Validation(
                    "Topic, difficulty, and role are required".to_string(),
                ))
            }
        };
        let difficulty: Difficulty = difficulty.parse()?;

        let generator = self.generator.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "AI service is currently unavailable. Please check the server configuration."
                    .to_string(),
            )
        })?;

        let unavailable = || {
            AppError::ServiceUnavailable(
                "AI service is temporarily unavailable. Please try again later.".to_string(),
            )
        };

        let raw = match generator
            .generate(GenerationRequest::new(full_prompt(topic, difficulty, role)))
            .await
        {
            Ok(raw) => raw,
            Err(e) if e.is_terminal() => {
                warn!(%user_id, error = %e, "Interview generation rejected by AI service");
                return Err(unavailable());
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Interview generation failed, retrying with compact prompt");
                let retry = GenerationRequest::new(compact_prompt(topic, difficulty, role))
                    .on(ModelTier::Fallback);
                generator.generate(retry).await.map_err(|e| {
                    warn!(%user_id, error = %e, "Interview generation retry failed");
                    unavailable()
                })?
            }
        };

        let questions = parse_questions(&raw)?;

        let interview = self
            .interviews
            .insert(NewInterview {
                user_id,
                topic: topic.to_string(),
                difficulty,
                role: role.to_string(),
                questions,
            })
            .await?;

        info!(%user_id, interview_id = %interview.id, %difficulty, "Interview generated");

        Ok(GeneratedInterviewResponse {
            message: "Interview questions generated successfully".to_string(),
            interview: InterviewView::from(&interview),
        })
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        interview_id: Uuid,
        request: SubmitInterviewRequest,
    ) -> Result<SubmissionResponse> {
        if request.answers.len() != QUESTIONS_PER_INTERVIEW {
            return Err(AppError::Validation(format!(
                "Exactly {} answers are required",
                QUESTIONS_PER_INTERVIEW
            )));
        }

        let answers = request
            .answers
            .iter()
            .map(|&a| {
                u8::try_from(a)
                    .ok()
                    .filter(|&a| usize::from(a) < OPTIONS_PER_QUESTION)
                    .ok_or_else(|| {
                        AppError::Validation(
                            "Each answer must be a number between 0 and 3".to_string(),
                        )
                    })
            })
            .collect::<Result<Vec<u8>>>()?;

        let interview = self.owned(user_id, interview_id, "submit").await?;
        if interview.is_completed() {
            return Err(AppError::Validation("Interview already completed".to_string()));
        }

        let (score, percentage) = score_answers(&interview.questions, &answers);
        let time_spent = request
            .time_spent
            .unwrap_or(0)
            .clamp(0, i64::from(i32::MAX)) as i32;

        let completed = self
            .interviews
            .complete(
                interview_id,
                Completion {
                    answers: answers.clone(),
                    score,
                    percentage,
                    time_spent,
                    completed_at: Utc::now(),
                },
            )
            .await?;

        info!(%user_id, %interview_id, score, percentage, "Interview submitted");

        let questions = completed
            .questions
            .iter()
            .zip(&answers)
            .map(|(q, &user_answer)| QuestionResult {
                question: q.question.clone(),
                options: q.options.clone(),
                user_answer,
                correct_answer: q.correct_answer,
                is_correct: user_answer == q.correct_answer,
                explanation: q.explanation.clone(),
            })
            .collect();

        Ok(SubmissionResponse {
            message: "Interview submitted successfully".to_string(),
            results: SubmissionResults {
                score: completed.score,
                percentage: completed.percentage,
                total_questions: completed.questions.len(),
                correct_answers: completed.score,
                time_spent: completed.time_spent,
                questions,
            },
        })
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<PaginatedResponse<InterviewSummary>> {
        let interviews = self
            .interviews
            .find_completed(user_id, pagination.limit(), pagination.offset())
            .await?;
        let total = self.interviews.count_completed(user_id).await?;

        Ok(PaginatedResponse::new(interviews, total, pagination).map(InterviewSummary::from))
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<InterviewStatsResponse> {
        let aggregate = self.interviews.aggregate_scores(user_id).await?;
        Ok(InterviewStatsResponse::from(aggregate))
    }

    pub async fn get(&self, user_id: Uuid, interview_id: Uuid) -> Result<InterviewDetail> {
        let interview = self.owned(user_id, interview_id, "view").await?;
        Ok(InterviewDetail::from(interview))
    }

    async fn owned(&self, user_id: Uuid, interview_id: Uuid, action: &str) -> Result<Interview> {
        let interview = self
            .interviews
            .find_by_id(interview_id)
            .await?
            .ok_or(AppError::NotFound("Interview not found".to_string()))?;

        if interview.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "Not authorized to {} this interview",
                action
            )));
        }

        Ok(interview)
    }
}
