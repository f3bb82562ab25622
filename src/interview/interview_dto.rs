use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::interview_models::{Difficulty, Interview, InterviewStatus, ScoreAggregate};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateInterviewRequest {
    #[serde(default)]
    pub topic: String,
    /// One of Easy, Medium, Hard
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitInterviewRequest {
    #[serde(default)]
    pub answers: Vec<i64>,
    /// Seconds spent answering
    pub time_spent: Option<i64>,
}

/// A question as shown while the interview is being taken.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InterviewView {
    pub id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub role: String,
    pub questions: Vec<QuestionView>,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Interview> for InterviewView {
    fn from(interview: &Interview) -> Self {
        Self {
            id: interview.id,
            topic: interview.topic.clone(),
            difficulty: interview.difficulty,
            role: interview.role.clone(),
            questions: interview
                .questions
                .iter()
                .map(|q| QuestionView {
                    question: q.question.clone(),
                    options: q.options.clone(),
                })
                .collect(),
            status: interview.status,
            created_at: interview.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedInterviewResponse {
    pub message: String,
    pub interview: InterviewView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionResult {
    pub question: String,
    pub options: Vec<String>,
    pub user_answer: u8,
    pub correct_answer: u8,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResults {
    pub score: i32,
    pub percentage: i32,
    pub total_questions: usize,
    pub correct_answers: i32,
    pub time_spent: i32,
    pub questions: Vec<QuestionResult>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub message: String,
    pub results: SubmissionResults,
}

/// One row of the interview history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterviewSummary {
    pub id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub role: String,
    pub score: i32,
    pub percentage: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent: i32,
}

impl From<Interview> for InterviewSummary {
    fn from(interview: Interview) -> Self {
        Self {
            id: interview.id,
            topic: interview.topic,
            difficulty: interview.difficulty,
            role: interview.role,
            score: interview.score,
            percentage: interview.percentage,
            completed_at: interview.completed_at,
            time_spent: interview.time_spent,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InterviewStatsResponse {
    pub total_interviews: i64,
    pub highest_score: i32,
    pub lowest_score: i32,
    pub average_score: f64,
    pub highest_percentage: i32,
    pub lowest_percentage: i32,
    pub average_percentage: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<ScoreAggregate> for InterviewStatsResponse {
    fn from(agg: ScoreAggregate) -> Self {
        Self {
            total_interviews: agg.total,
            highest_score: agg.highest_score.unwrap_or(0),
            lowest_score: agg.lowest_score.unwrap_or(0),
            average_score: round2(agg.average_score.unwrap_or(0.0)),
            highest_percentage: agg.highest_percentage.unwrap_or(0),
            lowest_percentage: agg.lowest_percentage.unwrap_or(0),
            average_percentage: round2(agg.average_percentage.unwrap_or(0.0)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionDetail {
    pub question: String,
    pub options: Vec<String>,
    /// Present once the interview is completed
    pub correct_answer: Option<u8>,
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InterviewDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub role: String,
    pub questions: Vec<QuestionDetail>,
    pub user_answers: Vec<u8>,
    pub score: i32,
    pub percentage: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent: i32,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Interview> for InterviewDetail {
    fn from(interview: Interview) -> Self {
        let reveal = interview.is_completed();
        let questions = interview
            .questions
            .0
            .into_iter()
            .map(|q| QuestionDetail {
                question: q.question,
                options: q.options,
                correct_answer: reveal.then_some(q.correct_answer),
                explanation: reveal.then_some(q.explanation),
            })
            .collect();

        Self {
            id: interview.id,
            user_id: interview.user_id,
            topic: interview.topic,
            difficulty: interview.difficulty,
            role: interview.role,
            questions,
            user_answers: interview.user_answers.0,
            score: interview.score,
            percentage: interview.percentage,
            completed_at: interview.completed_at,
            time_spent: interview.time_spent,
            status: interview.status,
            created_at: interview.created_at,
            updated_at: interview.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_round_to_two_decimals_and_default_to_zero() {
        let stats = InterviewStatsResponse::from(ScoreAggregate {
            total: 3,
            highest_score: Some(5),
            lowest_score: Some(2),
            average_score: Some(11.0 / 3.0),
            highest_percentage: Some(100),
            lowest_percentage: Some(40),
            average_percentage: Some(220.0 / 3.0),
        });
        assert_eq!(stats.average_score, 3.67);
        assert_eq!(stats.average_percentage, 73.33);

        let empty = InterviewStatsResponse::from(ScoreAggregate::default());
        assert_eq!(empty.total_interviews, 0);
        assert_eq!(empty.highest_score, 0);
        assert_eq!(empty.average_percentage, 0.0);
    }
}
