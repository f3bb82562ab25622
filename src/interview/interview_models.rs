use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

pub const QUESTIONS_PER_INTERVIEW: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            _ => Err(AppError::Validation(
                "Difficulty must be Easy, Medium, or Hard".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum InterviewStatus {
    #[sqlx(rename = "in-progress")]
    #[serde(rename = "in-progress")]
    InProgress,
    #[sqlx(rename = "completed")]
    #[serde(rename = "completed")]
    Completed,
}

/// A stored multiple-choice question, correct answer included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub role: String,
    pub questions: Json<Vec<Question>>,
    pub user_answers: Json<Vec<u8>>,
    pub score: i32,
    pub percentage: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent: i32,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn is_completed(&self) -> bool {
        self.status == InterviewStatus::Completed
    }
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub user_id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub role: String,
    pub questions: Vec<Question>,
}

/// The outcome recorded when an interview is submitted.
#[derive(Debug, Clone)]
pub struct Completion {
    pub answers: Vec<u8>,
    pub score: i32,
    pub percentage: i32,
    pub time_spent: i32,
    pub completed_at: DateTime<Utc>,
}

/// Raw aggregates over a user's completed interviews.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct ScoreAggregate {
    pub total: i64,
    pub highest_score: Option<i32>,
    pub lowest_score: Option<i32>,
    pub average_score: Option<f64>,
    pub highest_percentage: Option<i32>,
    pub lowest_percentage: Option<i32>,
    pub average_percentage: Option<f64>,
}

impl ScoreAggregate {
    pub fn from_interviews<'a>(interviews: impl IntoIterator<Item = &'a Interview>) -> Self {
        let (scores, percentages): (Vec<i32>, Vec<i32>) = interviews
            .into_iter()
            .filter(|i| i.is_completed())
            .map(|i| (i.score, i.percentage))
            .unzip();

        if scores.is_empty() {
            return Self::default();
        }

        let mean = |values: &[i32]| values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64;

        Self {
            total: scores.len() as i64,
            highest_score: scores.iter().copied().max(),
            lowest_score: scores.iter().copied().min(),
            average_score: Some(mean(&scores)),
            highest_percentage: percentages.iter().copied().max(),
            lowest_percentage: percentages.iter().copied().min(),
            average_percentage: Some(mean(&percentages)),
        }
    }
}

/// Number of answers matching the key, and that count as a rounded percentage.
pub fn score_answers(questions: &[Question], answers: &[u8]) -> (i32, i32) {
    if questions.is_empty() || questions.len() != answers.len() {
        return (0, 0);
    }

    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.correct_answer == **a)
        .count();
    let percentage = (correct as f64 / questions.len() as f64 * 100.0).round() as i32;

    (correct as i32, percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: u8) -> Question {
        Question {
            question: "Q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_score_answers() {
        let questions: Vec<Question> = [0, 1, 2, 3, 0].into_iter().map(question).collect();

        assert_eq!(score_answers(&questions, &[0, 1, 2, 3, 0]), (5, 100));
        assert_eq!(score_answers(&questions, &[0, 1, 0, 0, 1]), (2, 40));
        assert_eq!(score_answers(&questions, &[3, 3, 3, 0, 3]), (0, 0));
        assert_eq!(score_answers(&questions, &[0, 1]), (0, 0));
    }

    #[test]
    fn test_difficulty_parsing_is_exact() {
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("medium".parse::<Difficulty>().is_err());
        assert!("".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_status_serializes_with_hyphen() {
        assert_eq!(
            serde_json::to_string(&InterviewStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::to_string(&InterviewStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
