use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::interview_models::{Completion, Interview, NewInterview, ScoreAggregate};

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn insert(&self, new_interview: NewInterview) -> Result<Interview>;

    async fn find_by_id(&self, interview_id: Uuid) -> Result<Option<Interview>>;

    /// Records answers and score on an in-progress interview. A completed
    /// interview is never overwritten.
    async fn complete(&self, interview_id: Uuid, completion: Completion) -> Result<Interview>;

    /// Completed interviews of a user, most recently completed first.
    async fn find_completed(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Interview>>;

    async fn count_completed(&self, user_id: Uuid) -> Result<i64>;

    async fn aggregate_scores(&self, user_id: Uuid) -> Result<ScoreAggregate>;
}

pub(crate) fn already_completed() -> AppError {
    AppError::Validation("Interview already completed".to_string())
}

#[derive(Clone)]
pub struct InterviewRepository {
    pool: PgPool,
}

impl InterviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for InterviewRepository {
    async fn insert(&self, new_interview: NewInterview) -> Result<Interview> {
        let interview = sqlx::query_as::<_, Interview>(
            "INSERT INTO interviews (user_id, topic, difficulty, role, questions)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new_interview.user_id)
        .bind(&new_interview.topic)
        .bind(new_interview.difficulty)
        .bind(&new_interview.role)
        .bind(Json(&new_interview.questions))
        .fetch_one(&self.pool)
        .await?;

        Ok(interview)
    }

    async fn find_by_id(&self, interview_id: Uuid) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE id = $1")
            .bind(interview_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(interview)
    }

    async fn complete(&self, interview_id: Uuid, completion: Completion) -> Result<Interview> {
        let interview = sqlx::query_as::<_, Interview>(
            "UPDATE interviews
             SET user_answers = $2, score = $3, percentage = $4, time_spent = $5,
                 completed_at = $6, status = 'completed', updated_at = NOW()
             WHERE id = $1 AND status = 'in-progress'
             RETURNING *",
        )
        .bind(interview_id)
        .bind(Json(&completion.answers))
        .bind(completion.score)
        .bind(completion.percentage)
        .bind(completion.time_spent)
        .bind(completion.completed_at)
        .fetch_optional(&self.pool)
        .await?;

        match interview {
            Some(interview) => Ok(interview),
            None => match self.find_by_id(interview_id).await? {
                Some(_) => Err(already_completed()),
                None => Err(AppError::NotFound("Interview not found".to_string())),
            },
        }
    }

    async fn find_completed(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(
            "SELECT * FROM interviews
             WHERE user_id = $1 AND status = 'completed'
             ORDER BY completed_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(interviews)
    }

    async fn count_completed(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM interviews WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn aggregate_scores(&self, user_id: Uuid) -> Result<ScoreAggregate> {
        let aggregate = sqlx::query_as::<_, ScoreAggregate>(
            "SELECT COUNT(*) AS total,
                    MAX(score) AS highest_score,
                    MIN(score) AS lowest_score,
                    AVG(score)::float8 AS average_score,
                    MAX(percentage) AS highest_percentage,
                    MIN(percentage) AS lowest_percentage,
                    AVG(percentage)::float8 AS average_percentage
             FROM interviews
             WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(aggregate)
    }
}
