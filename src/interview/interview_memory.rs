use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::interview_models::{Completion, Interview, InterviewStatus, NewInterview, ScoreAggregate};
use super::interview_repository::{already_completed, InterviewStore};

#[derive(Default)]
pub struct InMemoryInterviewStore {
    interviews: RwLock<HashMap<Uuid, Interview>>,
}

impl InMemoryInterviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn completed_for<'a>(
        interviews: &'a HashMap<Uuid, Interview>,
        user_id: Uuid,
    ) -> Vec<&'a Interview> {
        let mut completed: Vec<&Interview> = interviews
            .values()
            .filter(|i| i.user_id == user_id && i.is_completed())
            .collect();
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        completed
    }
}

#[async_trait]
impl InterviewStore for InMemoryInterviewStore {
    async fn insert(&self, new_interview: NewInterview) -> Result<Interview> {
        let now = Utc::now();
        let interview = Interview {
            id: Uuid::new_v4(),
            user_id: new_interview.user_id,
            topic: new_interview.topic,
            difficulty: new_interview.difficulty,
            role: new_interview.role,
            questions: Json(new_interview.questions),
            user_answers: Json(Vec::new()),
            score: 0,
            percentage: 0,
            completed_at: None,
            time_spent: 0,
            status: InterviewStatus::InProgress,
            created_at: now,
            updated_at: now,
        };

        self.interviews
            .write()
            .await
            .insert(interview.id, interview.clone());

        Ok(interview)
    }

    async fn find_by_id(&self, interview_id: Uuid) -> Result<Option<Interview>> {
        Ok(self.interviews.read().await.get(&interview_id).cloned())
    }

    async fn complete(&self, interview_id: Uuid, completion: Completion) -> Result<Interview> {
        let mut interviews = self.interviews.write().await;
        let interview = interviews
            .get_mut(&interview_id)
            .ok_or(AppError::NotFound("Interview not found".to_string()))?;

        if interview.is_completed() {
            return Err(already_completed());
        }

        interview.user_answers = Json(completion.answers);
        interview.score = completion.score;
        interview.percentage = completion.percentage;
        interview.time_spent = completion.time_spent;
        interview.completed_at = Some(completion.completed_at);
        interview.status = InterviewStatus::Completed;
        interview.updated_at = Utc::now();

        Ok(interview.clone())
    }

    async fn find_completed(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Interview>> {
        let interviews = self.interviews.read().await;
        Ok(Self::completed_for(&interviews, user_id)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_completed(&self, user_id: Uuid) -> Result<i64> {
        let interviews = self.interviews.read().await;
        Ok(Self::completed_for(&interviews, user_id).len() as i64)
    }

    async fn aggregate_scores(&self, user_id: Uuid) -> Result<ScoreAggregate> {
        let interviews = self.interviews.read().await;
        Ok(ScoreAggregate::from_interviews(
            interviews.values().filter(|i| i.user_id == user_id),
        ))
    }
}
