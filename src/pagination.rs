use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, Result},
    interview::InterviewSummary,
    message::MessageResponse,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Items per page
    pub limit: Option<i64>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Resolves optional page/limit values, rejecting anything outside
    /// `page >= 1` and `1 <= limit <= max_limit`.
    pub fn resolve(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(i64::from(default_limit));

        if page < 1 || page > i64::from(u32::MAX) {
            return Err(AppError::Validation("Page must be at least 1".to_string()));
        }
        if limit < 1 || limit > i64::from(max_limit) {
            return Err(AppError::Validation(format!(
                "Limit must be between 1 and {}",
                max_limit
            )));
        }

        Ok(Self {
            page: page as u32,
            limit: limit as u32,
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    MessagePage = PaginatedResponse<MessageResponse>,
    InterviewPage = PaginatedResponse<InterviewSummary>
)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let limit = i64::from(pagination.limit.max(1));
        let total_pages = ((total.max(0) + limit - 1) / limit) as u32;

        Self {
            data,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_and_bounds() {
        let p = Pagination::resolve(None, None, 50, 100).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 50 });
        assert_eq!(p.offset(), 0);

        let p = Pagination::resolve(Some(3), Some(20), 50, 100).unwrap();
        assert_eq!(p.offset(), 40);

        assert!(Pagination::resolve(Some(0), None, 50, 100).is_err());
        assert!(Pagination::resolve(Some(1), Some(0), 50, 100).is_err());
        assert!(Pagination::resolve(Some(1), Some(101), 50, 100).is_err());
        assert!(Pagination::resolve(Some(-2), None, 50, 100).is_err());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let p = Pagination { page: 1, limit: 20 };
        assert_eq!(PaginatedResponse::new(vec![1], 41, p).total_pages, 3);
        assert_eq!(PaginatedResponse::<i32>::new(vec![], 0, p).total_pages, 0);
        assert_eq!(PaginatedResponse::new(vec![1], 20, p).total_pages, 1);
    }
}
