pub mod interview_dto;
pub mod interview_handlers;
pub mod interview_memory;
pub mod interview_models;
pub mod interview_repository;
pub mod interview_service;

pub use interview_dto::InterviewSummary;
pub use interview_memory::InMemoryInterviewStore;
pub use interview_models::{Difficulty, Interview, InterviewStatus, Question};
pub use interview_repository::{InterviewRepository, InterviewStore};
pub use interview_service::InterviewService;
