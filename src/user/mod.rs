pub mod user_dto;
pub mod user_handlers;
pub mod user_memory;
pub mod user_models;
pub mod user_repository;
pub mod user_service;

pub use user_memory::InMemoryUserStore;
pub use user_models::{FollowOutcome, NewUser, ProfileUpdate, User, UserResponse, UserRole, UserSummary};
pub use user_repository::{UserRepository, UserStore};
pub use user_service::UserService;
