pub mod auth;

pub use auth::{auth_middleware, parse_id, AuthUser};
