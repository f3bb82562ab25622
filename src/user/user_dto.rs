use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user_models::{ProfileUpdate, UserResponse, UserRole};
use crate::error::{AppError, Result};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchQuery {
    /// Part of the name to look for
    #[serde(default)]
    pub query: String,
    /// `Student`, `Alumni` or `all`
    pub role: Option<String>,
}

impl UserSearchQuery {
    /// The role filter, `None` when absent or `all`.
    pub fn role_filter(&self) -> Result<Option<UserRole>> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(role) if role.eq_ignore_ascii_case("all") => Ok(None),
            Some(role) if role.eq_ignore_ascii_case("student") => Ok(Some(UserRole::Student)),
            Some(role) if role.eq_ignore_ascii_case("alumni") => Ok(Some(UserRole::Alumni)),
            Some(role) => Err(AppError::Validation(format!("Unknown role: {}", role))),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty or exceed 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateProfileRequest {
    pub fn normalized(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            name: trim(self.name),
            bio: trim(self.bio),
            profile_picture: trim(self.profile_picture),
        }
    }
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            name: request.name,
            bio: request.bio,
            profile_picture: request.profile_picture,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowResponse {
    pub message: String,
    pub is_following: bool,
    pub follower_count: i64,
    pub following_count: i64,
}
