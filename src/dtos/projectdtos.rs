use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::usermodel::UserRole;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProjectDto {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,

    #[validate(range(min = 1, message = "Budget must be positive"))]
    pub budget: i64, // in cents
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProvisionAccountDto {
    pub user_id: Uuid,
    pub role: UserRole,
}
