use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::{check_not_blank, finish};

/// Form body of the login route.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_blank(&mut errors, "username", &self.username);
        finish(errors)
    }
}

/// Bearer token returned after a successful login.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
        }
    }
}

/// Payload registering the authenticated user as a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreate {
    /// Must equal the authenticated username.
    pub name: String,
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_blank(&mut errors, "name", &self.name);
        finish(errors)
    }
}
