use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::errors::{ApiError, ApiResult};
use crate::models::{NewUser, User};
use crate::repositories::UserRepository;
use crate::utils::PasswordHasher;

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register_user(&self, name: &str, pass: &str, email: &str) -> ApiResult<User>;
    async fn authenticate_user(&self, name: &str, pass: &str) -> ApiResult<User>;
}

pub struct AuthServiceImpl {
    repo: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl AuthServiceImpl {
    pub fn new(repo: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register_user(&self, name: &str, pass: &str, email: &str) -> ApiResult<User> {
        if self.repo.find_by_name(name).await?.is_some() {
            warn!("Registration refused, name already taken: {}", name);
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let user = self
            .repo
            .create(NewUser {
                name: name.to_string(),
                pass: self.hasher.hash(pass)?,
                email: email.to_string(),
            })
            .await
            .map_err(|e| match e {
                ApiError::Conflict(_) => ApiError::Conflict("User already exists".to_string()),
                other => other,
            })?;

        info!("Registered user {} ({})", user.name, user.id);
        Ok(user)
    }

    async fn authenticate_user(&self, name: &str, pass: &str) -> ApiResult<User> {
        if name.is_empty() || pass.is_empty() {
            return Err(ApiError::invalid_credentials());
        }

        let digest = self.hasher.hash(pass)?;
        match self.repo.find_by_credentials(name, &digest).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Failed login for user: {}", name);
                Err(ApiError::invalid_credentials())
            }
        }
    }
}
