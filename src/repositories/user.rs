use async_trait::async_trait;

use crate::db::DbPool;
use crate::errors::ApiResult;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, name, pass, email, created_at, updated_at, deleted_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> ApiResult<User>;
    async fn find_by_name(&self, name: &str) -> ApiResult<Option<User>>;
    /// Looks up a live user whose name and password digest both match.
    async fn find_by_credentials(&self, name: &str, pass: &[u8]) -> ApiResult<Option<User>>;
}

pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> ApiResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, pass, email) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.pass)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_name(&self, name: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE name = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_credentials(&self, name: &str, pass: &[u8]) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE name = $1 AND pass = $2 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(pass)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
