#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use argon2::Params;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use tasklane::auth::AuthKeys;
use tasklane::errors::{ApiError, ApiResult};
use tasklane::middleware::RateLimiter;
use tasklane::models::{NewUser, Todo, TodoInput, User};
use tasklane::pagination::PageRequest;
use tasklane::repositories::{TodoRepository, UserRepository};
use tasklane::server::AppState;
use tasklane::services::{AuthServiceImpl, TodoServiceImpl};
use tasklane::utils::PasswordHasher;

pub const SIGNING_KEY: &[u8] = b"integration-test-signing-key-with-enough-bytes!!";

/// Todo storage backed by a vector; mirrors the soft-delete rules of the
/// Postgres repository.
#[derive(Default)]
pub struct InMemoryTodos {
    rows: Mutex<Vec<Todo>>,
}

#[async_trait]
impl TodoRepository for InMemoryTodos {
    async fn create(&self, input: &TodoInput) -> ApiResult<Todo> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let todo = Todo {
            id: rows.len() as i64 + 1,
            title: input.title.clone(),
            completed: input.completed,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.push(todo.clone());
        Ok(todo)
    }

    async fn get_by_id(&self, id: i64) -> ApiResult<Todo> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.deleted_at.is_none())
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("Todo {} not found", id)))
    }

    async fn update(&self, id: i64, input: &TodoInput) -> ApiResult<Todo> {
        let mut rows = self.rows.lock().unwrap();
        let todo = rows
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
            .ok_or_else(|| ApiError::not_found(format!("Todo {} not found", id)))?;
        todo.title = input.title.clone();
        todo.completed = input.completed;
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    async fn delete(&self, id: i64) -> ApiResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let todo = rows
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
            .ok_or_else(|| ApiError::not_found(format!("Todo {} not found", id)))?;
        todo.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> ApiResult<(Vec<Todo>, i64)> {
        let rows = self.rows.lock().unwrap();
        let live: Vec<&Todo> = rows.iter().filter(|t| t.deleted_at.is_none()).collect();
        let items = live
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|t| (*t).clone())
            .collect();
        Ok((items, live.len() as i64))
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, user: NewUser) -> ApiResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.name == user.name || u.email == user.email) {
            return Err(ApiError::Conflict("Resource already exists".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: users.len() as i64 + 1,
            name: user.name,
            pass: user.pass,
            email: user.email,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_name(&self, name: &str) -> ApiResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.name == name).cloned())
    }

    async fn find_by_credentials(&self, name: &str, pass: &[u8]) -> ApiResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.name == name && u.pass == pass)
            .cloned())
    }
}

pub fn auth_keys() -> AuthKeys {
    AuthKeys::new(SIGNING_KEY, [7u8; 32]).unwrap()
}

/// Application state over in-memory storage with cheap hashing parameters.
pub fn test_state(rate_limit: usize) -> AppState {
    let keys = auth_keys();
    let hasher = PasswordHasher::with_params(keys.salt(), Params::new(8, 1, 1, Some(32)).unwrap());

    AppState {
        todo_service: Arc::new(TodoServiceImpl::new(Arc::new(InMemoryTodos::default()))),
        auth_service: Arc::new(AuthServiceImpl::new(Arc::new(InMemoryUsers::default()), hasher)),
        auth_keys: Arc::new(keys),
        rate_limiter: Arc::new(RateLimiter::new(rate_limit, 60)),
        cors_origins: vec!["*".to_string()],
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn token_for(name: &str) -> String {
    auth_keys().issue_token(name).unwrap()
}

pub async fn json_body<B: MessageBody>(resp: ServiceResponse<B>) -> serde_json::Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}
