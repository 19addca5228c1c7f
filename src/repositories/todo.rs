use async_trait::async_trait;
use log::debug;

use crate::db::DbPool;
use crate::errors::{ApiError, ApiResult};
use crate::models::{Todo, TodoInput};
use crate::pagination::PageRequest;

const TODO_COLUMNS: &str = "id, title, completed, created_at, updated_at, deleted_at";

/// Storage for todos. Soft-deleted rows are invisible to every method.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, input: &TodoInput) -> ApiResult<Todo>;
    async fn get_by_id(&self, id: i64) -> ApiResult<Todo>;
    async fn update(&self, id: i64, input: &TodoInput) -> ApiResult<Todo>;
    async fn delete(&self, id: i64) -> ApiResult<()>;
    /// Returns one page of todos in insertion order plus the total count.
    async fn list(&self, page: PageRequest) -> ApiResult<(Vec<Todo>, i64)>;
}

pub struct PgTodoRepository {
    pool: DbPool,
}

impl PgTodoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn todo_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Todo {} not found", id))
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn create(&self, input: &TodoInput) -> ApiResult<Todo> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (title, completed) VALUES ($1, $2) RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(&input.title)
        .bind(input.completed)
        .fetch_one(&self.pool)
        .await?;

        debug!("Inserted todo {}", todo.id);
        Ok(todo)
    }

    async fn get_by_id(&self, id: i64) -> ApiResult<Todo> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE id = $1 AND deleted_at IS NULL",
            TODO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| todo_not_found(id))
    }

    async fn update(&self, id: i64, input: &TodoInput) -> ApiResult<Todo> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET title = $1, completed = $2, updated_at = NOW() \
             WHERE id = $3 AND deleted_at IS NULL RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(&input.title)
        .bind(input.completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| todo_not_found(id))
    }

    async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE todos SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(todo_not_found(id));
        }
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> ApiResult<(Vec<Todo>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
            TODO_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((todos, total))
    }
}
