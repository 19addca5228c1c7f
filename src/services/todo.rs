use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ApiResult;
use crate::models::{Todo, TodoInput};
use crate::pagination::PageRequest;
use crate::repositories::TodoRepository;

#[async_trait]
pub trait TodoService: Send + Sync {
    async fn create_todo(&self, input: TodoInput) -> ApiResult<Todo>;
    async fn get_todo(&self, id: i64) -> ApiResult<Todo>;
    async fn update_todo(&self, id: i64, input: TodoInput) -> ApiResult<Todo>;
    async fn delete_todo(&self, id: i64) -> ApiResult<()>;
    async fn list_todos(&self, page: PageRequest) -> ApiResult<(Vec<Todo>, i64)>;
}

pub struct TodoServiceImpl {
    repo: Arc<dyn TodoRepository>,
}

impl TodoServiceImpl {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TodoService for TodoServiceImpl {
    async fn create_todo(&self, input: TodoInput) -> ApiResult<Todo> {
        self.repo.create(&input).await
    }

    async fn get_todo(&self, id: i64) -> ApiResult<Todo> {
        self.repo.get_by_id(id).await
    }

    async fn update_todo(&self, id: i64, input: TodoInput) -> ApiResult<Todo> {
        self.repo.update(id, &input).await
    }

    async fn delete_todo(&self, id: i64) -> ApiResult<()> {
        self.repo.delete(id).await
    }

    async fn list_todos(&self, page: PageRequest) -> ApiResult<(Vec<Todo>, i64)> {
        self.repo.list(page).await
    }
}
