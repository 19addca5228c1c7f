use actix_web::{web, HttpRequest, HttpResponse};
use log::info;

use crate::errors::{ApiError, ApiResult};
use crate::models::{Todo, TodoInput};
use crate::pagination::{PageRequest, PagedResponse, PaginationQuery};
use crate::response::{DataResponse, ErrorResponse};
use crate::services::TodoService;

pub const MIN_TITLE_LEN: usize = 3;
pub const MAX_TITLE_LEN: usize = 255;

pub fn validate_todo(input: &TodoInput) -> ApiResult<()> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    let len = input.title.chars().count();
    if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&len) {
        return Err(ApiError::validation(format!(
            "Title must be between {} and {} characters",
            MIN_TITLE_LEN, MAX_TITLE_LEN
        )));
    }
    Ok(())
}

/// Absolute URL of the current path, used as the base of pagination links.
fn resource_url(req: &HttpRequest) -> String {
    let conn = req.connection_info();
    format!("{}://{}{}", conn.scheme(), conn.host(), req.path())
}

#[utoipa::path(
    post,
    path = "/api/v1/todos",
    tag = "todos",
    security(("bearerAuth" = [])),
    request_body = TodoInput,
    responses(
        (status = 201, description = "Todo created", body = DataResponse<Todo>),
        (status = 400, description = "Invalid todo", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn create_todo(
    service: web::Data<dyn TodoService>,
    input: web::Json<TodoInput>,
) -> ApiResult<HttpResponse> {
    let input = input.into_inner();
    validate_todo(&input)?;

    let todo = service.create_todo(input).await?;
    info!("Created todo {}", todo.id);
    Ok(HttpResponse::Created().json(DataResponse::new(todo)))
}

#[utoipa::path(
    get,
    path = "/api/v1/todos",
    tag = "todos",
    security(("bearerAuth" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of todos ordered by id", body = PagedResponse<Todo>),
        (status = 400, description = "Invalid page or page size", body = ErrorResponse)
    )
)]
pub async fn list_todos(
    req: HttpRequest,
    service: web::Data<dyn TodoService>,
    query: web::Query<PaginationQuery>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::try_from(query.into_inner())?;
    let (todos, total) = service.list_todos(page).await?;

    let body = PagedResponse::new(todos, page, total).with_links(&resource_url(&req));
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/v1/todos/{id}",
    tag = "todos",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo found", body = DataResponse<Todo>),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    )
)]
pub async fn get_todo(
    service: web::Data<dyn TodoService>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let todo = service.get_todo(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(todo)))
}

#[utoipa::path(
    put,
    path = "/api/v1/todos/{id}",
    tag = "todos",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Todo id")),
    request_body = TodoInput,
    responses(
        (status = 200, description = "Todo updated", body = DataResponse<Todo>),
        (status = 400, description = "Invalid todo", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    )
)]
pub async fn update_todo(
    service: web::Data<dyn TodoService>,
    path: web::Path<i64>,
    input: web::Json<TodoInput>,
) -> ApiResult<HttpResponse> {
    let input = input.into_inner();
    validate_todo(&input)?;

    let todo = service.update_todo(path.into_inner(), input).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(todo)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/todos/{id}",
    tag = "todos",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Todo id")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    )
)]
pub async fn delete_todo(
    service: web::Data<dyn TodoService>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    service.delete_todo(id).await?;
    info!("Deleted todo {}", id);
    Ok(HttpResponse::NoContent().finish())
}

pub fn routes() -> actix_web::Scope {
    web::scope("/todos")
        .route("", web::get().to(list_todos))
        .route("", web::post().to(create_todo))
        .route("/{id}", web::get().to(get_todo))
        .route("/{id}", web::put().to(update_todo))
        .route("/{id}", web::delete().to(delete_todo))
}
