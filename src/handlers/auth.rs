use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use regex::Regex;
use std::sync::LazyLock;

use crate::auth::{extract_claims, AuthKeys};
use crate::errors::{ApiError, ApiResult};
use crate::models::{LoginRequest, MessageResponse, RegisterRequest, RegisterResponse, TokenResponse};
use crate::response::{DataResponse, ErrorResponse};
use crate::services::AuthService;

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

pub fn validate_registration(req: &RegisterRequest) -> ApiResult<()> {
    let name_len = req.name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
        return Err(ApiError::validation(format!(
            "Name must be between {} and {} characters",
            MIN_NAME_LEN, MAX_NAME_LEN
        )));
    }
    if req.pass.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !EMAIL_RE.is_match(&req.email) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = DataResponse<RegisterResponse>),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse)
    )
)]
pub async fn register(
    service: web::Data<dyn AuthService>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    validate_registration(&body)?;

    let user = service.register_user(&body.name, &body.pass, &body.email).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(RegisterResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = DataResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    service: web::Data<dyn AuthService>,
    keys: web::Data<AuthKeys>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let user = service.authenticate_user(&body.name, &body.pass).await?;
    let token = keys.issue_token(&user.name)?;

    info!("User {} logged in", user.name);
    Ok(HttpResponse::Ok().json(DataResponse::new(TokenResponse { token })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Logged out", body = DataResponse<MessageResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn logout(req: HttpRequest) -> ApiResult<HttpResponse> {
    let claims = extract_claims(&req)?;
    // Tokens are stateless; nothing to revoke server-side
    info!("User {} logged out", claims.sub);
    Ok(HttpResponse::Ok().json(DataResponse::new(MessageResponse {
        message: "Successfully logged out".to_string(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "New token issued", body = DataResponse<TokenResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn refresh(req: HttpRequest, keys: web::Data<AuthKeys>) -> ApiResult<HttpResponse> {
    let claims = extract_claims(&req)?;
    let token = keys.issue_token(&claims.sub)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(TokenResponse { token })))
}
