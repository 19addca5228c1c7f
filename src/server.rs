use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Compress;
use actix_web::{web, App, Error};
use actix_web_httpauth::middleware::HttpAuthentication;
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{jwt_validator, AuthKeys};
use crate::handlers;
use crate::middleware::{self, JsonErrors, RateLimitFactory, RateLimiter, Recover, RequestIdFactory};
use crate::models::{
    LoginRequest, MessageResponse, RegisterRequest, RegisterResponse, Todo, TodoInput, TokenResponse,
};
use crate::pagination::{PageLinks, PageMeta};
use crate::response::ErrorResponse;
use crate::services::{AuthService, TodoService};

pub const API_PREFIX: &str = "/api/v1";
pub const OPENAPI_PATH: &str = "/swagger/doc.json";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Tasklane API",
        version = "1.0.0",
        description = "Todo management API with token based authentication."
    ),
    paths(
        handlers::todos::create_todo,
        handlers::todos::list_todos,
        handlers::todos::get_todo,
        handlers::todos::update_todo,
        handlers::todos::delete_todo,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh,
    ),
    components(
        schemas(
            Todo, TodoInput, LoginRequest, RegisterRequest, RegisterResponse,
            TokenResponse, MessageResponse, ErrorResponse, PageMeta, PageLinks
        )
    ),
    tags(
        (name = "todos", description = "Todo CRUD operations"),
        (name = "auth", description = "Registration, login and token management")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    )
)]
pub struct ApiDoc;

/// Everything the application factory needs, cloned once per worker.
#[derive(Clone)]
pub struct AppState {
    pub todo_service: Arc<dyn TodoService>,
    pub auth_service: Arc<dyn AuthService>,
    pub auth_keys: Arc<AuthKeys>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cors_origins: Vec<String>,
}

fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(handlers::auth::register))
        .route("/login", web::post().to(handlers::auth::login))
        .service(
            web::resource("/logout")
                .route(web::post().to(handlers::auth::logout))
                .wrap(HttpAuthentication::bearer(jwt_validator)),
        )
        .service(
            web::resource("/refresh")
                .route(web::post().to(handlers::auth::refresh))
                .wrap(HttpAuthentication::bearer(jwt_validator)),
        )
}

/// Builds the application with the full middleware chain.
///
/// `wrap` order is innermost first, so requests pass through recovery,
/// logging, security headers, CORS, compression, rate limiting and request
/// id tagging before the error envelope and routing.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::from(state.todo_service.clone()))
        .app_data(web::Data::from(state.auth_service.clone()))
        .app_data(web::Data::from(state.auth_keys.clone()))
        .app_data(middleware::json_config())
        .app_data(middleware::query_config())
        .app_data(middleware::path_config())
        .wrap(JsonErrors)
        .wrap(RequestIdFactory)
        .wrap(RateLimitFactory::new(state.rate_limiter.clone()))
        .wrap(Compress::default())
        .wrap(middleware::cors(&state.cors_origins))
        .wrap(middleware::security_headers())
        .wrap(middleware::request_logger())
        .wrap(Recover)
        .service(
            web::scope(API_PREFIX)
                .service(auth_routes())
                .service(handlers::todos::routes().wrap(HttpAuthentication::bearer(jwt_validator))),
        )
        .service(SwaggerUi::new("/swagger/{_:.*}").url(OPENAPI_PATH, ApiDoc::openapi()))
        .default_service(web::to(middleware::not_found))
}
