use actix_web::HttpServer;
use clap::Parser;
use log::{error, info, warn};
use std::process;
use std::sync::Arc;

use tasklane::auth::AuthKeys;
use tasklane::cli::{Cli, Commands, MigrateCommands};
use tasklane::config::Config;
use tasklane::db::{self, DbPool};
use tasklane::middleware::RateLimiter;
use tasklane::repositories::{PgTodoRepository, PgUserRepository, TodoRepository, UserRepository};
use tasklane::server::{self, AppState};
use tasklane::services::{AuthServiceImpl, TodoServiceImpl};
use tasklane::utils::PasswordHasher;

fn fail(message: String) -> ! {
    error!("{}", message);
    sentry::capture_message(&message, sentry::Level::Error);
    process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            env_logger::init();
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    // Initialize Sentry before anything else that can fail
    let _guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.environment.clone().into()),
                ..Default::default()
            },
        ))
    });

    let pool = match db::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => fail(format!("Failed to create database pool: {:?}", e)),
    };

    match cli.command() {
        Commands::Migrate { cmd: MigrateCommands::Up } => {
            if let Err(e) = db::run_migrations(&pool).await {
                fail(format!("Failed to run migrations: {:?}", e));
            }
            info!("Schema applied");
            Ok(())
        }
        Commands::Migrate { cmd: MigrateCommands::Down } => {
            if let Err(e) = db::revert_migrations(&pool).await {
                fail(format!("Failed to revert migrations: {:?}", e));
            }
            info!("Schema dropped");
            Ok(())
        }
        Commands::Start => serve(config, pool).await,
    }
}

async fn serve(config: Config, pool: DbPool) -> std::io::Result<()> {
    if let Err(e) = db::run_migrations(&pool).await {
        fail(format!("Failed to run migrations: {:?}", e));
    }

    let auth_keys = match AuthKeys::from_config(&config) {
        Ok(keys) => keys,
        Err(e) => fail(format!("Failed to load auth keys: {}", e)),
    };

    if config.is_development() {
        warn!("Running in development mode");
    }

    let todo_repo: Arc<dyn TodoRepository> = Arc::new(PgTodoRepository::new(pool.clone()));
    let user_repo: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let hasher = PasswordHasher::new(auth_keys.salt());

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        config.rate_limit_window_seconds,
    ));
    rate_limiter.start_cleanup_task();

    let state = AppState {
        todo_service: Arc::new(TodoServiceImpl::new(todo_repo)),
        auth_service: Arc::new(AuthServiceImpl::new(user_repo, hasher)),
        auth_keys: Arc::new(auth_keys),
        rate_limiter,
        cors_origins: config.cors_origins(),
    };

    info!("Starting server at http://{}", config.server_address);
    info!(
        "Rate limiting: {} requests per {} seconds",
        config.rate_limit_requests, config.rate_limit_window_seconds
    );
    info!("CORS allowed origins: {}", config.cors_allowed_origins);

    // actix installs its own SIGINT/SIGTERM handlers and drains workers
    HttpServer::new(move || server::build_app(state.clone()))
        .bind(&config.server_address)?
        .run()
        .await?;

    info!("Server stopped, closing database pool");
    pool.close().await;
    Ok(())
}
