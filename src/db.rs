use log::{error, info};
use sqlx::{migrate::MigrateDatabase, postgres::PgPoolOptions, PgPool, Postgres};

pub type DbPool = PgPool;

const MAX_CONNECTIONS: u32 = 10;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    // Create database if it doesn't exist
    if !Postgres::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database...");
        if let Err(e) = Postgres::create_database(database_url).await {
            error!("Error creating database: {}", e);
            sentry::capture_error(&e);
            return Err(e);
        }
        info!("Database created successfully.");
    }

    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Applies the schema for every entity. Safe to run on each start.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(50) NOT NULL,
            pass BYTEA NOT NULL,
            email VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMPTZ
        )
        "#,
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_name ON users (name)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)",
        "CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users (deleted_at)",
        r#"
        CREATE TABLE IF NOT EXISTS todos (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMPTZ
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_todos_deleted_at ON todos (deleted_at)",
    ];

    for statement in statements {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            error!("Migration error: {}", e);
            sentry::capture_error(&e);
            return Err(e);
        }
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Drops every table created by [`run_migrations`].
pub async fn revert_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    info!("Reverting database migrations...");
    sqlx::query("DROP TABLE IF EXISTS todos").execute(pool).await?;
    sqlx::query("DROP TABLE IF EXISTS users").execute(pool).await?;
    info!("Database migrations reverted");
    Ok(())
}
