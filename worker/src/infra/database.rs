use crate::infra::error::AppError;
use notification_request_dispatcher::environment::Environment;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};

pub struct Database {
    pub host: String,
    pub name: String,
    pub user: String,
    pub pass: String,
    pub app_name: String,
    pub port: u16,
    pub min_pool_size: u32,
    pub max_pool_size: u32,
    pub run_migrations: bool,
}

impl Database {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            host: Environment::string("DB_HOST", "localhost"),
            name: Environment::string("DB_NAME", "local"),
            user: Environment::string("DB_USER", "local"),
            pass: Environment::string("DB_PASS", "local"),
            app_name: Environment::string("DB_APP_NAME", "notification-request-dispatcher"),
            port: Environment::parse("DB_PORT", 5432)?,
            min_pool_size: Environment::parse("DB_MIN_POOL_SIZE", 1)?,
            max_pool_size: Environment::parse("DB_MAX_POOL_SIZE", 10)?,
            run_migrations: Environment::parse("RUN_MIGRATIONS", true)?,
        })
    }

    pub fn db_connection_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .database(&self.name)
            .username(&self.user)
            .password(&self.pass)
            .port(self.port)
            .application_name(&self.app_name)
    }

    pub async fn create_db_pool(&self) -> Result<Pool<Postgres>, AppError> {
        let postgres_pool = PgPoolOptions::new()
            .min_connections(self.min_pool_size)
            .max_connections(self.max_pool_size)
            .test_before_acquire(true)
            .connect_with(self.db_connection_options())
            .await
            .map_err(|error| AppError::new(&error.to_string(), "Failed to create database pool"))?;

        if self.run_migrations {
            notification_request_dispatcher::MIGRATOR
                .run(&postgres_pool)
                .await
                .map_err(|error| AppError::new(&error.to_string(), "Failed to run database migrations"))?;
        }

        Ok(postgres_pool)
    }
}
