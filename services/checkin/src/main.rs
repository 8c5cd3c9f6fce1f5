use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod evaluator;
mod jwt;
mod middleware;
mod models;
mod reports;
mod repositories;
mod routes;
mod state;
mod storage;
mod validation;

use crate::config::AppConfig;
use crate::evaluator::AttendanceEvaluator;
use crate::jwt::{JwtConfig, JwtService};
use crate::repositories::{PeriodRepository, RecordRepository, UserRepository};
use crate::state::AppState;
use crate::storage::ContentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting check-in service");

    let app_config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_config = common::database::DatabaseConfig::from_env()?;
    let pool = common::database::init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    let user_repository = UserRepository::new(pool.clone());
    let period_repository = PeriodRepository::new(pool.clone());
    let record_repository = RecordRepository::new(pool.clone());
    let content_store = ContentStore::new(app_config.upload_dir.clone());
    let evaluator = AttendanceEvaluator::new(
        period_repository.clone(),
        record_repository.clone(),
        content_store.clone(),
    );

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        user_repository,
        period_repository,
        record_repository,
        content_store,
        evaluator,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr).await?;
    info!("Check-in service listening on {}", app_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
