use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use skypipe_auth::config::AuthConfig;
use skypipe_auth::infra::captcha::Captcha;
use skypipe_auth::infra::mailer::Mailer;
use skypipe_auth::infra::registry::ConnectionRegistry;
use skypipe_auth::router::build_router;
use skypipe_auth::state::AppState;
use skypipe_auth_migration::{Migrator, MigratorTrait};
use skypipe_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AuthConfig::from_env().context("load configuration")?;
    let policy = config.verify_policy()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;
    if config.auto_migrate {
        Migrator::up(&db, None).await.context("run migrations")?;
        info!("migrations applied");
    }

    let redis = deadpool_redis::Config::from_url(&config.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("create Redis pool")?;

    let mailer = Mailer::from_config(config.smtp.as_ref())?;
    if matches!(mailer, Mailer::Log(_)) {
        info!("SMTP_HOST not set; verification codes will only be logged");
    }
    let captcha = Captcha::from_config(
        config.captcha_secret.as_deref(),
        &config.captcha_verify_url,
    );

    let state = AppState {
        db,
        redis,
        mailer,
        captcha,
        registry: ConnectionRegistry::new(),
        policy,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
