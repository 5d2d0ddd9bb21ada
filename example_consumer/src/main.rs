//! Example consumer: reconcile the MySQL schema with the models under `models_root/` at startup.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use model_store::{run, ReconcileSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("model_store=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "mysql://root@localhost/model_store".into());
    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let settings = ReconcileSettings::from_env()?;
    let report = run(&pool, &settings).await?;

    for e in &report.config_errors {
        tracing::error!(model = %e.model, error = %e.error, "model not reconciled");
    }
    for f in &report.migration.failed {
        tracing::error!(sql = %f.sql, "{}", f);
    }
    if !report.is_success() {
        return Err(format!(
            "schema reconciliation incomplete: {} config error(s), {} failed statement(s)",
            report.config_errors.len(),
            report.migration.failed.len()
        )
        .into());
    }
    tracing::info!(tables = report.tables.len(), "schema up to date");
    Ok(())
}
