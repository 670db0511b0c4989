use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// The acquire timeout bounds how long a request can stall on an
/// unreachable database before the failure surfaces as 503.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}
