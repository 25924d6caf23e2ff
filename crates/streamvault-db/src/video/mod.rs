mod memory;
mod postgres;
mod repository;

pub use memory::InMemoryVideoRepository;
pub use postgres::PostgresVideoRepository;
pub use repository::VideoRepository;

use std::sync::Arc;

use sqlx::PgPool;
use streamvault_core::{AppError, Config, RecordStoreBackend};

/// Build the record store selected by `RECORD_STORE`.
///
/// A pool is required for the PostgreSQL backend and ignored otherwise.
pub fn create_video_repository(
    config: &Config,
    pool: Option<PgPool>,
) -> Result<Arc<dyn VideoRepository>, AppError> {
    match config.record_store {
        RecordStoreBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal("PostgreSQL record store requires a connection pool".to_string())
            })?;
            tracing::info!("Initializing PostgreSQL video repository");
            Ok(Arc::new(PostgresVideoRepository::new(pool)))
        }
        RecordStoreBackend::Memory => {
            tracing::warn!("Using in-memory video repository; records are lost on restart");
            Ok(Arc::new(InMemoryVideoRepository::new()))
        }
    }
}
