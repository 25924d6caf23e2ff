use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use streamvault_core::{AppError, NewVideo, VideoRecord};
use uuid::Uuid;

use super::repository::VideoRepository;

#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    title: String,
    original_file_name: Option<String>,
    content_type: String,
    file_size_bytes: i64,
    uploaded_at: DateTime<Utc>,
    original_path: String,
    derived_paths: Json<BTreeMap<String, String>>,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            id: row.id,
            title: row.title,
            original_file_name: row.original_file_name,
            content_type: row.content_type,
            file_size_bytes: row.file_size_bytes,
            uploaded_at: row.uploaded_at,
            original_path: PathBuf::from(row.original_path),
            derived_paths: row
                .derived_paths
                .0
                .into_iter()
                .map(|(tier, path)| (tier, PathBuf::from(path)))
                .collect(),
        }
    }
}

fn derived_paths_json(video: &VideoRecord) -> Json<BTreeMap<String, String>> {
    Json(
        video
            .derived_paths
            .iter()
            .map(|(tier, path)| (tier.clone(), path.to_string_lossy().into_owned()))
            .collect(),
    )
}

/// PostgreSQL-backed video records (`videos` table).
#[derive(Clone)]
pub struct PostgresVideoRepository {
    pool: PgPool,
}

impl PostgresVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoRepository for PostgresVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert"))]
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, AppError> {
        let original_path = video.original_path.to_string_lossy().into_owned();

        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            INSERT INTO videos (
                id, title, original_file_name, content_type, file_size_bytes,
                uploaded_at, original_path, derived_paths
            )
            VALUES ($1, $2, $3, $4, $5, NOW(), $6, '{}'::jsonb)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&video.title)
        .bind(&video.original_file_name)
        .bind(&video.content_type)
        .bind(video.file_size_bytes)
        .bind(&original_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let row: Option<VideoRow> =
            sqlx::query_as::<Postgres, VideoRow>("SELECT * FROM videos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(VideoRecord::from))
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = %video.id))]
    async fn update(&self, video: &VideoRecord) -> Result<(), AppError> {
        let rows_affected = sqlx::query("UPDATE videos SET derived_paths = $2 WHERE id = $1")
            .bind(video.id)
            .bind(derived_paths_json(video))
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("Video not found: {}", video.id)));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_by_uploaded_desc(&self) -> Result<Vec<VideoRecord>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT * FROM videos ORDER BY uploaded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VideoRecord::from).collect())
    }
}
