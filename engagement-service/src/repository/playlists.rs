use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::PlaylistRecord;
use crate::error::ServiceResult;

/// Read access to playlists owned by the CRUD layer.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn exists(&self, playlist_id: Uuid) -> ServiceResult<bool>;

    /// Public playlists excluding `exclude` (the reference playlist).
    async fn list_public(&self, exclude: Uuid) -> ServiceResult<Vec<PlaylistRecord>>;
}

/// Postgres-backed playlist repository.
#[derive(Clone)]
pub struct PgPlaylistRepository {
    pool: PgPool,
}

impl PgPlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaylistRepository for PgPlaylistRepository {
    async fn exists(&self, playlist_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM playlists
                WHERE id = $1
            )
            "#,
        )
        .bind(playlist_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_public(&self, exclude: Uuid) -> ServiceResult<Vec<PlaylistRecord>> {
        let records = sqlx::query_as::<_, PlaylistRecord>(
            r#"
            SELECT id, title
            FROM playlists
            WHERE is_public = TRUE AND id <> $1
            "#,
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
