use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceResult;

/// Storage for like membership records.
///
/// At most one record exists per (member, content) pair; the uniqueness
/// constraint is the conflict-resolution mechanism for concurrent likes.
/// Deletion is physical.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn exists(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool>;

    /// Insert a like record; returns false when the pair already exists.
    /// A concurrent duplicate insert is reported as false, never an error.
    async fn insert(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool>;

    /// Delete a like record; returns false when no record existed.
    async fn delete(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool>;

    /// Current membership cardinality for one content item.
    async fn count_for_content(&self, content_id: Uuid) -> ServiceResult<i64>;
}

/// Postgres-backed like repository.
#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn exists(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE member_id = $1 AND content_id = $2
            )
            "#,
        )
        .bind(member_id)
        .bind(content_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO likes (id, member_id, content_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (member_id, content_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(member_id)
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM likes
            WHERE member_id = $1 AND content_id = $2
            "#,
        )
        .bind(member_id)
        .bind(content_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn count_for_content(&self, content_id: Uuid) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM likes
            WHERE content_id = $1
            "#,
        )
        .bind(content_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
