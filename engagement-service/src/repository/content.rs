use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{ContentKind, ContentSummary};
use crate::error::ServiceResult;

/// Read access to content owned by the CRUD layer.
///
/// Curations are the viewable/likeable content items; links are the click
/// targets embedded in them. The engagement core only probes existence and
/// scans the recent window, it never mutates content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn exists(&self, content_id: Uuid) -> ServiceResult<bool>;

    async fn link_exists(&self, link_id: Uuid) -> ServiceResult<bool>;

    /// Content created at or after `since`, with tags, for trending scans.
    async fn recent_content(&self, since: DateTime<Utc>) -> ServiceResult<Vec<ContentSummary>>;
}

/// Postgres-backed content repository.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn exists(&self, content_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM curations
                WHERE id = $1
            )
            "#,
        )
        .bind(content_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn link_exists(&self, link_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM links
                WHERE id = $1
            )
            "#,
        )
        .bind(link_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn recent_content(&self, since: DateTime<Utc>) -> ServiceResult<Vec<ContentSummary>> {
        let rows: Vec<(Uuid, DateTime<Utc>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT c.id, c.created_at, t.name
            FROM curations c
            LEFT JOIN curation_tags ct ON ct.curation_id = c.id
            LEFT JOIN tags t ON t.id = ct.tag_id
            WHERE c.created_at >= $1
            ORDER BY c.id
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        // one row per (curation, tag); fold into summaries
        let mut summaries: Vec<ContentSummary> = Vec::new();
        for (id, created_at, tag) in rows {
            match summaries.last_mut() {
                Some(last) if last.id == id => {
                    if let Some(tag) = tag {
                        last.tags.push(tag);
                    }
                }
                _ => {
                    summaries.push(ContentSummary {
                        id,
                        kind: ContentKind::Curation,
                        created_at,
                        tags: tag.into_iter().collect(),
                    });
                }
            }
        }

        Ok(summaries)
    }
}
