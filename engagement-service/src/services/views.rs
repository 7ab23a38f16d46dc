use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::ContentRepository;
use crate::storage::{CounterStore, DedupCache};

/// Records content views as durable counter increments.
///
/// The increment is one atomic call on the tracker's own storage handle and
/// is never enlisted in a caller transaction: once recorded, a view stays
/// counted even when the surrounding request later fails, and a concurrent
/// reader issuing a fresh read observes the new value immediately.
pub struct ViewCountTracker {
    content: Arc<dyn ContentRepository>,
    counters: Arc<dyn CounterStore>,
    dedup: Arc<dyn DedupCache>,
    view_ttl: Duration,
}

impl ViewCountTracker {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        counters: Arc<dyn CounterStore>,
        dedup: Arc<dyn DedupCache>,
        view_ttl: Duration,
    ) -> Self {
        Self {
            content,
            counters,
            dedup,
            view_ttl,
        }
    }

    /// Increment the view counter by exactly one and return the new value.
    ///
    /// Not idempotent: every invocation counts. Callers that need "one view
    /// per session" semantics go through [`ViewCountTracker::record_view_once`].
    pub async fn record_view(&self, content_id: Uuid) -> ServiceResult<i64> {
        if !self.content.exists(content_id).await? {
            return Err(ServiceError::NotFound(format!(
                "content {} does not exist",
                content_id
            )));
        }

        self.counters
            .increment(ContentKind::Curation, content_id, CounterKind::Views, 1)
            .await
    }

    /// Count at most one view per (content, viewer) pair inside the TTL
    /// window. Returns true when the view was counted.
    ///
    /// A dedup-cache outage fails open: the view is counted anyway, trading
    /// dedup accuracy for availability of the signal.
    pub async fn record_view_once(
        &self,
        content_id: Uuid,
        viewer_identity: &str,
    ) -> ServiceResult<bool> {
        if !self.content.exists(content_id).await? {
            return Err(ServiceError::NotFound(format!(
                "content {} does not exist",
                content_id
            )));
        }

        let key = format!("curation:view:{}:{}", content_id, viewer_identity);
        let first_seen = match self.dedup.set_if_absent(&key, self.view_ttl).await {
            Ok(was_absent) => was_absent,
            Err(err) => {
                warn!(error = %err, %content_id, "view dedup cache unavailable, counting view");
                true
            }
        };

        if first_seen {
            self.counters
                .increment(ContentKind::Curation, content_id, CounterKind::Views, 1)
                .await?;
        }

        Ok(first_seen)
    }
}
