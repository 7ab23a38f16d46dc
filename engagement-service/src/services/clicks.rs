use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::ContentRepository;
use crate::storage::{CounterStore, DedupCache};

/// Counts link clicks at most once per (link, client) pair per dedup window.
///
/// The window is enforced with an atomic set-if-absent on the dedup cache:
/// when two requests race on the first click, the cache decides a single
/// winner and the loser is suppressed without any application-level lock.
pub struct ClickDeduplicator {
    content: Arc<dyn ContentRepository>,
    cache: Arc<dyn DedupCache>,
    counters: Arc<dyn CounterStore>,
    click_ttl: Duration,
}

impl ClickDeduplicator {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        cache: Arc<dyn DedupCache>,
        counters: Arc<dyn CounterStore>,
        click_ttl: Duration,
    ) -> Self {
        Self {
            content,
            cache,
            counters,
            click_ttl,
        }
    }

    fn dedup_key(link_id: Uuid, client_identity: &str) -> String {
        format!("link:click:{}:{}", link_id, client_identity)
    }

    /// Returns true when this click was counted.
    ///
    /// The existence check runs before any cache mutation, so a missing link
    /// never burns a dedup slot. A dedup-cache outage fails open: the click
    /// is treated as first-seen and counted, accepting in-window duplicates
    /// rather than dropping the analytics signal.
    pub async fn register_click(
        &self,
        link_id: Uuid,
        client_identity: &str,
    ) -> ServiceResult<bool> {
        if !self.content.link_exists(link_id).await? {
            return Err(ServiceError::NotFound(format!(
                "link {} does not exist",
                link_id
            )));
        }

        let key = Self::dedup_key(link_id, client_identity);
        let first_click = match self.cache.set_if_absent(&key, self.click_ttl).await {
            Ok(was_absent) => was_absent,
            Err(err) => {
                warn!(error = %err, %link_id, "click dedup cache unavailable, counting click");
                true
            }
        };

        if !first_click {
            debug!(%link_id, "duplicate click suppressed within dedup window");
            return Ok(false);
        }

        self.counters
            .increment(ContentKind::Link, link_id, CounterKind::Clicks, 1)
            .await?;

        Ok(true)
    }
}
