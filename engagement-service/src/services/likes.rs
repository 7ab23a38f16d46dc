use std::sync::Arc;

use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind, LikeState};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{ContentRepository, LikeRepository};
use crate::storage::CounterStore;

/// Flips like membership and keeps the like counter equal to membership
/// cardinality.
///
/// The counter only moves when a record actually moved: a concurrent
/// duplicate insert resolves through the uniqueness constraint as a no-op
/// success, and a concurrent duplicate delete decrements nothing. Two
/// sequential toggles restore both membership and counter.
pub struct LikeToggleService {
    content: Arc<dyn ContentRepository>,
    likes: Arc<dyn LikeRepository>,
    counters: Arc<dyn CounterStore>,
}

impl LikeToggleService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        likes: Arc<dyn LikeRepository>,
        counters: Arc<dyn CounterStore>,
    ) -> Self {
        Self {
            content,
            likes,
            counters,
        }
    }

    pub async fn toggle_like(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<LikeState> {
        if !self.content.exists(content_id).await? {
            return Err(ServiceError::NotFound(format!(
                "content {} does not exist",
                content_id
            )));
        }

        if self.likes.exists(member_id, content_id).await? {
            // unlike: decrement only when this call removed the record
            if self.likes.delete(member_id, content_id).await? {
                self.counters
                    .increment(ContentKind::Curation, content_id, CounterKind::Likes, -1)
                    .await?;
            }
            Ok(LikeState::Unliked)
        } else {
            // like: the loser of a concurrent insert sees no row and must
            // not increment; the final state is liked either way
            if self.likes.insert(member_id, content_id).await? {
                self.counters
                    .increment(ContentKind::Curation, content_id, CounterKind::Likes, 1)
                    .await?;
            }
            Ok(LikeState::Liked)
        }
    }

    /// Whether the member currently likes the content item.
    pub async fn is_liked(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        if !self.content.exists(content_id).await? {
            return Err(ServiceError::NotFound(format!(
                "content {} does not exist",
                content_id
            )));
        }

        self.likes.exists(member_id, content_id).await
    }
}
