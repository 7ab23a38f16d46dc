//! Embedded repository backends.
//!
//! In-process implementations of the repository seams. The like store keeps
//! the same conflict semantics as the Postgres backend: the map entry API
//! decides concurrent duplicate inserts atomically, so exactly one racer
//! observes an insert. The content and playlist stores expose seed methods
//! for embedding callers.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{ContentKind, ContentSummary, PlaylistRecord};
use crate::error::ServiceResult;

use super::content::ContentRepository;
use super::likes::LikeRepository;
use super::playlists::PlaylistRepository;

/// Embedded like store.
#[derive(Debug, Default)]
pub struct MemoryLikeRepository {
    records: DashMap<(Uuid, Uuid), DateTime<Utc>>,
}

impl MemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LikeRepository for MemoryLikeRepository {
    async fn exists(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        Ok(self.records.contains_key(&(member_id, content_id)))
    }

    async fn insert(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        match self.records.entry((member_id, content_id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(Utc::now());
                Ok(true)
            }
        }
    }

    async fn delete(&self, member_id: Uuid, content_id: Uuid) -> ServiceResult<bool> {
        Ok(self.records.remove(&(member_id, content_id)).is_some())
    }

    async fn count_for_content(&self, content_id: Uuid) -> ServiceResult<i64> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().1 == content_id)
            .count() as i64)
    }
}

/// Embedded content store.
#[derive(Debug, Default)]
pub struct MemoryContentRepository {
    curations: DashMap<Uuid, ContentSummary>,
    links: DashMap<Uuid, ()>,
}

impl MemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_content(&self, id: Uuid, created_at: DateTime<Utc>, tags: &[&str]) {
        self.curations.insert(
            id,
            ContentSummary {
                id,
                kind: ContentKind::Curation,
                created_at,
                tags: tags.iter().map(|tag| tag.to_string()).collect(),
            },
        );
    }

    pub fn put_link(&self, id: Uuid) {
        self.links.insert(id, ());
    }
}

#[async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn exists(&self, content_id: Uuid) -> ServiceResult<bool> {
        Ok(self.curations.contains_key(&content_id))
    }

    async fn link_exists(&self, link_id: Uuid) -> ServiceResult<bool> {
        Ok(self.links.contains_key(&link_id))
    }

    async fn recent_content(&self, since: DateTime<Utc>) -> ServiceResult<Vec<ContentSummary>> {
        Ok(self
            .curations
            .iter()
            .filter(|entry| entry.value().created_at >= since)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// Embedded playlist store.
#[derive(Debug, Default)]
pub struct MemoryPlaylistRepository {
    playlists: DashMap<Uuid, (PlaylistRecord, bool)>,
}

impl MemoryPlaylistRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_playlist(&self, id: Uuid, title: &str, is_public: bool) {
        self.playlists.insert(
            id,
            (
                PlaylistRecord {
                    id,
                    title: title.to_string(),
                },
                is_public,
            ),
        );
    }
}

#[async_trait]
impl PlaylistRepository for MemoryPlaylistRepository {
    async fn exists(&self, playlist_id: Uuid) -> ServiceResult<bool> {
        Ok(self.playlists.contains_key(&playlist_id))
    }

    async fn list_public(&self, exclude: Uuid) -> ServiceResult<Vec<PlaylistRecord>> {
        Ok(self
            .playlists
            .iter()
            .filter(|entry| entry.value().1 && *entry.key() != exclude)
            .map(|entry| entry.value().0.clone())
            .collect())
    }
}
