use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content kinds tracked by the engagement subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Curation,
    Link,
    Playlist,
}

impl ContentKind {
    /// Stable string form used in counter keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Curation => "curation",
            ContentKind::Link => "link",
            ContentKind::Playlist => "playlist",
        }
    }
}

/// Engagement counter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    Views,
    Likes,
    Clicks,
}

impl CounterKind {
    /// Stable string form used in counter keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Views => "views",
            CounterKind::Likes => "likes",
            CounterKind::Clicks => "clicks",
        }
    }
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeState {
    Liked,
    Unliked,
}

/// Sort modes for playlist recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendSort {
    Views,
    Likes,
    Combined,
}

impl RecommendSort {
    /// Parses the request-level sort parameter. Unknown values fall back to
    /// the combined sort rather than erroring.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "views" => RecommendSort::Views,
            "likes" => RecommendSort::Likes,
            _ => RecommendSort::Combined,
        }
    }
}

/// A content item inside the trending window, with its tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: Uuid,
    pub kind: ContentKind,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// A public playlist candidate for recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaylistRecord {
    pub id: Uuid,
    pub title: String,
}

/// Playlist returned from recommendation, with counters and computed score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: Uuid,
    pub title: String,
    pub view_count: i64,
    pub like_count: i64,
    pub score: f64,
}

/// Tag with its aggregated occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingTag {
    pub name: String,
    pub score: i64,
}

/// Content item with its composite popularity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingItem {
    pub content_id: Uuid,
    pub score: f64,
}
