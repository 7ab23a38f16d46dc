use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind, TrendingItem, TrendingTag};
use crate::error::ServiceResult;
use crate::repository::ContentRepository;
use crate::storage::CounterStore;

/// Trending aggregation policy: trailing window, decay rate and signal
/// weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingPolicy {
    /// Trailing window over which engagement is aggregated, in hours.
    pub window_hours: i64,

    /// Decay rate (lambda): higher = faster decay.
    /// Range: (0, 1]
    pub decay_rate: f64,

    /// Weight multipliers for the composite content score
    pub view_weight: f64,
    pub like_weight: f64,
}

impl Default for TrendingPolicy {
    fn default() -> Self {
        Self {
            window_hours: 72,
            decay_rate: 0.1,
            view_weight: 1.0,
            like_weight: 5.0,
        }
    }
}

impl TrendingPolicy {
    /// Recency factor for a given age in hours.
    ///
    /// Formula: e^(-λ × age_hours)
    pub fn decay_factor(&self, age_hours: f64) -> f64 {
        (-self.decay_rate * age_hours).exp()
    }

    /// Composite popularity for one item.
    ///
    /// Formula: (views × view_weight + likes × like_weight) × e^(-λ × age_hours)
    pub fn score(&self, views: i64, likes: i64, age_hours: f64) -> f64 {
        (views as f64 * self.view_weight + likes as f64 * self.like_weight)
            * self.decay_factor(age_hours)
    }

    /// Validate policy parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.window_hours <= 0 {
            return Err(format!(
                "Trending window must be positive, got {}",
                self.window_hours
            ));
        }

        if self.decay_rate <= 0.0 || self.decay_rate > 1.0 {
            return Err(format!(
                "Decay rate must be in (0, 1], got {}",
                self.decay_rate
            ));
        }

        if self.view_weight < 0.0 || self.like_weight < 0.0 {
            return Err("All weights must be non-negative".to_string());
        }

        Ok(())
    }
}

/// Read-side aggregator producing ranked tags and content.
///
/// Both operations are pure reads over the recent-content window and the
/// counter store: no counter is mutated, no result is cached, every call is
/// a fresh snapshot.
pub struct TrendingEngine {
    content: Arc<dyn ContentRepository>,
    counters: Arc<dyn CounterStore>,
    policy: TrendingPolicy,
}

impl TrendingEngine {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        counters: Arc<dyn CounterStore>,
        policy: TrendingPolicy,
    ) -> Self {
        Self {
            content,
            counters,
            policy,
        }
    }

    /// Top `limit` tags by occurrence count across the trailing window.
    /// Equal counts order by tag name ascending, so repeated runs agree.
    pub async fn trending_tags(&self, limit: usize) -> ServiceResult<Vec<TrendingTag>> {
        let since = Utc::now() - ChronoDuration::hours(self.policy.window_hours);
        let recent = self.content.recent_content(since).await?;

        let mut frequency: HashMap<String, i64> = HashMap::new();
        for item in &recent {
            for tag in &item.tags {
                *frequency.entry(tag.clone()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<TrendingTag> = frequency
            .into_iter()
            .map(|(name, score)| TrendingTag { name, score })
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(limit);

        Ok(ranked)
    }

    /// Top `limit` content items by composite view/like score with recency
    /// decay. Equal scores order by content id ascending.
    pub async fn trending_content(&self, limit: usize) -> ServiceResult<Vec<TrendingItem>> {
        let now = Utc::now();
        let since = now - ChronoDuration::hours(self.policy.window_hours);
        let recent = self.content.recent_content(since).await?;
        if recent.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = recent.iter().map(|item| item.id).collect();
        let views = self
            .counters
            .read_many(ContentKind::Curation, &ids, CounterKind::Views)
            .await?;
        let likes = self
            .counters
            .read_many(ContentKind::Curation, &ids, CounterKind::Likes)
            .await?;

        let mut ranked: Vec<TrendingItem> = recent
            .iter()
            .map(|item| {
                let age_hours = (now - item.created_at).num_seconds().max(0) as f64 / 3600.0;
                let score = self.policy.score(
                    views.get(&item.id).copied().unwrap_or(0),
                    likes.get(&item.id).copied().unwrap_or(0),
                    age_hours,
                );
                TrendingItem {
                    content_id: item.id,
                    score,
                }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        ranked.truncate(limit);

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = TrendingPolicy::default();
        assert_eq!(policy.window_hours, 72);
        assert_eq!(policy.decay_rate, 0.1);
        assert_eq!(policy.view_weight, 1.0);
        assert_eq!(policy.like_weight, 5.0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_decay_factor() {
        let policy = TrendingPolicy::default();

        // At time 0, decay factor should be 1.0
        assert!((policy.decay_factor(0.0) - 1.0).abs() < 0.001);

        // At 1 hour, decay factor should be ~0.905
        assert!((policy.decay_factor(1.0) - 0.905).abs() < 0.01);

        // At 24 hours, decay factor should be ~0.091
        assert!((policy.decay_factor(24.0) - 0.091).abs() < 0.01);
    }

    #[test]
    fn test_score_weights_likes_over_views() {
        let policy = TrendingPolicy::default();

        // 5 likes outweigh 20 views at the default weights
        assert!(policy.score(0, 5, 0.0) > policy.score(20, 0, 0.0));
        // and equal 25 views exactly
        assert!((policy.score(0, 5, 0.0) - policy.score(25, 0, 0.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recency_beats_stale_engagement() {
        let policy = TrendingPolicy::default();

        let old = policy.score(1000, 0, 48.0);
        let fresh = policy.score(100, 0, 1.0);
        assert!(fresh > old);
    }

    #[test]
    fn test_validation() {
        let mut policy = TrendingPolicy::default();
        assert!(policy.validate().is_ok());

        policy.decay_rate = 0.0;
        assert!(policy.validate().is_err());

        policy.decay_rate = 1.5;
        assert!(policy.validate().is_err());

        policy = TrendingPolicy::default();
        policy.window_hours = 0;
        assert!(policy.validate().is_err());

        policy = TrendingPolicy::default();
        policy.like_weight = -1.0;
        assert!(policy.validate().is_err());
    }
}
