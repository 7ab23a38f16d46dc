use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind, PlaylistSummary, RecommendSort};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::PlaylistRepository;
use crate::storage::CounterStore;

/// Weights for the combined recommendation score.
///
/// Applied to min-max normalized counters, so a high-view playlist cannot
/// drown out a high-like one purely on scale: views and likes differ by
/// orders of magnitude in absolute terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecommendWeights {
    pub view_weight: f64,
    pub like_weight: f64,
}

impl Default for RecommendWeights {
    fn default() -> Self {
        Self {
            view_weight: 0.7,
            like_weight: 0.3,
        }
    }
}

impl RecommendWeights {
    /// Validate weight parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.view_weight < 0.0 || self.like_weight < 0.0 {
            return Err("All weights must be non-negative".to_string());
        }

        if self.view_weight + self.like_weight <= 0.0 {
            return Err("At least one weight must be positive".to_string());
        }

        Ok(())
    }
}

/// Ranks public playlists against a reference playlist.
pub struct RecommendationScorer {
    playlists: Arc<dyn PlaylistRepository>,
    counters: Arc<dyn CounterStore>,
    weights: RecommendWeights,
}

impl RecommendationScorer {
    pub fn new(
        playlists: Arc<dyn PlaylistRepository>,
        counters: Arc<dyn CounterStore>,
        weights: RecommendWeights,
    ) -> Self {
        Self {
            playlists,
            counters,
            weights,
        }
    }

    /// Ranked public playlists, excluding the reference playlist itself.
    ///
    /// Fails with not-found when the reference playlist does not exist; an
    /// empty candidate set is an empty result, not an error. Equal scores
    /// order by playlist id ascending.
    pub async fn recommend(
        &self,
        reference: Uuid,
        sort: RecommendSort,
    ) -> ServiceResult<Vec<PlaylistSummary>> {
        if !self.playlists.exists(reference).await? {
            return Err(ServiceError::NotFound(format!(
                "playlist {} does not exist",
                reference
            )));
        }

        let candidates = self.playlists.list_public(reference).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = candidates.iter().map(|playlist| playlist.id).collect();
        let views = self
            .counters
            .read_many(ContentKind::Playlist, &ids, CounterKind::Views)
            .await?;
        let likes = self
            .counters
            .read_many(ContentKind::Playlist, &ids, CounterKind::Likes)
            .await?;

        let mut summaries: Vec<PlaylistSummary> = candidates
            .into_iter()
            .map(|playlist| PlaylistSummary {
                view_count: views.get(&playlist.id).copied().unwrap_or(0),
                like_count: likes.get(&playlist.id).copied().unwrap_or(0),
                score: 0.0,
                id: playlist.id,
                title: playlist.title,
            })
            .collect();

        match sort {
            RecommendSort::Views => {
                for summary in &mut summaries {
                    summary.score = summary.view_count as f64;
                }
            }
            RecommendSort::Likes => {
                for summary in &mut summaries {
                    summary.score = summary.like_count as f64;
                }
            }
            RecommendSort::Combined => {
                let (view_min, view_max) = min_max(summaries.iter().map(|s| s.view_count));
                let (like_min, like_max) = min_max(summaries.iter().map(|s| s.like_count));
                for summary in &mut summaries {
                    let views = normalize(summary.view_count, view_min, view_max);
                    let likes = normalize(summary.like_count, like_min, like_max);
                    summary.score =
                        self.weights.view_weight * views + self.weights.like_weight * likes;
                }
            }
        }

        summaries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(summaries)
    }
}

fn min_max(values: impl Iterator<Item = i64>) -> (i64, i64) {
    values.fold((i64::MAX, i64::MIN), |(min, max), value| {
        (min.min(value), max.max(value))
    })
}

/// Min-max normalization over the candidate set; a constant column
/// normalizes to 0 so it cannot dominate the combined score.
fn normalize(value: i64, min: i64, max: i64) -> f64 {
    if max == min {
        0.0
    } else {
        (value - min) as f64 / (max - min) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = RecommendWeights::default();
        assert_eq!(weights.view_weight, 0.7);
        assert_eq!(weights.like_weight, 0.3);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_weight_validation() {
        let mut weights = RecommendWeights::default();
        weights.view_weight = -0.1;
        assert!(weights.validate().is_err());

        weights = RecommendWeights {
            view_weight: 0.0,
            like_weight: 0.0,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5, 5, 50), 0.0);
        assert_eq!(normalize(50, 5, 50), 1.0);
        assert!((normalize(10, 5, 50) - 5.0 / 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_constant_column() {
        // all candidates equal: the column contributes nothing
        assert_eq!(normalize(7, 7, 7), 0.0);
    }
}
