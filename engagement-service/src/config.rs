/// Configuration management for the engagement subsystem.
///
/// Loads configuration from environment variables.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::services::recommendation::RecommendWeights;
use crate::services::trending::TrendingPolicy;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Engagement tunables
    pub engagement: EngagementConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
}

/// Engagement subsystem tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Click dedup window in seconds
    #[serde(default = "default_dedup_ttl_secs")]
    pub click_dedup_ttl_secs: u64,
    /// View dedup window in seconds (per-viewer view suppression)
    #[serde(default = "default_dedup_ttl_secs")]
    pub view_dedup_ttl_secs: u64,
    /// Trending aggregation policy
    #[serde(default)]
    pub trending: TrendingPolicy,
    /// Combined recommendation score weights
    #[serde(default)]
    pub recommend: RecommendWeights,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_dedup_ttl_secs() -> u64 {
    600 // 10 minutes
}

impl EngagementConfig {
    pub fn click_dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.click_dedup_ttl_secs)
    }

    pub fn view_dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.view_dedup_ttl_secs)
    }
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            click_dedup_ttl_secs: default_dedup_ttl_secs(),
            view_dedup_ttl_secs: default_dedup_ttl_secs(),
            trending: TrendingPolicy::default(),
            recommend: RecommendWeights::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_connections),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_connections),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").context("REDIS_URL environment variable not set")?,
        };

        let mut trending = TrendingPolicy::default();
        if let Some(hours) = env_parse("TRENDING_WINDOW_HOURS") {
            trending.window_hours = hours;
        }
        if let Some(rate) = env_parse("TRENDING_DECAY_RATE") {
            trending.decay_rate = rate;
        }
        if let Some(weight) = env_parse("TRENDING_VIEW_WEIGHT") {
            trending.view_weight = weight;
        }
        if let Some(weight) = env_parse("TRENDING_LIKE_WEIGHT") {
            trending.like_weight = weight;
        }
        trending
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid trending policy: {}", e))?;

        let mut recommend = RecommendWeights::default();
        if let Some(weight) = env_parse("RECOMMEND_VIEW_WEIGHT") {
            recommend.view_weight = weight;
        }
        if let Some(weight) = env_parse("RECOMMEND_LIKE_WEIGHT") {
            recommend.like_weight = weight;
        }
        recommend
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid recommend weights: {}", e))?;

        let engagement = EngagementConfig {
            click_dedup_ttl_secs: env_parse("CLICK_DEDUP_TTL_SECS")
                .unwrap_or_else(default_dedup_ttl_secs),
            view_dedup_ttl_secs: env_parse("VIEW_DEDUP_TTL_SECS")
                .unwrap_or_else(default_dedup_ttl_secs),
            trending,
            recommend,
        };

        Ok(Config {
            database,
            redis,
            engagement,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
