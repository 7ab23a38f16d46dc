//! Engagement tracking and ranking for the curation platform.
//!
//! Turns raw user actions (views, link clicks, likes, tag usage) into
//! durable counters and derived rankings: trending tags and content, and
//! playlist recommendations. The crate is a library boundary consumed by the
//! API layer; storage and cache backends are injected through the seams in
//! [`storage`] and [`repository`], with Redis/Postgres implementations for
//! deployment and embedded ones for tests and single-process setups.

pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;
pub mod storage;
