#![forbid(unsafe_code)]

//! Core domain model and business logic for the DailyStride step tracker.
//!
//! This crate provides:
//! - Domain types (profile, session state, daily log entries)
//! - Derived metrics (distance, calories, goal progress)
//! - Profile store and session engine over a key-value store
//! - Walk simulation
//! - History summary
//! - Motivational insights from an external text-generation service

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod storage;
pub mod metrics;
pub mod profile;
pub mod session;
pub mod simulator;
pub mod history;
pub mod insight;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use profile::ProfileStore;
pub use session::SessionEngine;
pub use simulator::{SharedSession, WalkSimulator};
pub use history::{summarize, HistorySummary};
pub use insight::{daily_insight, GeminiClient, InsightGenerator, InsightRequest};
pub use tracker::{Tracker, TrackerState};
