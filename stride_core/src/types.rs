//! Core domain types for the DailyStride tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - The user's biometric profile
//! - Today's live session state
//! - Historical daily log entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Profile Types
// ============================================================================

/// Gender label collected at onboarding. Not a formula input.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Gender {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(crate::Error::InvalidProfile(format!(
                "unknown gender '{}', expected male, female or other",
                other
            ))),
        }
    }
}

/// The user's biometric and goal configuration.
///
/// Stored as camelCase JSON under the profile key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    /// Years
    pub age: u32,
    /// Kilograms
    pub weight: f64,
    /// Centimeters
    pub height: f64,
    pub gender: Gender,
    pub daily_step_goal: u64,
}

impl UserProfile {
    /// Check that every field holds a usable value.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::InvalidProfile("name must not be empty".into()));
        }
        if self.age == 0 {
            return Err(crate::Error::InvalidProfile("age must be positive".into()));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(crate::Error::InvalidProfile(format!(
                "weight must be a positive number, got {}",
                self.weight
            )));
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(crate::Error::InvalidProfile(format!(
                "height must be a positive number, got {}",
                self.height
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Today's live tracking state.
///
/// `calories` and `distance_km` are only ever written by the session engine's
/// recompute step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionState {
    pub step_count: u64,
    pub calories: u64,
    pub distance_km: f64,
}

/// Read-only view of the dashboard numbers at one point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub goal: u64,
    pub progress_percentage: u8,
}

// ============================================================================
// History Types
// ============================================================================

/// One day of recorded activity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyLogEntry {
    pub date: NaiveDate,
    pub steps: u64,
    pub calories: u64,
    pub distance_km: f64,
}

impl DailyLogEntry {
    /// Whether this day reached the given step goal
    pub fn met_goal(&self, goal: u64) -> bool {
        self.steps >= goal
    }
}
