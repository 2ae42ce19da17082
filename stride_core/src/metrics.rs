//! Derived metrics: stride, distance, calories and goal progress.
//!
//! Everything here is a pure function of step count and profile. The session
//! engine calls [`derive`] after every change so the stored values never drift
//! from what these formulas produce.

use crate::{SessionState, UserProfile};

/// Fraction of body height covered by one step
const STRIDE_HEIGHT_RATIO: f64 = 0.415;

/// kcal per kg per km of walking
const WALKING_KCAL_FACTOR: f64 = 1.036;

/// Estimated stride length in meters for a height in centimeters
pub fn stride_length_meters(height_cm: f64) -> f64 {
    height_cm * STRIDE_HEIGHT_RATIO / 100.0
}

/// Distance walked in kilometers, rounded to 2 decimal places
pub fn distance_km(steps: u64, height_cm: f64) -> f64 {
    let km = steps as f64 * stride_length_meters(height_cm) / 1000.0;
    round_to_hundredths(km)
}

/// Active calories burned by walking.
///
/// Uses distance and body weight only. Age and gender are stored on the
/// profile but are not inputs here.
pub fn calories_burned(steps: u64, weight_kg: f64, height_cm: f64) -> u64 {
    let kcal =
        steps as f64 * stride_length_meters(height_cm) * weight_kg * WALKING_KCAL_FACTOR / 1000.0;
    // Float-to-int `as` saturates: NaN and negatives become 0
    kcal.floor() as u64
}

/// Progress toward a goal as a whole percentage in `[0, 100]`
pub fn progress_percentage(current: u64, goal: u64) -> u8 {
    if goal == 0 {
        return 0;
    }
    let pct = (current as f64 / goal as f64 * 100.0).round();
    pct.min(100.0) as u8
}

/// Recompute the full session state for a step count and profile
pub fn derive(steps: u64, profile: &UserProfile) -> SessionState {
    SessionState {
        step_count: steps,
        calories: calories_burned(steps, profile.weight, profile.height),
        distance_km: distance_km(steps, profile.height),
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
