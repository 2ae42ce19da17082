//! Session engine: today's step count and the metrics derived from it.
//!
//! Every mutation runs recompute then persist before returning, so a caller
//! never observes a step count whose calories or distance are stale.

use crate::insight::InsightRequest;
use crate::metrics;
use crate::storage::{KeyValueStore, TODAY_STEPS_KEY};
use crate::{DailyLogEntry, SessionSnapshot, SessionState, UserProfile};
use chrono::NaiveDate;
use std::sync::Arc;

pub struct SessionEngine<S: KeyValueStore> {
    store: Arc<S>,
    profile: UserProfile,
    state: SessionState,
    insight: Option<String>,
    retired: bool,
}

impl<S: KeyValueStore> SessionEngine<S> {
    /// Start today's session for a profile, resuming any persisted step count.
    ///
    /// An absent or unparsable stored count starts the day at zero.
    pub fn initialize(store: Arc<S>, profile: UserProfile) -> Self {
        let steps = read_persisted_steps(store.as_ref());
        let state = metrics::derive(steps, &profile);
        tracing::debug!(
            "Session initialized at {} steps ({} kcal, {} km)",
            state.step_count,
            state.calories,
            state.distance_km
        );
        Self {
            store,
            profile,
            state,
            insight: None,
            retired: false,
        }
    }

    /// Add (or with a negative amount, remove) steps.
    ///
    /// The count never goes below zero. Derived metrics are recomputed and the
    /// new count persisted before this returns.
    pub fn add_steps(&mut self, amount: i64) -> SessionState {
        if self.retired {
            tracing::debug!("Ignoring {} steps for a session that was reset", amount);
            return self.state;
        }

        let steps = self.state.step_count.saturating_add_signed(amount);
        self.recompute(steps);
        self.persist();
        self.state
    }

    /// Point the session at a newly saved profile and recompute
    pub fn update_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
        self.recompute(self.state.step_count);
    }

    /// Zero the session, clear the persisted count and retire the engine.
    ///
    /// A retired engine ignores further steps and insight results.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.insight = None;
        self.retired = true;
        if let Err(e) = self.store.remove(TODAY_STEPS_KEY) {
            tracing::warn!("Failed to clear persisted step count: {}", e);
        }
        tracing::info!("Session reset");
    }

    fn recompute(&mut self, steps: u64) {
        self.state = metrics::derive(steps, &self.profile);
    }

    fn persist(&self) {
        let value = self.state.step_count.to_string();
        if let Err(e) = self.store.set(TODAY_STEPS_KEY, &value) {
            tracing::warn!("Failed to persist step count {}: {}", value, e);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn progress_percentage(&self) -> u8 {
        metrics::progress_percentage(self.state.step_count, self.profile.daily_step_goal)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            goal: self.profile.daily_step_goal,
            progress_percentage: self.progress_percentage(),
        }
    }

    /// Today's numbers in history-entry shape
    pub fn today_entry(&self, date: NaiveDate) -> DailyLogEntry {
        DailyLogEntry {
            date,
            steps: self.state.step_count,
            calories: self.state.calories,
            distance_km: self.state.distance_km,
        }
    }

    /// Inputs for a motivational insight about the current numbers
    pub fn insight_request(&self) -> InsightRequest {
        InsightRequest {
            steps: self.state.step_count,
            calories: self.state.calories,
            profile: self.profile.clone(),
        }
    }

    /// Record an insight that finished generating.
    ///
    /// Returns false and drops the message if the session was reset while the
    /// request was outstanding.
    pub fn accept_insight(&mut self, message: String) -> bool {
        if self.retired {
            tracing::debug!("Discarding insight for a session that was reset");
            return false;
        }
        self.insight = Some(message);
        true
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }
}

fn read_persisted_steps<S: KeyValueStore>(store: &S) -> u64 {
    match store.get(TODAY_STEPS_KEY) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(steps) => steps,
            Err(e) => {
                tracing::warn!("Ignoring unreadable step count {:?}: {}", raw, e);
                0
            }
        },
        Ok(None) => 0,
        Err(e) => {
            tracing::warn!("Failed to read step count: {}. Starting at zero.", e);
            0
        }
    }
}
