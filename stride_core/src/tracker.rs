//! Application shell tying the profile store to today's session.
//!
//! The tracker is either in `NoProfile` or `HasProfile`. A session exists
//! only in `HasProfile`, so nothing can log steps before onboarding, and a
//! profile reset always takes the session (and any simulated walk) with it.

use crate::config::TrackerConfig;
use crate::history::{self, HistorySummary};
use crate::insight::{self, InsightGenerator};
use crate::profile::ProfileStore;
use crate::session::SessionEngine;
use crate::simulator::{SharedSession, WalkSimulator};
use crate::storage::KeyValueStore;
use crate::{Error, Result, SessionSnapshot, SessionState, UserProfile};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    NoProfile,
    HasProfile,
}

pub struct Tracker<S: KeyValueStore + 'static> {
    store: Arc<S>,
    profiles: ProfileStore<S>,
    session: Option<SharedSession<S>>,
    simulator: WalkSimulator,
}

impl<S: KeyValueStore + 'static> Tracker<S> {
    /// Load any saved profile and, if there is one, resume today's session
    pub fn open(store: Arc<S>, config: &TrackerConfig) -> Self {
        let mut profiles = ProfileStore::new(store.clone());
        let session = profiles.load().cloned().map(|profile| {
            let engine = SessionEngine::initialize(store.clone(), profile);
            Arc::new(Mutex::new(engine))
        });

        Self {
            store,
            profiles,
            session,
            simulator: WalkSimulator::new(config.simulation_interval()),
        }
    }

    pub fn state(&self) -> TrackerState {
        match self.session {
            Some(_) => TrackerState::HasProfile,
            None => TrackerState::NoProfile,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profiles.current()
    }

    /// Save a profile, starting a session or re-deriving the running one
    pub fn save_profile(&mut self, profile: UserProfile) -> Result<()> {
        self.profiles.save(profile.clone())?;
        if let Some(session) = &self.session {
            lock(session)?.update_profile(profile);
            return Ok(());
        }
        let engine = SessionEngine::initialize(self.store.clone(), profile);
        self.session = Some(Arc::new(Mutex::new(engine)));
        Ok(())
    }

    /// Return to `NoProfile`: stop walking, reset the session, clear the profile
    pub fn reset_profile(&mut self) -> Result<()> {
        self.simulator.stop();
        if let Some(session) = self.session.take() {
            lock(&session)?.reset();
        }
        self.profiles.reset()
    }

    /// Today's session, only reachable once a profile exists
    pub fn session(&self) -> Result<SharedSession<S>> {
        self.session.clone().ok_or(Error::NoProfile)
    }

    pub fn add_steps(&self, amount: i64) -> Result<SessionState> {
        let session = self.session()?;
        let state = lock(&session)?.add_steps(amount);
        Ok(state)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let session = self.session()?;
        let snapshot = lock(&session)?.snapshot();
        Ok(snapshot)
    }

    /// Start or pause the simulated walk. Returns whether it is now walking.
    pub fn toggle_walk(&mut self) -> Result<bool> {
        let session = self.session()?;
        self.simulator.toggle(session)
    }

    pub fn stop_walk(&mut self) -> bool {
        self.simulator.stop()
    }

    pub fn is_walking(&self) -> bool {
        self.simulator.is_active()
    }

    /// Trend summary of the sample history plus today
    pub fn history(&self, today: NaiveDate) -> Result<HistorySummary> {
        let session = self.session()?;
        let entry = lock(&session)?.today_entry(today);
        Ok(history::summarize(&history::SAMPLE_HISTORY, entry))
    }

    /// Fetch a motivational message for the current numbers
    pub async fn request_insight<G>(&self, generator: &G) -> Result<String>
    where
        G: InsightGenerator + ?Sized,
    {
        let session = self.session()?;
        Ok(refresh_insight(session, generator).await)
    }
}

/// Generate an insight for `session` and record it.
///
/// The session lock is not held while waiting on the generator. If the
/// session was reset in the meantime the message is still returned but not
/// recorded.
pub async fn refresh_insight<S, G>(session: SharedSession<S>, generator: &G) -> String
where
    S: KeyValueStore,
    G: InsightGenerator + ?Sized,
{
    let request = match session.lock() {
        Ok(engine) => engine.insight_request(),
        Err(_) => {
            tracing::warn!("Session lock poisoned, skipping insight request");
            return insight::ERROR_FALLBACK.to_string();
        }
    };

    let message = insight::daily_insight(generator, &request).await;

    if let Ok(mut engine) = session.lock() {
        engine.accept_insight(message.clone());
    }
    message
}

fn lock<S: KeyValueStore>(
    session: &SharedSession<S>,
) -> Result<MutexGuard<'_, SessionEngine<S>>> {
    session
        .lock()
        .map_err(|_| Error::Other("session lock poisoned".into()))
}
