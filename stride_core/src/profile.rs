//! Profile store: the single current [`UserProfile`] and its persistence.
//!
//! Two states only, no profile or a complete one. Saves replace the whole
//! profile; nothing updates individual fields.

use crate::storage::{KeyValueStore, PROFILE_KEY};
use crate::{Result, UserProfile};
use std::sync::Arc;

pub struct ProfileStore<S: KeyValueStore> {
    store: Arc<S>,
    current: Option<UserProfile>,
}

impl<S: KeyValueStore> ProfileStore<S> {
    /// Create an empty store. Call [`load`](Self::load) to pick up a saved profile.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Read the saved profile from storage.
    ///
    /// Missing, unreadable, unparsable or invalid records all count as no
    /// profile; problems are logged, never returned.
    pub fn load(&mut self) -> Option<&UserProfile> {
        self.current = self.read_stored();
        self.current.as_ref()
    }

    fn read_stored(&self) -> Option<UserProfile> {
        let raw = match self.store.get(PROFILE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("No saved profile found");
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read saved profile: {}. Starting without one.", e);
                return None;
            }
        };

        let profile = match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to parse saved profile: {}. Starting without one.", e);
                return None;
            }
        };

        if let Err(e) = profile.validate() {
            tracing::warn!("Saved profile is not usable: {}. Starting without one.", e);
            return None;
        }

        tracing::debug!("Loaded profile for {}", profile.name);
        Some(profile)
    }

    /// Validate and persist a profile, then make it current.
    ///
    /// Storage is written first; on any error the in-memory profile is left
    /// as it was.
    pub fn save(&mut self, profile: UserProfile) -> Result<()> {
        profile.validate()?;
        let raw = serde_json::to_string(&profile)?;
        self.store.set(PROFILE_KEY, &raw)?;
        tracing::info!("Saved profile for {}", profile.name);
        self.current = Some(profile);
        Ok(())
    }

    /// Forget the profile in memory and in storage
    pub fn reset(&mut self) -> Result<()> {
        self.current = None;
        self.store.remove(PROFILE_KEY)?;
        tracing::info!("Profile reset");
        Ok(())
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.current.as_ref()
    }
}
