// Favorites persistence
// Chart ids the user starred, persisted to the local store on every change
// and read back on load.

use std::sync::Arc;

use super::store::{LocalStore, StoreError, KEY_FAVORITES};

/// Persisted set of favorite chart ids (insertion-ordered)
pub struct Favorites {
    store: Arc<LocalStore>,
}

impl Favorites {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// All favorites in the order they were added
    pub fn list(&self) -> Vec<String> {
        self.store.get(KEY_FAVORITES).unwrap_or_default()
    }

    pub fn is_favorite(&self, chart_id: &str) -> bool {
        self.list().iter().any(|id| id == chart_id)
    }

    pub fn add(&self, chart_id: &str) -> Result<(), StoreError> {
        let mut ids = self.list();
        if !ids.iter().any(|id| id == chart_id) {
            ids.push(chart_id.to_string());
            self.store.set(KEY_FAVORITES, &ids)?;
        }
        Ok(())
    }

    pub fn remove(&self, chart_id: &str) -> Result<(), StoreError> {
        let mut ids = self.list();
        let before = ids.len();
        ids.retain(|id| id != chart_id);
        if ids.len() != before {
            self.store.set(KEY_FAVORITES, &ids)?;
        }
        Ok(())
    }

    /// Flip membership; returns the new state
    pub fn toggle(&self, chart_id: &str) -> Result<bool, StoreError> {
        if self.is_favorite(chart_id) {
            self.remove(chart_id)?;
            Ok(false)
        } else {
            self.add(chart_id)?;
            Ok(true)
        }
    }
}
