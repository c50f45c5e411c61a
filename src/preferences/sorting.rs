//! Sorting preference
//!
//! Persisted as `manual` or `alphabetical`. Absent or unrecognized values
//! fall back to manual.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{DomainResult, SortField, SortingMode};
use super::store::KeyValueStore;

pub const SORT_MODE_KEY: &str = "menu-editor-sort-mode";

pub struct SortingPreference {
    store: Arc<dyn KeyValueStore>,
    mode: SortingMode,
}

impl SortingPreference {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mode = match store.get(SORT_MODE_KEY) {
            Ok(Some(raw)) => SortingMode::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown sorting mode, using manual");
                SortingMode::default()
            }),
            Ok(None) => SortingMode::default(),
            Err(e) => {
                warn!(error = %e, "failed to read sorting mode, using manual");
                SortingMode::default()
            }
        };
        Self { store, mode }
    }

    pub fn mode(&self) -> SortingMode {
        self.mode
    }

    /// Takes effect immediately; an `Err` only means it was not saved
    pub fn set(&mut self, mode: SortingMode) -> DomainResult<()> {
        self.mode = mode;
        debug!(mode = mode.as_str(), "sorting mode set");
        self.store.set(SORT_MODE_KEY, mode.as_str())
    }

    pub fn toggle(&mut self) -> DomainResult<SortingMode> {
        let next = self.mode.toggled();
        self.set(next)?;
        Ok(next)
    }

    /// Forget the stored choice and go back to manual
    pub fn reset(&mut self) -> DomainResult<()> {
        self.mode = SortingMode::default();
        self.store.remove(SORT_MODE_KEY)
    }

    pub fn is_drag_enabled(&self) -> bool {
        self.mode.is_drag_enabled()
    }

    pub fn order_by(&self) -> SortField {
        self.mode.order_by()
    }
}
