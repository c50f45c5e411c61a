//! Which categories are expanded in the structure view
//!
//! Stored as a JSON object of category id to `true`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::warn;

use crate::domain::{DomainError, DomainResult};
use super::store::KeyValueStore;

pub const EXPANDED_KEY: &str = "menu-editor-expanded-categories";

pub struct ExpansionState {
    store: Arc<dyn KeyValueStore>,
    expanded: BTreeSet<u32>,
}

impl ExpansionState {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let expanded = match store.get(EXPANDED_KEY) {
            Ok(Some(raw)) => parse_expanded(&raw).unwrap_or_else(|| {
                warn!("ignoring malformed expansion state");
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(error = %e, "failed to read expansion state");
                BTreeSet::new()
            }
        };
        Self { store, expanded }
    }

    pub fn is_expanded(&self, id: u32) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expanded(&self) -> impl Iterator<Item = u32> + '_ {
        self.expanded.iter().copied()
    }

    /// Returns the new state
    pub fn toggle(&mut self, id: u32) -> DomainResult<bool> {
        let now_expanded = !self.is_expanded(id);
        self.set(id, now_expanded)?;
        Ok(now_expanded)
    }

    pub fn set(&mut self, id: u32, expanded: bool) -> DomainResult<()> {
        let changed = if expanded {
            self.expanded.insert(id)
        } else {
            self.expanded.remove(&id)
        };
        if changed {
            self.save()?;
        }
        Ok(())
    }

    pub fn expand_all(&mut self, ids: impl IntoIterator<Item = u32>) -> DomainResult<()> {
        self.expanded.extend(ids);
        self.save()
    }

    pub fn collapse_all(&mut self) -> DomainResult<()> {
        self.expanded.clear();
        self.save()
    }

    fn save(&self) -> DomainResult<()> {
        let map: BTreeMap<String, bool> = self.expanded.iter().map(|id| (id.to_string(), true)).collect();
        let text = serde_json::to_string(&map).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.store.set(EXPANDED_KEY, &text)
    }
}

fn parse_expanded(raw: &str) -> Option<BTreeSet<u32>> {
    let map: BTreeMap<String, bool> = serde_json::from_str(raw).ok()?;
    Some(
        map.into_iter()
            .filter(|(_, open)| *open)
            .filter_map(|(id, _)| id.parse().ok())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryStore;

    #[test]
    fn test_toggle_and_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut state = ExpansionState::load(store.clone());

        assert!(state.toggle(4).unwrap());
        assert!(state.toggle(9).unwrap());
        assert!(!state.toggle(4).unwrap());
        assert_eq!(store.get(EXPANDED_KEY).unwrap(), Some(r#"{"9":true}"#.to_string()));

        let reloaded = ExpansionState::load(store);
        assert!(reloaded.is_expanded(9));
        assert!(!reloaded.is_expanded(4));
    }

    #[test]
    fn test_expand_and_collapse_all() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut state = ExpansionState::load(store);
        state.expand_all([1, 2, 3]).unwrap();
        assert_eq!(state.expanded().collect::<Vec<_>>(), vec![1, 2, 3]);
        state.collapse_all().unwrap();
        assert_eq!(state.expanded().count(), 0);
    }

    #[test]
    fn test_false_and_garbage_entries_ignored() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(EXPANDED_KEY, r#"{"1":true,"2":false,"x":true}"#).unwrap();
        let state = ExpansionState::load(store.clone());
        assert_eq!(state.expanded().collect::<Vec<_>>(), vec![1]);

        store.set(EXPANDED_KEY, "[1,2]").unwrap();
        assert_eq!(ExpansionState::load(store).expanded().count(), 0);
    }
}
