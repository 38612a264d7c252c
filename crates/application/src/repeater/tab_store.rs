//! Ordered repeater tabs with an active pointer, persisted after every change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snare_domain::{Tab, TabImport, TabSeed};
use tracing::{debug, warn};

use crate::ports::KeyValueStore;

/// Durable key holding the tab state.
pub const TABS_STATE_KEY: &str = "repeaterState";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTabs {
    tabs: Vec<Tab>,
    #[serde(default)]
    active_tab_id: Option<String>,
}

/// The repeater's tab collection.
///
/// Exactly one tab is active whenever any exist. Every mutation repairs the
/// active pointer and then writes the state through the [`KeyValueStore`].
pub struct TabStore {
    tabs: Vec<Tab>,
    active_tab_id: Option<String>,
    storage: Arc<dyn KeyValueStore>,
}

impl TabStore {
    /// Loads the persisted tabs.
    ///
    /// Anything that is not a JSON object with a `tabs` array of tabs is
    /// discarded and its key removed. If no tabs remain, one default tab is
    /// created and activated.
    pub fn restore(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut store = Self {
            tabs: Vec::new(),
            active_tab_id: None,
            storage,
        };

        match store.read_persisted() {
            Some(state) => {
                debug!(tabs = state.tabs.len(), "restored repeater tabs");
                store.tabs = state.tabs;
                store.active_tab_id = state.active_tab_id;
                store.repair_active();
            }
            None => {
                if let Err(e) = store.storage.remove(TABS_STATE_KEY) {
                    warn!(error = %e, "could not remove repeater state");
                }
            }
        }

        if store.tabs.is_empty() {
            let id = store.create_tab(None);
            store.set_active_tab(&id);
        }
        store
    }

    fn read_persisted(&self) -> Option<PersistedTabs> {
        let raw = match self.storage.load(TABS_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "could not read repeater state");
                return None;
            }
        };

        let value: Value = serde_json::from_str(&raw).ok()?;
        if !value.get("tabs").is_some_and(Value::is_array) {
            debug!("discarding repeater state without a tabs array");
            return None;
        }
        serde_json::from_value(value)
            .inspect_err(|e| debug!(error = %e, "discarding malformed repeater state"))
            .ok()
    }

    /// Tabs in display order.
    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Number of open tabs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Returns true when no tab is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Id of the active tab.
    #[must_use]
    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    /// The active tab.
    #[must_use]
    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.as_deref().and_then(|id| self.tab(id))
    }

    /// Looks a tab up by id.
    #[must_use]
    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    /// Appends a new tab built from the seed and returns its id.
    ///
    /// The new tab is not activated unless it is the only one.
    pub fn create_tab(&mut self, seed: Option<TabSeed>) -> String {
        let tab = Tab::new(&seed.unwrap_or_default());
        let id = tab.id.clone();
        self.tabs.push(tab);
        self.commit();
        id
    }

    /// Renames a tab; blank names are ignored.
    pub fn rename_tab(&mut self, id: &str, new_name: &str) {
        let name = new_name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.name = name.to_string();
            self.commit();
        }
    }

    /// Sets a tab's domain and names it `{short id}-{domain}`.
    pub fn update_tab_name(&mut self, id: &str, domain: &str) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.apply_domain(domain);
            self.commit();
        }
    }

    /// Closes a tab. If it was active, the next tab becomes active, else the
    /// previous one.
    pub fn close_tab(&mut self, id: &str) {
        let Some(index) = self.tabs.iter().position(|t| t.id == id) else {
            return;
        };
        self.tabs.remove(index);

        if self.active_tab_id.as_deref() == Some(id) {
            self.active_tab_id = self
                .tabs
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| self.tabs.get(i)))
                .map(|t| t.id.clone());
        }
        self.commit();
    }

    /// Closes every tab.
    pub fn close_all_tabs(&mut self) {
        self.tabs.clear();
        self.active_tab_id = None;
        self.commit();
    }

    /// Orders tabs by name. Tabs with equal names keep their relative order.
    pub fn sort_tabs_by_name(&mut self) {
        self.tabs.sort_by(|a, b| a.name.cmp(&b.name));
        self.commit();
    }

    /// Activates a tab. Returns false for unknown ids.
    pub fn set_active_tab(&mut self, id: &str) -> bool {
        if self.tab(id).is_none() {
            return false;
        }
        self.active_tab_id = Some(id.to_string());
        self.commit();
        true
    }

    /// Applies a change to the active tab. Returns false if there is none.
    pub fn update_active_tab(&mut self, mutate: impl FnOnce(&mut Tab)) -> bool {
        match self.active_tab_id.clone() {
            Some(id) => self.update_tab(&id, mutate),
            None => false,
        }
    }

    /// Applies a change to a specific tab. Returns false for unknown ids.
    pub fn update_tab(&mut self, id: &str, mutate: impl FnOnce(&mut Tab)) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        mutate(tab);
        self.commit();
        true
    }

    /// Appends imported tabs, each under a fresh id. Returns the new ids.
    pub fn append_tabs(&mut self, imports: Vec<TabImport>) -> Vec<String> {
        let tabs: Vec<Tab> = imports.into_iter().map(TabImport::into_tab).collect();
        let ids = tabs.iter().map(|t| t.id.clone()).collect();
        self.tabs.extend(tabs);
        self.commit();
        ids
    }

    fn repair_active(&mut self) {
        let valid = self
            .active_tab_id
            .as_deref()
            .is_some_and(|id| self.tabs.iter().any(|t| t.id == id));
        if !valid {
            self.active_tab_id = self.tabs.first().map(|t| t.id.clone());
        }
    }

    fn commit(&mut self) {
        self.repair_active();
        self.persist();
    }

    /// Writes `{tabs, activeTabId}` to storage. Failures are logged only.
    pub fn persist(&self) {
        let snapshot = PersistedTabs {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id.clone(),
        };
        let result = serde_json::to_string(&snapshot)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.storage
                    .save(TABS_STATE_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = result {
            warn!(%error, "failed to persist repeater tabs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use snare_domain::RepeaterRequest;

    fn fresh() -> (Arc<MemoryStore>, TabStore) {
        let storage = Arc::new(MemoryStore::default());
        let store = TabStore::restore(Arc::clone(&storage) as Arc<dyn KeyValueStore>);
        (storage, store)
    }

    fn assert_active_invariant(store: &TabStore) {
        if store.is_empty() {
            assert_eq!(store.active_tab_id(), None);
        } else {
            let active = store.active_tab_id().expect("active tab");
            assert!(store.tabs().iter().any(|t| t.id == active));
        }
    }

    fn persisted(storage: &MemoryStore) -> Value {
        serde_json::from_str(&storage.get(TABS_STATE_KEY).expect("persisted")).expect("json")
    }

    #[test]
    fn test_restore_empty_creates_default_tab() {
        let (storage, store) = fresh();
        assert_eq!(store.len(), 1);
        let tab = &store.tabs()[0];
        assert_eq!(store.active_tab_id(), Some(tab.id.as_str()));
        assert!(tab.name.ends_with("-new"));
        assert_eq!(tab.request, RepeaterRequest::default());

        let state = persisted(&storage);
        assert_eq!(state["activeTabId"], json!(tab.id));
        assert_eq!(state["tabs"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_restore_keeps_saved_tabs_and_active() {
        let saved = json!({
            "tabs": [
                {"id": "aaaaaaaa-1", "name": "login", "domain": "a.com",
                 "request": {"method": "POST", "url": "", "headers": "POST /login HTTP/1.1", "body": ""},
                 "config": {"protocol": "https", "port": "443", "host": "a.com", "followRedirects": true},
                 "response": {"status": 200, "statusText": "OK", "headers": {"X": "1"}, "body": "hi"}},
                {"id": "bbbbbbbb-2", "name": "other", "domain": "", "response": null}
            ],
            "activeTabId": "bbbbbbbb-2"
        });
        let storage = Arc::new(MemoryStore::with(TABS_STATE_KEY, &saved.to_string()));
        let store = TabStore::restore(storage);

        assert_eq!(store.len(), 2);
        assert_eq!(store.active_tab_id(), Some("bbbbbbbb-2"));
        let first = &store.tabs()[0];
        assert!(first.config.follow_redirects);
        assert_eq!(first.response.as_ref().map(|r| r.body.as_str()), Some("hi"));
    }

    #[test]
    fn test_restore_repairs_dangling_active() {
        let saved = json!({"tabs": [{"id": "x1", "name": "one"}], "activeTabId": "gone"});
        let storage = Arc::new(MemoryStore::with(TABS_STATE_KEY, &saved.to_string()));
        let store = TabStore::restore(storage);
        assert_eq!(store.active_tab_id(), Some("x1"));
    }

    #[test]
    fn test_restore_discards_corrupt_state() {
        for corrupt in ["{not json", r#"{"tabs": {}}"#, r#"{"tabs": [{"name": 3}]}"#, "[]"] {
            let storage = Arc::new(MemoryStore::with(TABS_STATE_KEY, corrupt));
            let store = TabStore::restore(Arc::clone(&storage) as Arc<dyn KeyValueStore>);

            assert_eq!(store.len(), 1, "input: {corrupt}");
            assert!(store.tabs()[0].name.ends_with("-new"));
            // The default tab replaced the corrupt value.
            assert!(persisted(&storage)["tabs"].is_array());
        }
    }

    #[test]
    fn test_create_does_not_steal_focus() {
        let (_storage, mut store) = fresh();
        let first = store.active_tab_id().map(str::to_string);
        let second = store.create_tab(Some(TabSeed {
            host: Some("api.test".to_string()),
            ..Default::default()
        }));

        assert_eq!(store.active_tab_id().map(str::to_string), first);
        assert_eq!(
            store.tab(&second).map(|t| t.domain.as_str()),
            Some("api.test")
        );
    }

    #[test]
    fn test_close_active_moves_to_next_then_previous() {
        let (_storage, mut store) = fresh();
        let a = store.tabs()[0].id.clone();
        let b = store.create_tab(None);
        let c = store.create_tab(None);

        store.set_active_tab(&b);
        store.close_tab(&b);
        assert_eq!(store.active_tab_id(), Some(c.as_str()));

        store.close_tab(&c);
        assert_eq!(store.active_tab_id(), Some(a.as_str()));

        store.close_tab(&a);
        assert_eq!(store.active_tab_id(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let (_storage, mut store) = fresh();
        let a = store.tabs()[0].id.clone();
        let b = store.create_tab(None);
        store.close_tab(&b);
        assert_eq!(store.active_tab_id(), Some(a.as_str()));
        store.close_tab("unknown");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_activation_invariant_over_sequences() {
        let (_storage, mut store) = fresh();
        let mut ids = vec![store.tabs()[0].id.clone()];
        for step in 0..12 {
            match step % 4 {
                0 | 1 => ids.push(store.create_tab(None)),
                2 => {
                    let id = ids.remove(step % ids.len());
                    store.close_tab(&id);
                }
                _ => {
                    if let Some(id) = ids.last() {
                        store.set_active_tab(id);
                    }
                }
            }
            assert_active_invariant(&store);
        }
        store.close_all_tabs();
        assert_active_invariant(&store);
        store.create_tab(None);
        assert_active_invariant(&store);
    }

    #[test]
    fn test_rename_trims_and_ignores_blank() {
        let (_storage, mut store) = fresh();
        let id = store.tabs()[0].id.clone();
        store.rename_tab(&id, "   ");
        assert!(store.tabs()[0].name.ends_with("-new"));
        store.rename_tab(&id, "  checkout  ");
        assert_eq!(store.tabs()[0].name, "checkout");
    }

    #[test]
    fn test_update_tab_name_uses_short_id() {
        let (_storage, mut store) = fresh();
        let id = store.tabs()[0].id.clone();
        store.update_tab_name(&id, "example.com");
        let tab = store.tab(&id).expect("tab");
        assert_eq!(tab.name, format!("{}-example.com", &id[..8]));
        assert_eq!(tab.domain, "example.com");
    }

    #[test]
    fn test_sort_is_stable() {
        let (_storage, mut store) = fresh();
        let first = store.tabs()[0].id.clone();
        let b = store.create_tab(None);
        let c = store.create_tab(None);
        store.rename_tab(&first, "zeta");
        store.rename_tab(&b, "alpha");
        store.rename_tab(&c, "alpha");

        store.sort_tabs_by_name();
        let order: Vec<&str> = store.tabs().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec![b.as_str(), c.as_str(), first.as_str()]);
    }

    #[test]
    fn test_update_active_tab_only_touches_active() {
        let (_storage, mut store) = fresh();
        let other = store.create_tab(None);
        assert!(store.update_active_tab(|tab| tab.request.body = "x=1".to_string()));
        assert_eq!(
            store.active_tab().map(|t| t.request.body.as_str()),
            Some("x=1")
        );
        assert_eq!(store.tab(&other).map(|t| t.request.body.as_str()), Some(""));

        store.close_all_tabs();
        assert!(!store.update_active_tab(|tab| tab.request.body.clear()));
    }

    #[test]
    fn test_append_tabs_assigns_fresh_ids() {
        let (_storage, mut store) = fresh();
        let imports: Vec<TabImport> = serde_json::from_value(json!([
            {"id": "dup", "name": "one"},
            {"id": "dup", "name": "two"}
        ]))
        .expect("parse");

        let ids = store.append_tabs(imports);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(ids.iter().all(|id| id != "dup"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_every_mutation_persists() {
        let (storage, mut store) = fresh();
        let id = store.create_tab(None);
        store.set_active_tab(&id);
        assert_eq!(persisted(&storage)["activeTabId"], json!(id));

        store.close_all_tabs();
        assert_eq!(
            persisted(&storage),
            json!({"tabs": [], "activeTabId": null})
        );
    }

    #[test]
    fn test_persist_failure_is_not_surfaced() {
        let (storage, mut store) = fresh();
        storage.fail_saves();
        let id = store.create_tab(None);
        assert!(store.tab(&id).is_some());
    }
}
