//! Persistence through a key-value storage collaborator.
//!
//! The browser host backs `KeyValueStore` with `localStorage`; tests and the
//! CLI use `MemoryStore`. Two layers sit on top:
//!
//! - single-diagram save/load (`save_diagram`, `load_diagram`, `load_or_default`)
//! - a user's saved mind-map history (`UserData`), stored under
//!   `invictus-data-<username>` next to the data of the app's other tools

use crate::error::{Error, Result};
use crate::model::Diagram;
use crate::snapshot::{Snapshot, deserialize_deep, from_json, to_json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest title derived from a root label, in characters.
const TITLE_MAX_CHARS: usize = 40;

/// String key-value storage. Every method may fail; failures are reported
/// as `Error::Storage` and never retried here.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store with an optional byte quota, mimicking `localStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes once keys + values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(Error::Storage(format!(
                    "quota exceeded writing `{key}` ({needed} > {quota} bytes)"
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ─── Single diagram ──────────────────────────────────────────────────────

/// Save a diagram snapshot under `key`, replacing whatever was there.
pub fn save_diagram<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, diagram: &Diagram) -> Result<()> {
    let json = to_json(diagram)?;
    store.set(key, &json)
}

/// Load the diagram under `key`. `Ok(None)` means nothing was saved.
pub fn load_diagram<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<Option<Diagram>> {
    match store.get(key)? {
        Some(json) => from_json(&json).map(Some),
        None => Ok(None),
    }
}

/// Load the diagram under `key`, starting over with the default diagram
/// when nothing is saved or the saved snapshot is malformed. Storage
/// failures still propagate.
pub fn load_or_default<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<Diagram> {
    match load_diagram(store, key) {
        Ok(Some(diagram)) => Ok(diagram),
        Ok(None) => Ok(Diagram::default()),
        Err(e) if e.is_malformed() => {
            log::warn!("discarding malformed snapshot under `{key}`: {e}");
            Ok(Diagram::default())
        }
        Err(e) => Err(e),
    }
}

// ─── Per-user history ────────────────────────────────────────────────────

/// Storage key holding all of a user's saved work.
pub fn data_key(username: &str) -> String {
    format!("invictus-data-{}", username.to_lowercase())
}

/// One saved mind map in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapEntry {
    pub id: String,
    pub title: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub result: Snapshot,
}

impl MindMapEntry {
    /// Validate the stored snapshot and turn it into a live diagram.
    pub fn diagram(&self) -> Result<Diagram> {
        self.result.clone().into_diagram()
    }
}

/// A user's saved data. Only the mind-map list and the active item are
/// interpreted; every other field is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub mind_maps: Vec<MindMapEntry>,
    #[serde(default)]
    pub active_item_id: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl UserData {
    /// Load a user's data; a user with nothing saved gets empty data.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, username: &str) -> Result<Self> {
        match store.get(&data_key(username))? {
            Some(json) => deserialize_deep(&json),
            None => Ok(Self::default()),
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S, username: &str) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set(&data_key(username), &json)
    }

    /// Remove everything stored for `username`.
    pub fn delete<S: KeyValueStore + ?Sized>(store: &mut S, username: &str) -> Result<()> {
        store.remove(&data_key(username))
    }

    /// Record a saved diagram and return the id of its history entry.
    ///
    /// If the active item is one of the saved mind maps, that entry is
    /// overwritten in place (keeping its id and timestamp). Otherwise a new
    /// entry `mindmap-<timestamp_ms>` goes to the front of the list and
    /// becomes the active item.
    pub fn save_mind_map(&mut self, diagram: &Diagram, timestamp_ms: u64) -> String {
        let snapshot = Snapshot::of(diagram);
        let derived = title_from(&diagram.map.root_node().text);

        let active = self.active_item_id.as_deref();
        if let Some(entry) = self
            .mind_maps
            .iter_mut()
            .find(|m| Some(m.id.as_str()) == active)
        {
            entry.title = derived.unwrap_or_else(|| "Mind Map".to_string());
            entry.result = snapshot;
            return entry.id.clone();
        }

        let id = format!("mindmap-{timestamp_ms}");
        self.mind_maps.insert(
            0,
            MindMapEntry {
                id: id.clone(),
                title: derived.unwrap_or_else(|| "New Mind Map".to_string()),
                timestamp: timestamp_ms,
                result: snapshot,
            },
        );
        self.active_item_id = Some(id.clone());
        id
    }

    pub fn mind_map(&self, id: &str) -> Option<&MindMapEntry> {
        self.mind_maps.iter().find(|m| m.id == id)
    }

    /// Delete a history entry. Clears the active item if it pointed there.
    pub fn delete_mind_map(&mut self, id: &str) -> bool {
        let before = self.mind_maps.len();
        self.mind_maps.retain(|m| m.id != id);
        let removed = self.mind_maps.len() != before;
        if removed && self.active_item_id.as_deref() == Some(id) {
            self.active_item_id = None;
        }
        removed
    }
}

fn title_from(root_text: &str) -> Option<String> {
    let title: String = root_text.chars().take(TITLE_MAX_CHARS).collect();
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::MindNode;
    use pretty_assertions::assert_eq;

    fn sample() -> Diagram {
        let mut diagram = Diagram::default();
        let root = diagram.map.root;
        diagram
            .map
            .add_child(root, MindNode::new(NodeId::intern("st_a"), "Federalism"));
        diagram
    }

    #[test]
    fn save_then_load() {
        let mut store = MemoryStore::new();
        let diagram = sample();
        save_diagram(&mut store, "map", &diagram).unwrap();
        assert_eq!(load_diagram(&store, "map").unwrap(), Some(diagram));
    }

    #[test]
    fn load_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(load_diagram(&store, "nothing").unwrap(), None);
        assert_eq!(load_or_default(&store, "nothing").unwrap(), Diagram::default());
    }

    #[test]
    fn malformed_snapshot_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set("map", r#"{"viewBox": {"x":0,"y":0,"width":1,"height":1}}"#).unwrap();
        assert!(load_diagram(&store, "map").is_err());
        assert_eq!(load_or_default(&store, "map").unwrap(), Diagram::default());
    }

    #[test]
    fn quota_failure_propagates() {
        let mut store = MemoryStore::with_quota(16);
        let err = save_diagram(&mut store, "map", &sample()).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(!err.is_malformed());
    }

    #[test]
    fn data_key_is_case_insensitive() {
        assert_eq!(data_key("Aspirant"), "invictus-data-aspirant");
    }

    #[test]
    fn first_save_creates_entry() {
        let mut data = UserData::default();
        let id = data.save_mind_map(&sample(), 1_700_000_000_000);
        assert_eq!(id, "mindmap-1700000000000");
        assert_eq!(data.active_item_id.as_deref(), Some(id.as_str()));
        assert_eq!(data.mind_maps[0].title, "Central Topic");
    }

    #[test]
    fn second_save_updates_active_entry() {
        let mut data = UserData::default();
        let id = data.save_mind_map(&sample(), 1);

        let mut edited = sample();
        edited.map.set_text(NodeId::root(), "");
        let again = data.save_mind_map(&edited, 2);

        assert_eq!(again, id);
        assert_eq!(data.mind_maps.len(), 1);
        assert_eq!(data.mind_maps[0].title, "Mind Map");
        assert_eq!(data.mind_maps[0].timestamp, 1);
        assert_eq!(data.mind_maps[0].diagram().unwrap(), edited);
    }

    #[test]
    fn new_entries_go_first() {
        let mut data = UserData::default();
        data.save_mind_map(&sample(), 1);
        data.active_item_id = None;
        let mut blank = Diagram::default();
        blank.map.set_text(NodeId::root(), "");
        data.save_mind_map(&blank, 2);
        assert_eq!(data.mind_maps[0].id, "mindmap-2");
        assert_eq!(data.mind_maps[0].title, "New Mind Map");
        assert_eq!(data.mind_maps[1].id, "mindmap-1");
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut diagram = Diagram::default();
        diagram.map.set_text(NodeId::root(), "x".repeat(100));
        let mut data = UserData::default();
        data.save_mind_map(&diagram, 3);
        assert_eq!(data.mind_maps[0].title.chars().count(), 40);
    }

    #[test]
    fn delete_entry_clears_active() {
        let mut data = UserData::default();
        let id = data.save_mind_map(&sample(), 5);
        assert!(data.delete_mind_map(&id));
        assert!(data.active_item_id.is_none());
        assert!(!data.delete_mind_map(&id));
    }

    #[test]
    fn other_tools_data_is_preserved() {
        let mut store = MemoryStore::new();
        let json = r#"{"chats":[{"id":"c1"}],"quizzes":[],"mindMaps":[],"activeItemId":null}"#;
        store.set(&data_key("asha"), json).unwrap();

        let mut data = UserData::load(&store, "Asha").unwrap();
        data.save_mind_map(&sample(), 9);
        data.save(&mut store, "asha").unwrap();

        let raw = store.get(&data_key("asha")).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["chats"][0]["id"], "c1");
        assert_eq!(value["mindMaps"][0]["id"], "mindmap-9");
    }

    #[test]
    fn delete_user_data() {
        let mut store = MemoryStore::new();
        UserData::default().save(&mut store, "gone").unwrap();
        UserData::delete(&mut store, "gone").unwrap();
        assert_eq!(store.get(&data_key("gone")).unwrap(), None);
    }
}
