//! Generated codes and the bounded history they are kept in.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::content::{ContentPayload, ContentType};
use crate::display::format_display_content;
use crate::error::Result;
use crate::settings::QrCodeSettings;

/// Maximum number of entries a [`History`] keeps.
pub const MAX_HISTORY_ITEMS: usize = 10;

/// One generated QR code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeData {
    /// Milliseconds since the Unix epoch at creation time.
    pub id: String,
    /// The encoded string carried by the code.
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Snapshot of the settings used; never shared with the caller.
    pub settings: QrCodeSettings,
    pub created_at: DateTime<Utc>,
    pub display_content: String,
}

impl QrCodeData {
    /// Encodes `payload` and records it together with a copy of `settings`.
    pub fn new(payload: &ContentPayload, settings: &QrCodeSettings) -> Self {
        Self::from_content(payload.encode(), payload.content_type(), settings)
    }

    /// Records an already encoded string.
    pub fn from_content(
        content: impl Into<String>,
        content_type: ContentType,
        settings: &QrCodeSettings,
    ) -> Self {
        Self::at(content.into(), content_type, settings, Utc::now())
    }

    fn at(
        content: String,
        content_type: ContentType,
        settings: &QrCodeSettings,
        created_at: DateTime<Utc>,
    ) -> Self {
        let display_content = format_display_content(&content, content_type);
        Self {
            id: created_at.timestamp_millis().to_string(),
            content,
            content_type,
            settings: settings.clone(),
            created_at,
            display_content,
        }
    }
}

/// Most-recent-first list of generated codes, capped at
/// [`MAX_HISTORY_ITEMS`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    items: Vec<QrCodeData>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `item` at the front. An existing entry with the same id is
    /// replaced rather than duplicated, and the oldest entries beyond the cap
    /// are dropped.
    pub fn add(&mut self, item: QrCodeData) {
        self.items.retain(|existing| existing.id != item.id);
        self.items.insert(0, item);
        self.items.truncate(MAX_HISTORY_ITEMS);
    }

    pub fn get(&self, id: &str) -> Option<&QrCodeData> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<QrCodeData> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[QrCodeData] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rebuilds a history from arbitrary stored items, keeping the first
    /// occurrence of each id and enforcing the cap.
    fn from_items(items: Vec<QrCodeData>) -> Self {
        let mut history = History::new();
        for item in items {
            if history.get(&item.id).is_none() && history.len() < MAX_HISTORY_ITEMS {
                history.items.push(item);
            }
        }
        history
    }
}

/// JSON file backing a [`History`].
#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the history. A missing, empty or unreadable JSON file is an
    /// empty history; the next save replaces a corrupt file.
    pub fn load(&self) -> Result<History> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no history file yet");
            return Ok(History::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(History::new());
        }
        let items: Vec<QrCodeData> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt history file");
                return Ok(History::new());
            }
        };
        let stored = items.len();
        let history = History::from_items(items);
        if history.len() != stored {
            warn!(stored, kept = history.len(), "history file had extra or duplicate entries");
        }
        Ok(history)
    }

    pub fn save(&self, history: &History) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(history)?;
        // Readers only ever see a complete file.
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(path = %self.path.display(), entries = history.len(), "saved history");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Loads, applies `update`, and saves.
    pub fn update<T>(&self, update: impl FnOnce(&mut History) -> T) -> Result<T> {
        let mut history = self.load()?;
        let result = update(&mut history);
        self.save(&history)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::WhatsAppData;
    use chrono::TimeZone;

    fn item(millis: i64) -> QrCodeData {
        let at = Utc.timestamp_millis_opt(millis).unwrap();
        QrCodeData::at(
            format!("tel:{}", millis),
            ContentType::Phone,
            &QrCodeSettings::default(),
            at,
        )
    }

    #[test]
    fn test_id_is_time_derived() {
        let data = item(1_700_000_000_123);
        assert_eq!(data.id, "1700000000123");
        assert_eq!(data.display_content, "Phone: 1700000000123");
    }

    #[test]
    fn test_new_encodes_payload() {
        let payload = ContentPayload::Whatsapp(WhatsAppData {
            to: "15550100".into(),
            message: "hi there".into(),
        });
        let data = QrCodeData::new(&payload, &QrCodeSettings::default());
        assert_eq!(data.content, "https://wa.me/15550100?text=hi%20there");
        assert_eq!(data.content_type, ContentType::Whatsapp);
        assert_eq!(data.display_content, "WhatsApp: 15550100");
    }

    #[test]
    fn test_settings_are_snapshotted() {
        let mut settings = QrCodeSettings::default();
        let data = QrCodeData::from_content("x", ContentType::Text, &settings);
        settings.size = 1024;
        assert_eq!(data.settings.size, 256);
    }

    #[test]
    fn test_history_is_bounded_most_recent_first() {
        let mut history = History::new();
        for i in 0..11 {
            history.add(item(i));
        }
        assert_eq!(history.len(), MAX_HISTORY_ITEMS);
        let ids: Vec<&str> = history.items().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["10", "9", "8", "7", "6", "5", "4", "3", "2", "1"]);
    }

    #[test]
    fn test_duplicate_id_replaces_at_front() {
        let mut history = History::new();
        history.add(item(1));
        history.add(item(2));
        history.add(item(3));

        let mut again = item(1);
        again.content = "tel:updated".into();
        history.add(again);

        assert_eq!(history.len(), 3);
        assert_eq!(history.items()[0].id, "1");
        assert_eq!(history.items()[0].content, "tel:updated");
        assert_eq!(history.items()[1].id, "3");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut history = History::new();
        history.add(item(1));
        history.add(item(2));
        assert_eq!(history.remove("1").map(|d| d.id), Some("1".to_string()));
        assert!(history.remove("1").is_none());
        assert!(history.get("2").is_some());
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested").join("history.json"));
        assert!(store.load().unwrap().is_empty());

        let mut history = History::new();
        history.add(item(5));
        history.add(item(6));
        store.save(&history).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_store_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.update(|h| h.add(item(42))).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["id"], "42");
        assert_eq!(json[0]["type"], "phone");
        assert_eq!(json[0]["displayContent"], "Phone: 42");
        assert!(json[0]["createdAt"].is_string());
    }

    #[test]
    fn test_corrupt_file_is_replaced_on_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, r#"[{"id":"1","content":"#).unwrap();
        let store = HistoryStore::new(&path);

        assert!(store.load().unwrap().is_empty());
        store.update(|h| h.add(item(7))).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.items()[0].id, "7");
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.update(|h| h.add(item(1))).unwrap();
        store.update(|h| h.add(item(2))).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["history.json"]);
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_load_rebounds_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let items: Vec<QrCodeData> = (0..15).map(item).chain([item(0)]).collect();
        fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();

        let loaded = HistoryStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), MAX_HISTORY_ITEMS);
        assert_eq!(loaded.items()[0].id, "0");
    }
}
