use crate::{PilotError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One cookie captured from a live page, in the page's native serialization
/// shape (camelCase field names on disk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// The persisted cookie set representing an authenticated browser state.
/// Serializes as a bare array, so a record file is exactly the cookie list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord {
    pub cookies: Vec<CookieEntry>,
}

impl SessionRecord {
    pub fn new(cookies: Vec<CookieEntry>) -> Self {
        Self { cookies }
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Persists session records under `<base_dir>/<storage_key>/<cookies_file>`.
pub struct SessionStore {
    base_dir: PathBuf,
    cookies_file: String,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>, cookies_file: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cookies_file: cookies_file.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn record_path(&self, storage_key: &str) -> PathBuf {
        self.base_dir.join(storage_key).join(&self.cookies_file)
    }

    /// Writes the record, fully replacing any prior file for this key.
    /// Filesystem failures surface as-is; there is no retry.
    pub fn save(&self, storage_key: &str, record: &SessionRecord) -> Result<()> {
        let path = self.record_path(storage_key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        tracing::debug!(path = %path.display(), cookies = record.len(), "session record saved");
        Ok(())
    }

    /// A missing record is an ordinary outcome (`Ok(None)`); a record that
    /// exists but fails to parse is fatal. No self-healing of corrupt caches.
    pub fn load(&self, storage_key: &str) -> Result<Option<SessionRecord>> {
        let path = self.record_path(storage_key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let record = serde_json::from_str(&content)
            .map_err(|e| PilotError::CorruptSession(format!("{}: {}", path.display(), e)))?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_cookie(name: &str) -> CookieEntry {
        CookieEntry {
            name: name.to_string(),
            value: "v".to_string(),
            domain: ".example.com".to_string(),
            path: "/".to_string(),
            expires: 1_900_000_000.0,
            http_only: true,
            secure: true,
        }
    }

    #[test]
    fn test_record_path_layout() {
        let store = SessionStore::new("/tmp/sessions", "cookies.json");
        let path = store.record_path("abc123");
        assert_eq!(path, PathBuf::from("/tmp/sessions/abc123/cookies.json"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path(), "cookies.json");

        let record = SessionRecord::new(vec![sample_cookie("sid"), sample_cookie("csrf")]);
        store.save("key1", &record).unwrap();

        let loaded = store.load("key1").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_absent_is_none_not_error() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path(), "cookies.json");
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites_prior_record() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path(), "cookies.json");

        store
            .save("key1", &SessionRecord::new(vec![sample_cookie("old")]))
            .unwrap();
        store
            .save("key1", &SessionRecord::new(vec![sample_cookie("new")]))
            .unwrap();

        let loaded = store.load("key1").unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.cookies[0].name, "new");
    }

    #[test]
    fn test_load_malformed_is_fatal() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path(), "cookies.json");

        let path = store.record_path("key1");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        match store.load("key1") {
            Err(PilotError::CorruptSession(_)) => {}
            other => panic!("expected CorruptSession, got {:?}", other),
        }
    }

    #[test]
    fn test_record_serializes_as_bare_array() {
        let record = SessionRecord::new(vec![sample_cookie("sid")]);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"httpOnly\":true"));
    }
}
