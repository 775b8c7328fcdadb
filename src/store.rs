// ============================================================================
// SETTINGS STORE — debounced key-value persistence in the config directory
// ============================================================================
//
// Each setting lives in its own JSON file under the app config dir, so a
// key can be rewritten without touching the others. Writes are debounced:
// `set` only stages the value, and `tick` (called every UI frame) flushes
// keys that have been quiet for the debounce window. Readers therefore see
// either the previous or the latest complete value, never a torn one
// (writes go to a temp file first, then rename over the target).

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Quiet period after the last change before a key is written out.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// The persisted keys. Everything the app restores at startup.
pub mod keys {
    pub const PALETTE: &str = "palette";
    pub const GRID: &str = "grid";
    pub const BRUSH_SIZE: &str = "brush_size";
    pub const FILL_TYPE: &str = "fill_type";
    pub const SELECTED_COLOR: &str = "selected_color";
    pub const ZOOM: &str = "zoom";

    pub const ALL: &[&str] = &[PALETTE, GRID, BRUSH_SIZE, FILL_TYPE, SELECTED_COLOR, ZOOM];
}

pub struct SettingsStore {
    dir: PathBuf,
    delay: Duration,
    /// Staged values: serialized JSON + the instant of the last change.
    pending: HashMap<&'static str, (String, Instant)>,
}

impl SettingsStore {
    /// Store rooted at the platform config directory.
    /// Linux:   ~/.config/stitchfe/            (XDG_CONFIG_HOME respected)
    /// Windows: %APPDATA%\StitchFE\
    /// macOS:   ~/Library/Application Support/StitchFE/
    pub fn open_default() -> Self {
        Self::at(Self::config_dir())
    }

    /// Store rooted at an explicit directory (tests use a temp dir).
    pub fn at(dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&dir);
        Self {
            dir,
            delay: DEBOUNCE,
            pending: HashMap::new(),
        }
    }

    #[cfg(test)]
    fn with_delay(dir: PathBuf, delay: Duration) -> Self {
        let mut store = Self::at(dir);
        store.delay = delay;
        store
    }

    fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            let base = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."));
            return base.join("StitchFE");
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("StitchFE");
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let base = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                    PathBuf::from(home).join(".config")
                });
            base.join("stitchfe")
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read a key. Staged-but-unflushed values win over the file so a get
    /// right after a set sees the new value. Missing or corrupt values
    /// read as `None` and the caller substitutes its default.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some((json, _)) = self.pending.get(key) {
            return serde_json::from_str(json).ok();
        }
        let json = fs::read_to_string(self.key_path(key)).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Stage a value for `key`. Restarts that key's debounce window.
    pub fn set<T: Serialize>(&mut self, key: &'static str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => {
                self.pending.insert(key, (json, Instant::now()));
            }
            Err(e) => {
                crate::log_warn!("Settings value for '{}' failed to serialize: {}", key, e);
            }
        }
    }

    /// Flush every staged key whose debounce window has elapsed. Called
    /// once per UI frame.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let due: Vec<&'static str> = self
            .pending
            .iter()
            .filter(|(_, (_, changed))| now.duration_since(*changed) >= self.delay)
            .map(|(key, _)| *key)
            .collect();
        for key in due {
            if let Some((json, _)) = self.pending.remove(key) {
                self.write_key(key, &json);
            }
        }
    }

    /// True while at least one value is staged and unwritten.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Write all staged values immediately (app exit).
    pub fn flush_all(&mut self) {
        let staged: Vec<(&'static str, String)> = self
            .pending
            .drain()
            .map(|(key, (json, _))| (key, json))
            .collect();
        for (key, json) in staged {
            self.write_key(key, &json);
        }
    }

    /// Delete every persisted key and drop staged values (factory reset).
    pub fn clear_all(&mut self) {
        self.pending.clear();
        for key in keys::ALL {
            let _ = fs::remove_file(self.key_path(key));
        }
    }

    fn write_key(&self, key: &str, json: &str) {
        let path = self.key_path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        let result = fs::write(&tmp, json).and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            crate::log_warn!("Failed to persist setting '{}': {}", key, e);
        }
    }
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_then_get_sees_the_staged_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::at(dir.path().to_path_buf());
        store.set(keys::ZOOM, &2.5f32);
        assert_eq!(store.get::<f32>(keys::ZOOM), Some(2.5));
    }

    #[test]
    fn debounce_holds_the_write_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::at(dir.path().to_path_buf());
        store.set(keys::BRUSH_SIZE, &1.5f32);
        store.tick();
        assert!(!dir.path().join("brush_size.json").exists());
        assert!(store.has_pending());
    }

    #[test]
    fn elapsed_debounce_flushes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::with_delay(dir.path().to_path_buf(), Duration::ZERO);
        store.set(keys::BRUSH_SIZE, &3.5f32);
        store.tick();
        assert!(dir.path().join("brush_size.json").exists());
        assert!(!store.has_pending());

        // A fresh store (a new app session) reads the flushed value.
        let reopened = SettingsStore::at(dir.path().to_path_buf());
        assert_eq!(reopened.get::<f32>(keys::BRUSH_SIZE), Some(3.5));
    }

    #[test]
    fn flush_all_ignores_the_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::at(dir.path().to_path_buf());
        store.set(keys::SELECTED_COLOR, &Some(2usize));
        store.flush_all();
        let reopened = SettingsStore::at(dir.path().to_path_buf());
        assert_eq!(
            reopened.get::<Option<usize>>(keys::SELECTED_COLOR),
            Some(Some(2))
        );
    }

    #[test]
    fn corrupt_value_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zoom.json"), "{not json").unwrap();
        let store = SettingsStore::at(dir.path().to_path_buf());
        assert_eq!(store.get::<f32>(keys::ZOOM), None);
    }

    #[test]
    fn missing_value_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().to_path_buf());
        assert_eq!(store.get::<Vec<String>>(keys::PALETTE), None);
    }

    #[test]
    fn clear_all_removes_persisted_and_staged_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::with_delay(dir.path().to_path_buf(), Duration::ZERO);
        store.set(keys::ZOOM, &4.0f32);
        store.tick();
        store.set(keys::BRUSH_SIZE, &2.0f32);
        store.clear_all();
        assert_eq!(store.get::<f32>(keys::ZOOM), None);
        assert_eq!(store.get::<f32>(keys::BRUSH_SIZE), None);
        assert!(!dir.path().join("zoom.json").exists());
    }

    #[test]
    fn newer_set_replaces_the_staged_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::with_delay(dir.path().to_path_buf(), Duration::ZERO);
        store.set(keys::ZOOM, &1.0f32);
        store.set(keys::ZOOM, &2.0f32);
        store.tick();
        let reopened = SettingsStore::at(dir.path().to_path_buf());
        assert_eq!(reopened.get::<f32>(keys::ZOOM), Some(2.0));
    }
}
