//! Namespaced JSON key-value store for settings, goal, plan and the
//! audio-practice list.
//!
//! Each key is one file, `<namespace>.<key>.json`, read with a typed default
//! and rewritten after every mutation. Writes are best-effort: a failure is
//! logged and the caller keeps its in-memory state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::demo_plan::demo_plan;
use crate::error::{Result, TutorError};
use crate::model::{PracticeSentence, Settings, StudyPlan, DEFAULT_GOAL};

pub const SETTINGS_KEY: &str = "settings";
pub const GOAL_KEY: &str = "goal";
pub const PLAN_KEY: &str = "plan";
pub const AUDIO_SENTENCES_KEY: &str = "audio-sentences";

pub struct Store {
    base_dir: PathBuf,
    namespace: String,
}

impl Store {
    pub fn new(base_dir: impl Into<PathBuf>, namespace: &str) -> Self {
        Self {
            base_dir: base_dir.into(),
            namespace: namespace.to_string(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{key}.json", self.namespace))
    }

    /// Read an entry, falling back to `default` when it is missing or cannot
    /// be decoded.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let path = self.file_path(key);
        if !path.exists() {
            return default;
        }
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Ignoring unreadable entry {}: {e}", path.display());
                    default
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                default
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.base_dir).map_err(|e| TutorError::storage(key, e))?;

        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value).map_err(|e| TutorError::storage(key, e))?;

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            TutorError::storage(key, e)
        })?;

        debug!("Saved {}", path.display());
        Ok(())
    }

    /// Write an entry, logging instead of failing.
    pub fn save_best_effort<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match self.save(key, value) {
            Ok(()) => true,
            Err(e) => {
                error!("{e}");
                false
            }
        }
    }

    pub fn settings(&self) -> Settings {
        self.load(SETTINGS_KEY, Settings::default())
    }

    pub fn goal(&self) -> String {
        self.load(GOAL_KEY, DEFAULT_GOAL.to_string())
    }

    pub fn plan(&self) -> StudyPlan {
        self.load(PLAN_KEY, demo_plan())
    }

    pub fn audio_sentences(&self) -> Vec<PracticeSentence> {
        self.load(AUDIO_SENTENCES_KEY, Vec::new())
    }

    /// Restore settings, goal and plan to their defaults. The audio-practice
    /// list is left alone.
    pub fn reset(&self) -> bool {
        let settings = self.save_best_effort(SETTINGS_KEY, &Settings::default());
        let goal = self.save_best_effort(GOAL_KEY, &DEFAULT_GOAL.to_string());
        let plan = self.save_best_effort(PLAN_KEY, &demo_plan());
        settings && goal && plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path(), "ll");
        (dir, store)
    }

    #[test]
    fn missing_entries_use_typed_defaults() {
        let (_dir, store) = make_test_store();
        assert_eq!(store.settings(), Settings::default());
        assert_eq!(store.goal(), DEFAULT_GOAL);
        assert_eq!(store.plan(), demo_plan());
        assert!(store.audio_sentences().is_empty());
    }

    #[test]
    fn saved_entries_are_namespaced() {
        let (dir, store) = make_test_store();
        store.save(GOAL_KEY, &"Order coffee in Lisbon".to_string()).unwrap();
        assert!(dir.path().join("ll.goal.json").exists());
        assert_eq!(store.goal(), "Order coffee in Lisbon");

        let other = Store::new(dir.path(), "other");
        assert_eq!(other.goal(), DEFAULT_GOAL);
    }

    #[test]
    fn corrupt_entry_falls_back() {
        let (dir, store) = make_test_store();
        fs::write(dir.path().join("ll.plan.json"), "{not json").unwrap();
        assert_eq!(store.plan(), demo_plan());
    }

    #[test]
    fn failed_write_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let store = Store::new(blocker.join("nested"), "ll");

        assert!(matches!(
            store.save(GOAL_KEY, &"x".to_string()),
            Err(TutorError::Storage { .. })
        ));
        assert!(!store.save_best_effort(GOAL_KEY, &"x".to_string()));
    }

    #[test]
    fn reset_restores_defaults() {
        let (_dir, store) = make_test_store();
        let settings = Settings {
            api_key: "sk-test".into(),
            ..Settings::default()
        };
        store.save(SETTINGS_KEY, &settings).unwrap();
        store.save(GOAL_KEY, &"Something else".to_string()).unwrap();

        assert!(store.reset());
        assert_eq!(store.settings(), Settings::default());
        assert_eq!(store.goal(), DEFAULT_GOAL);
    }
}
