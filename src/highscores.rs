//! Persisted best score
//!
//! A single integer stored under a fixed key, read once at startup and
//! rewritten whenever a finished run beats it.

use serde::{Deserialize, Serialize};

use crate::persistence::Storage;

/// Best score across all completed runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    best: u64,
}

impl HighScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "puzzle_verify_highscore_v1";

    /// Current best
    pub fn best(&self) -> u64 {
        self.best
    }

    /// Load the stored high score; missing or unreadable values count as zero
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(best) => {
                    log::info!("Loaded high score {best}");
                    return Self { best };
                }
                Err(e) => log::warn!("Ignoring malformed high score {raw:?}: {e}"),
            },
            Ok(None) => log::info!("No high score found, starting fresh"),
            Err(e) => log::warn!("High score unavailable: {e}"),
        }
        Self::default()
    }

    /// Record a finished run's score. Returns true when it set a new best.
    pub fn record(&mut self, score: u64, storage: &mut dyn Storage) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        match storage.set_item(Self::STORAGE_KEY, &score.to_string()) {
            Ok(()) => log::info!("New high score {score} saved"),
            Err(e) => log::warn!("New high score {score} not persisted: {e}"),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStorage, StorageError};

    #[test]
    fn test_higher_score_updates_store() {
        let mut store = MemoryStorage::new();
        let mut hs = HighScore::load(&store);
        assert_eq!(hs.best(), 0);

        assert!(hs.record(450, &mut store));
        assert_eq!(hs.best(), 450);
        assert_eq!(
            store.get_item(HighScore::STORAGE_KEY).unwrap().as_deref(),
            Some("450")
        );
        assert_eq!(HighScore::load(&store).best(), 450);
    }

    #[test]
    fn test_equal_or_lower_score_leaves_store() {
        let mut store = MemoryStorage::new();
        store.set_item(HighScore::STORAGE_KEY, "300").unwrap();
        let mut hs = HighScore::load(&store);

        assert!(!hs.record(300, &mut store));
        assert!(!hs.record(120, &mut store));
        assert_eq!(hs.best(), 300);
        assert_eq!(
            store.get_item(HighScore::STORAGE_KEY).unwrap().as_deref(),
            Some("300")
        );
    }

    #[test]
    fn test_malformed_value_counts_as_zero() {
        let mut store = MemoryStorage::new();
        store.set_item(HighScore::STORAGE_KEY, "lots").unwrap();
        assert_eq!(HighScore::load(&store).best(), 0);
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn remove_item(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_storage_failure_keeps_in_memory_best() {
        let mut store = BrokenStorage;
        let mut hs = HighScore::load(&store);
        assert!(hs.record(90, &mut store));
        assert_eq!(hs.best(), 90);
    }
}
