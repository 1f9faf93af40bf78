//! What survives a page reload: best score, settings and the player's name.
//! Reads fall back to defaults; failed writes are logged and dropped.

use stack_engine::{load_json, save_json, KeyValueStore, StorageError};

use crate::config::Settings;

pub const KEY_BEST: &str = "gift_stacker.best";
pub const KEY_SETTINGS: &str = "gift_stacker.settings";
pub const KEY_PLAYER: &str = "gift_stacker.player";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub best: u32,
    pub settings: Settings,
    pub player: Option<String>,
}

impl Profile {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let settings = match load_json::<Settings>(store, KEY_SETTINGS) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(err) => {
                log::warn!("using default settings: {}", err);
                Settings::default()
            }
        };
        Self {
            best: load_best(store),
            settings,
            player: load_player(store),
        }
    }
}

/// Persisted best score, 0 when missing or unreadable.
pub fn load_best(store: &dyn KeyValueStore) -> u32 {
    match store.get(KEY_BEST) {
        Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring malformed best score {:?}", raw);
            0
        }),
        Ok(None) => 0,
        Err(err) => {
            log::warn!("best score unavailable: {}", err);
            0
        }
    }
}

pub fn load_player(store: &dyn KeyValueStore) -> Option<String> {
    store.get(KEY_PLAYER).ok().flatten().filter(|name| !name.is_empty())
}

pub fn save_best(store: &mut dyn KeyValueStore, best: u32) {
    report(store.set(KEY_BEST, &best.to_string()));
}

pub fn save_settings(store: &mut dyn KeyValueStore, settings: &Settings) {
    report(save_json(store, KEY_SETTINGS, settings));
}

pub fn save_player(store: &mut dyn KeyValueStore, name: &str) {
    report(store.set(KEY_PLAYER, name));
}

fn report(result: Result<(), StorageError>) {
    if let Err(err) = result {
        log::warn!("could not persist: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use stack_engine::MemoryStore;

    /// Store that refuses every operation.
    struct Offline;

    impl KeyValueStore for Offline {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn empty_store_gives_defaults() {
        let profile = Profile::load(&MemoryStore::new());
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn saved_values_load_back() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.apply_difficulty(Difficulty::Hard);
        settings.theme = "winter".into();

        save_best(&mut store, 17);
        save_settings(&mut store, &settings);
        save_player(&mut store, "Ada");

        let profile = Profile::load(&store);
        assert_eq!(profile.best, 17);
        assert_eq!(profile.settings, settings);
        assert_eq!(profile.player.as_deref(), Some("Ada"));
    }

    #[test]
    fn malformed_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set(KEY_BEST, "lots").unwrap();
        store.set(KEY_SETTINGS, "[1,2").unwrap();
        let profile = Profile::load(&store);
        assert_eq!(profile.best, 0);
        assert_eq!(profile.settings, Settings::default());
    }

    #[test]
    fn offline_store_is_harmless() {
        let mut store = Offline;
        save_best(&mut store, 3);
        save_player(&mut store, "Ada");
        assert_eq!(Profile::load(&store), Profile::default());
    }
}
