//! Player preferences
//!
//! Persisted under their own key, separate from the leaderboard.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};

/// Display language the host renders messages in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    English,
    Chinese,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "zh" | "cn" | "chinese" => Some(Language::Chinese),
            _ => None,
        }
    }
}

/// Actor sprite, also stored with leaderboard records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Boy,
    CatGirl,
    HornGirl,
    PinkGirl,
    PrincessGirl,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Boy,
        Role::CatGirl,
        Role::HornGirl,
        Role::PinkGirl,
        Role::PrincessGirl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Boy => "boy",
            Role::CatGirl => "cat-girl",
            Role::HornGirl => "horn-girl",
            Role::PinkGirl => "pink-girl",
            Role::PrincessGirl => "princess-girl",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
    }

    /// Sprite image path
    pub fn sprite(&self) -> String {
        format!("images/char-{}.png", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: Language,
    pub role: Role,
}

impl Settings {
    const STORAGE_KEY: &'static str = "settings";

    /// Load saved settings, falling back to defaults when missing or unreadable
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get_json::<Settings>(Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings: {:?}", settings);
                settings
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Ignoring saved settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StoreError> {
        store.set_json(Self::STORAGE_KEY, self)?;
        log::debug!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_when_missing() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            language: Language::Chinese,
            role: Role::PinkGirl,
        };
        settings.save(&mut store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut store = MemoryStore::new();
        store.set("settings", "[]").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::from_str("Cat-Girl"), Some(Role::CatGirl));
        assert_eq!(Role::PrincessGirl.sprite(), "images/char-princess-girl.png");
        assert_eq!(Language::from_str("ZH"), Some(Language::Chinese));
        assert_eq!(Language::from_str("fr"), None);
    }
}
