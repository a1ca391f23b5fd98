//! Saved progress
//!
//! The progression/shop layer owns writes; the simulation only reads the
//! upgrade snapshot at the start of a level. A missing or unreadable store is
//! never fatal - it just means "no saved progress".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progression::{
    BASE_MAX_LIVES, LEVEL_SKIP_AMOUNT, LEVEL_SKIP_COST, Purchase, ShopError, Upgrades,
    diamonds_to_points, spend,
};

/// Key used when playing without an account
pub const OFFLINE_SAVE_KEY: &str = "appleAdventure3DData_offline";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("progress store unavailable: {0}")]
    Unavailable(String),
    #[error("saved progress is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Everything the progression layer keeps between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedProgress {
    pub upgrade_points: u64,
    pub diamonds: u64,
    pub current_level: u32,
    pub character_id: String,
    pub upgrades: Upgrades,
    pub unlocked_characters: Vec<String>,
    pub daily_reward_streak: u32,
    pub last_login_date: Option<String>,
}

impl Default for SavedProgress {
    fn default() -> Self {
        Self {
            upgrade_points: 0,
            diamonds: 0,
            current_level: 1,
            character_id: "default".to_string(),
            upgrades: Upgrades::default(),
            unlocked_characters: vec!["default".to_string()],
            daily_reward_streak: 0,
            last_login_date: None,
        }
    }
}

impl SavedProgress {
    /// Decode a stored JSON document
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let mut progress: SavedProgress = serde_json::from_str(json)?;
        // Old saves stored 0 for "not bought yet"
        if progress.upgrades.max_lives == 0 {
            progress.upgrades.max_lives = BASE_MAX_LIVES;
        }
        if progress.current_level == 0 {
            progress.current_level = 1;
        }
        Ok(progress)
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Spend upgrade points on a shop item
    pub fn buy(&mut self, item: Purchase) -> Result<u64, ShopError> {
        self.upgrades.buy(item, &mut self.upgrade_points)
    }

    /// Pay to jump ahead; returns the new current level
    pub fn skip_levels(&mut self) -> Result<u32, ShopError> {
        spend(&mut self.upgrade_points, LEVEL_SKIP_COST)?;
        self.current_level = self.current_level.saturating_add(LEVEL_SKIP_AMOUNT);
        log::info!("Skipped ahead to level {}", self.current_level);
        Ok(self.current_level)
    }

    /// Trade diamonds for upgrade points
    pub fn convert_diamonds(&mut self, amount: u64) -> Result<u64, ShopError> {
        if amount > self.diamonds {
            return Err(ShopError::InsufficientDiamonds {
                needed: amount,
                available: self.diamonds,
            });
        }
        let points = diamonds_to_points(amount);
        self.diamonds -= amount;
        self.upgrade_points = self.upgrade_points.saturating_add(points);
        Ok(points)
    }
}

/// Opaque key/value progress store with a leaderboard hook
pub trait ProgressStore {
    fn load(&self, key: &str) -> Result<Option<SavedProgress>, PersistenceError>;
    fn save(&mut self, key: &str, progress: &SavedProgress) -> Result<(), PersistenceError>;
    /// Report the highest level reached for ranking
    fn submit_rank(&mut self, key: &str, highest_level: u32) -> Result<(), PersistenceError>;
}

/// Storage key for a signed-in user, the offline profile, or nothing
pub fn save_key(user_id: Option<&str>, offline: bool) -> Option<String> {
    match user_id {
        Some(uid) => Some(format!("appleAdventure3DData_{}", uid)),
        None if offline => Some(OFFLINE_SAVE_KEY.to_string()),
        None => None,
    }
}

/// Upgrade snapshot for a level attempt; defaults on any failure
pub fn load_upgrades(store: &dyn ProgressStore, key: &str) -> Upgrades {
    match store.load(key) {
        Ok(Some(progress)) => progress.upgrades,
        Ok(None) => {
            log::info!("No saved progress under {}, starting fresh", key);
            Upgrades::default()
        }
        Err(e) => {
            log::warn!("Treating {} as empty: {}", key, e);
            Upgrades::default()
        }
    }
}

/// In-memory store holding JSON documents (tests and headless runs)
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<String, String>,
    ranks: HashMap<String, u32>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the backend were unreachable
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn check_online(&self) -> Result<(), PersistenceError> {
        if self.offline {
            return Err(PersistenceError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    /// Store a raw document, bypassing encoding (used to simulate corruption)
    pub fn insert_raw(&mut self, key: &str, json: &str) {
        self.documents.insert(key.to_string(), json.to_string());
    }

    /// Highest level submitted under `key`
    pub fn rank(&self, key: &str) -> Option<u32> {
        self.ranks.get(key).copied()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<SavedProgress>, PersistenceError> {
        self.check_online()?;
        self.documents
            .get(key)
            .map(|json| SavedProgress::from_json(json))
            .transpose()
    }

    fn save(&mut self, key: &str, progress: &SavedProgress) -> Result<(), PersistenceError> {
        self.check_online()?;
        let json = progress.to_json()?;
        self.documents.insert(key.to_string(), json);
        Ok(())
    }

    fn submit_rank(&mut self, key: &str, highest_level: u32) -> Result<(), PersistenceError> {
        self.check_online()?;
        let best = self.ranks.entry(key.to_string()).or_insert(0);
        *best = (*best).max(highest_level);
        Ok(())
    }
}
