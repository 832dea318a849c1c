//! Reward Ledger
//!
//! XP, level, streak, quest flags and unlocked items, persisted as three
//! independent JSON files in one directory:
//!
//! - `stats.json`   `{xp, level, streak, last_focus_date}`
//! - `quests.json`  `{25sec_focus, 1min_focus, daily_focus}` (booleans)
//! - `unlocks.json` `{skins: [], accessories: []}`
//!
//! Every mutation is written before the call returns. Each file has its own
//! lock, so mutations of different files interleave freely.

use crate::error::Result;
use crate::record::{Change, JsonRecord, Object};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const XP_PER_LEVEL: u64 = 100;

const STATS_FILE: &str = "stats.json";
const QUESTS_FILE: &str = "quests.json";
const UNLOCKS_FILE: &str = "unlocks.json";

/// Known quests and the XP each one awards on completion
fn default_quest_rewards() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("25sec_focus".to_string(), 10),
        ("1min_focus".to_string(), 25),
        ("daily_focus".to_string(), 15),
    ])
}

fn object(value: Value) -> Object {
    match value {
        Value::Object(map) => map,
        _ => Object::new(),
    }
}

fn get_u64(data: &Object, key: &str, default: u64) -> u64 {
    data.get(key).and_then(Value::as_u64).unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub xp: u64,
    pub level: u64,
    pub streak: u64,
    /// `YYYY-MM-DD`, empty before the first focus session
    pub last_focus_date: String,
}

impl Stats {
    /// Hand-edited files may hold `xp >= 100`; the surplus is folded into
    /// `level` so every snapshot keeps `xp < 100`.
    fn from_object(data: &Object) -> Self {
        let mut stats = Self {
            xp: get_u64(data, "xp", 0),
            level: get_u64(data, "level", 1).max(1),
            streak: get_u64(data, "streak", 0),
            last_focus_date: data
                .get("last_focus_date")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        stats.roll_over();
        stats
    }

    /// Move every full `XP_PER_LEVEL` of xp into level. Returns the levels gained.
    fn roll_over(&mut self) -> u64 {
        let gained = self.xp / XP_PER_LEVEL;
        self.xp %= XP_PER_LEVEL;
        self.level = self.level.saturating_add(gained);
        gained
    }

    fn write_to(&self, data: &mut Object) {
        data.insert("xp".into(), json!(self.xp));
        data.insert("level".into(), json!(self.level));
        data.insert("streak".into(), json!(self.streak));
        data.insert("last_focus_date".into(), json!(self.last_focus_date));
    }
}

pub struct RewardLedger {
    dir: PathBuf,
    stats: JsonRecord,
    quests: JsonRecord,
    unlocks: JsonRecord,
    quest_rewards: BTreeMap<String, u64>,
}

impl RewardLedger {
    /// Open (or create) the ledger files in `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let quest_rewards = default_quest_rewards();

        let stats = JsonRecord::open(
            dir.join(STATS_FILE),
            object(json!({ "xp": 0, "level": 1, "streak": 0, "last_focus_date": "" })),
        )?;
        let quests = JsonRecord::open(
            dir.join(QUESTS_FILE),
            quest_rewards
                .keys()
                .map(|id| (id.clone(), Value::Bool(false)))
                .collect(),
        )?;
        let unlocks = JsonRecord::open(
            dir.join(UNLOCKS_FILE),
            object(json!({ "skins": [], "accessories": [] })),
        )?;

        tracing::debug!(dir = %dir.display(), "reward ledger opened");
        Ok(Self {
            dir,
            stats,
            quests,
            unlocks,
            quest_rewards,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // --------------------------------------------------------------------
    // XP, level, streak
    // --------------------------------------------------------------------

    /// Add XP; every full 100 rolls over into a level.
    pub fn add_xp(&self, amount: u64) -> Result<Stats> {
        self.stats.update(|data| {
            let mut stats = Stats::from_object(data);
            stats.xp = stats.xp.saturating_add(amount);
            if stats.roll_over() > 0 {
                tracing::info!(level = stats.level, "level up");
            }
            stats.write_to(data);
            tracing::info!(added = amount, xp = stats.xp, level = stats.level, "xp added");
            Change::Write(stats)
        })
    }

    pub fn add_streak(&self, amount: u64) -> Result<Stats> {
        self.stats.update(|data| {
            let mut stats = Stats::from_object(data);
            stats.streak = stats.streak.saturating_add(amount);
            stats.write_to(data);
            tracing::info!(added = amount, streak = stats.streak, "streak extended");
            Change::Write(stats)
        })
    }

    pub fn reset_streak(&self) -> Result<Stats> {
        self.stats.update(|data| {
            let mut stats = Stats::from_object(data);
            stats.streak = 0;
            stats.write_to(data);
            tracing::info!("streak reset");
            Change::Write(stats)
        })
    }

    pub fn stats(&self) -> Result<Stats> {
        Ok(Stats::from_object(&self.stats.read()?))
    }

    // --------------------------------------------------------------------
    // Quests
    // --------------------------------------------------------------------

    /// Mark a quest complete and award its XP. Returns false, without touching
    /// anything, when the quest is unknown or already complete.
    pub fn complete_quest(&self, quest_id: &str) -> Result<bool> {
        let completed = self.quests.update(|data| match data.get(quest_id) {
            None => {
                tracing::warn!(quest = quest_id, "unknown quest");
                Change::Skip(false)
            }
            Some(Value::Bool(true)) => Change::Skip(false),
            Some(_) => {
                data.insert(quest_id.to_string(), Value::Bool(true));
                Change::Write(true)
            }
        })?;

        if completed {
            tracing::info!(quest = quest_id, "quest completed");
            if let Some(&reward) = self.quest_rewards.get(quest_id) {
                self.add_xp(reward)?;
            }
        }
        Ok(completed)
    }

    /// Set every known quest back to incomplete. Unknown keys are left alone.
    pub fn reset_daily_quests(&self) -> Result<()> {
        let known: Vec<String> = self.quests.defaults().keys().cloned().collect();
        self.quests.update(|data| {
            for id in known {
                data.insert(id, Value::Bool(false));
            }
            Change::Write(())
        })?;
        tracing::info!("daily quests reset");
        Ok(())
    }

    pub fn quests(&self) -> Result<BTreeMap<String, bool>> {
        Ok(self
            .quests
            .read()?
            .iter()
            .filter_map(|(k, v)| v.as_bool().map(|done| (k.clone(), done)))
            .collect())
    }

    /// XP awarded by a quest on completion, if any
    pub fn quest_reward(&self, quest_id: &str) -> Option<u64> {
        self.quest_rewards.get(quest_id).copied()
    }

    /// Start a new focus day: when `today` differs from the stored
    /// `last_focus_date`, reset the daily quests and store `today`.
    /// Returns true if a new day began.
    pub fn roll_day(&self, today: NaiveDate) -> Result<bool> {
        let today = today.format("%Y-%m-%d").to_string();
        let new_day = self.stats.update(|data| {
            let mut stats = Stats::from_object(data);
            if stats.last_focus_date == today {
                return Change::Skip(false);
            }
            stats.last_focus_date = today.clone();
            stats.write_to(data);
            Change::Write(true)
        })?;

        if new_day {
            tracing::info!(date = %today, "new focus day");
            self.reset_daily_quests()?;
        }
        Ok(new_day)
    }

    // --------------------------------------------------------------------
    // Unlocks
    // --------------------------------------------------------------------

    /// Add `name` to `category` (e.g. `skins`). Returns true if it was newly
    /// added; unknown categories and duplicates are no-ops.
    pub fn unlock_item(&self, category: &str, name: &str) -> Result<bool> {
        let added = self.unlocks.update(|data| match data.get_mut(category) {
            Some(Value::Array(items)) => {
                if items.iter().any(|v| v.as_str() == Some(name)) {
                    Change::Skip(false)
                } else {
                    items.push(Value::String(name.to_string()));
                    Change::Write(true)
                }
            }
            _ => {
                tracing::warn!(category, "unknown unlock category");
                Change::Skip(false)
            }
        })?;

        if added {
            tracing::info!(category, item = name, "item unlocked");
        }
        Ok(added)
    }

    pub fn unlocks(&self) -> Result<BTreeMap<String, Vec<String>>> {
        Ok(self
            .unlocks
            .read()?
            .iter()
            .filter_map(|(k, v)| {
                v.as_array().map(|items| {
                    let names = items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect();
                    (k.clone(), names)
                })
            })
            .collect())
    }

    /// Paths of the three ledger files
    pub fn files(&self) -> [&Path; 3] {
        [self.stats.path(), self.quests.path(), self.unlocks.path()]
    }
}
