//! One-time redeem codes.
//!
//! Codes are matched case-insensitively against a compiled-in table. Once a
//! code is redeemed its lower-cased form goes into a persisted set and can never
//! pay out again on this storage origin. The set is written before the reward
//! is applied: if it cannot be written, nothing is paid.

use std::collections::BTreeSet;

use crate::error::{RedeemError, StorageError};
use crate::progression::Progression;
use crate::storage::{self, KeyValueStore, KEY_REDEEMED};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reward {
    Xp { amount: u64 },
    /// Raise the level to at least `level`.
    LevelFloor { level: u32 },
}

#[derive(Clone, Copy, Debug)]
pub struct CodeDefinition {
    pub code: &'static str,
    pub reward: Reward,
}

pub static CODE_TABLE: &[CodeDefinition] = &[
    CodeDefinition { code: "JustAl3xHere", reward: Reward::Xp { amount: 500 } },
    CodeDefinition { code: "ZenoMozHub", reward: Reward::LevelFloor { level: 5 } },
];

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedeemSuccess {
    pub code: String,
    pub reward: Reward,
    /// Message shown on the page.
    pub description: String,
}

pub struct RedeemLedger<S: KeyValueStore> {
    table: &'static [CodeDefinition],
    redeemed: BTreeSet<String>,
    store: S,
}

impl<S: KeyValueStore> RedeemLedger<S> {
    pub fn load(store: S) -> Self {
        Self::with_table(store, CODE_TABLE)
    }

    pub fn with_table(store: S, table: &'static [CodeDefinition]) -> Self {
        let redeemed = storage::read_or_none(&store, KEY_REDEEMED)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default()
            .iter()
            .map(|c| normalize_code(c))
            .collect();
        Self { table, redeemed, store }
    }

    pub fn is_redeemed(&self, code: &str) -> bool {
        self.redeemed.contains(&normalize_code(code))
    }

    pub fn redeemed(&self) -> impl Iterator<Item = &str> {
        self.redeemed.iter().map(String::as_str)
    }

    fn lookup(&self, normalized: &str) -> Option<&CodeDefinition> {
        self.table
            .iter()
            .find(|d| d.code.to_lowercase() == normalized)
    }

    pub fn redeem<P: KeyValueStore>(
        &mut self,
        raw: &str,
        progress: &mut Progression<P>,
    ) -> Result<RedeemSuccess, RedeemError> {
        let code = normalize_code(raw);
        let def = *self.lookup(&code).ok_or(RedeemError::CodeNotFound)?;
        if self.redeemed.contains(&code) {
            return Err(RedeemError::AlreadyRedeemed);
        }

        self.redeemed.insert(code.clone());
        if let Err(e) = self.persist() {
            self.redeemed.remove(&code);
            tracing::warn!("redeem of '{code}' not saved: {e}");
            return Err(RedeemError::NotSaved);
        }

        let description = match def.reward {
            Reward::Xp { amount } => {
                let gained = progress.add_experience(amount.min(i64::MAX as u64) as i64);
                if gained > 0 {
                    format!("+{amount} XP (level up to {}!)", progress.state().level)
                } else {
                    format!("+{amount} XP")
                }
            }
            Reward::LevelFloor { level } => {
                if progress.raise_level_floor(level) {
                    format!("Level boosted to {}", progress.state().level)
                } else {
                    format!("Already at level {level} or higher")
                }
            }
        };

        tracing::info!("redeemed code '{code}'");
        Ok(RedeemSuccess { code, reward: def.reward, description })
    }

    fn persist(&self) -> Result<(), StorageError> {
        let list: Vec<&str> = self.redeemed().collect();
        let raw = serde_json::to_string(&list).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.set(KEY_REDEEMED, &raw)
    }
}
