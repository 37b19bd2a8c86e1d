use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{CandidateFilter, LikeOutcome, Store, StoreError};
use crate::models::{
    DateStatus, DateSuggestion, Match, MatchStatus, PairKey, Preferences, User, UserProfile,
    WalletAnalysis,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    preferences: HashMap<Uuid, Preferences>,
    wallet_analyses: HashMap<Uuid, WalletAnalysis>,
    matches: HashMap<Uuid, Match>,
    dates: HashMap<Uuid, DateSuggestion>,
}

impl Tables {
    fn directed_match(&self, from: Uuid, to: Uuid) -> Option<&Match> {
        self.matches
            .values()
            .find(|m| m.user1_id == from && m.user2_id == to)
    }
}

type PairLocks = StdMutex<HashMap<PairKey, Arc<Mutex<()>>>>;

/// Holds one pair's lock. Dropping it releases the lock and removes the
/// registry entry once nobody else holds or awaits it.
struct PairLock<'a> {
    locks: &'a PairLocks,
    key: PairKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PairLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

/// Process-local store backed by hash maps.
///
/// Table access goes through one short-lived mutex; `record_like`
/// additionally holds an async lock per unordered pair for its whole
/// check-then-write sequence.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pair_locks: PairLocks,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_pair(&self, key: PairKey) -> PairLock<'_> {
        let lock = {
            let mut locks = self
                .pair_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(key).or_default())
        };
        PairLock {
            locks: &self.pair_locks,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of pairs with a live lock entry.
    pub fn pair_lock_count(&self) -> usize {
        self.pair_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Number of stored match rows.
    pub async fn match_count(&self) -> usize {
        self.tables.lock().await.matches.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|u| u.solana_address == user.solana_address)
        {
            return Err(StoreError::Conflict("Wallet already registered".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn user_by_address(&self, solana_address: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.solana_address == solana_address)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        let stored = tables.users.get_mut(&user.id).ok_or(StoreError::NotFound("User"))?;
        *stored = user.clone();
        Ok(user.clone())
    }

    async fn preferences(&self, user_id: Uuid) -> Result<Option<Preferences>, StoreError> {
        Ok(self.tables.lock().await.preferences.get(&user_id).cloned())
    }

    async fn save_preferences(&self, prefs: &Preferences) -> Result<Preferences, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&prefs.user_id) {
            return Err(StoreError::NotFound("User"));
        }
        tables.preferences.insert(prefs.user_id, prefs.clone());
        Ok(prefs.clone())
    }

    async fn wallet_analysis(&self, user_id: Uuid) -> Result<Option<WalletAnalysis>, StoreError> {
        Ok(self.tables.lock().await.wallet_analyses.get(&user_id).cloned())
    }

    async fn save_wallet_analysis(&self, analysis: &WalletAnalysis) -> Result<WalletAnalysis, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&analysis.user_id) {
            return Err(StoreError::NotFound("User"));
        }
        tables.wallet_analyses.insert(analysis.user_id, analysis.clone());
        Ok(analysis.clone())
    }

    async fn candidate_profiles(&self, requester: Uuid, filter: &CandidateFilter) -> Result<Vec<UserProfile>, StoreError> {
        let tables = self.tables.lock().await;
        let mut candidates: Vec<UserProfile> = tables
            .users
            .values()
            .filter(|u| u.id != requester)
            .filter(|u| {
                !tables.matches.values().any(|m| {
                    (m.user1_id == requester && m.user2_id == u.id)
                        || (m.user2_id == requester && m.user1_id == u.id)
                })
            })
            .filter_map(|u| {
                let preferences = tables.preferences.get(&u.id)?;
                let wallet = tables.wallet_analyses.get(&u.id)?;
                Some(UserProfile {
                    user: u.clone(),
                    preferences: Some(preferences.clone()),
                    wallet_analysis: Some(wallet.clone()),
                })
            })
            .filter(|p| filter.accepts(p))
            .collect();
        candidates.sort_by_key(|p| p.user.id);
        Ok(candidates)
    }

    async fn record_like(&self, like: &Match) -> Result<LikeOutcome, StoreError> {
        let _pair = self.lock_pair(PairKey::new(like.user1_id, like.user2_id)).await;

        let mut tables = self.tables.lock().await;
        if tables.directed_match(like.user1_id, like.user2_id).is_some() {
            return Err(StoreError::Conflict("Match already exists".to_string()));
        }

        let reciprocal = tables
            .directed_match(like.user2_id, like.user1_id)
            .filter(|m| m.status == MatchStatus::Pending)
            .cloned();

        let mut created = like.clone();
        created.status = MatchStatus::Pending;

        let Some(mut reciprocal) = reciprocal else {
            tables.matches.insert(created.id, created.clone());
            return Ok(LikeOutcome::Pending(created));
        };

        let now = chrono::Utc::now();
        created.status = MatchStatus::Accepted;
        created.updated_at = now;
        reciprocal.status = MatchStatus::Accepted;
        reciprocal.updated_at = now;
        tables.matches.insert(created.id, created.clone());
        tables.matches.insert(reciprocal.id, reciprocal.clone());

        Ok(LikeOutcome::Mutual { created, reciprocal })
    }

    async fn match_by_id(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        Ok(self.tables.lock().await.matches.get(&id).cloned())
    }

    async fn matches_for_user(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError> {
        let tables = self.tables.lock().await;
        let mut matches: Vec<Match> = tables
            .matches
            .values()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn insert_date(&self, date: &DateSuggestion) -> Result<DateSuggestion, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.matches.contains_key(&date.match_id) {
            return Err(StoreError::NotFound("Match"));
        }
        tables.dates.insert(date.id, date.clone());
        Ok(date.clone())
    }

    async fn date_by_id(&self, id: Uuid) -> Result<Option<DateSuggestion>, StoreError> {
        Ok(self.tables.lock().await.dates.get(&id).cloned())
    }

    async fn transition_date(&self, date: &DateSuggestion, expected: DateStatus) -> Result<Option<DateSuggestion>, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.dates.get_mut(&date.id) {
            Some(stored) if stored.status == expected => {
                *stored = date.clone();
                Ok(Some(date.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn dates_for_match(&self, match_id: Uuid) -> Result<Vec<DateSuggestion>, StoreError> {
        let tables = self.tables.lock().await;
        let mut dates: Vec<DateSuggestion> = tables
            .dates
            .values()
            .filter(|d| d.match_id == match_id)
            .cloned()
            .collect();
        dates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(dates)
    }
}
