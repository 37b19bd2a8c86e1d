//! Persistence capability used by the services.
//!
//! Production runs on [`crate::db::PgStore`]; tests and local tooling use
//! [`MemoryStore`]. Both must give `record_like` the same guarantees: the
//! existence checks and writes for one user pair never interleave with
//! another `record_like` for the same pair.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::constants::ANY_GENDER;
use crate::models::{
    DateStatus, DateSuggestion, Match, Preferences, User, UserProfile, WalletAnalysis,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of recording a like.
#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    /// The like was stored and waits for the other user.
    Pending(Match),
    /// The other user had already liked back; both rows are now ACCEPTED.
    Mutual { created: Match, reciprocal: Match },
}

impl LikeOutcome {
    pub fn created(&self) -> &Match {
        match self {
            LikeOutcome::Pending(created) => created,
            LikeOutcome::Mutual { created, .. } => created,
        }
    }
}

/// Hard filters applied to suggestion candidates before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub age_range: Option<(i32, i32)>,
    pub gender: Option<String>,
    pub min_sybil_score: Option<f64>,
}

impl CandidateFilter {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            age_range: prefs.age_range,
            gender: prefs
                .gender_preference
                .clone()
                .filter(|g| g != ANY_GENDER),
            min_sybil_score: prefs.min_sybil_score,
        }
    }

    /// Whether `candidate` passes every configured filter. Unknown candidate
    /// values fail a filter that is set.
    pub fn accepts(&self, candidate: &UserProfile) -> bool {
        if let Some((min, max)) = self.age_range {
            match candidate.user.age {
                Some(age) if age >= min && age <= max => {}
                _ => return false,
            }
        }
        if let Some(gender) = &self.gender {
            if candidate.user.gender.as_deref() != Some(gender.as_str()) {
                return false;
            }
        }
        if let Some(min_sybil) = self.min_sybil_score {
            let sybil = candidate.wallet_analysis.as_ref().and_then(|w| w.sybil_score);
            match sybil {
                Some(score) if score >= min_sybil => {}
                _ => return false,
            }
        }
        true
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    // Users
    async fn insert_user(&self, user: &User) -> Result<User, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_address(&self, solana_address: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, user: &User) -> Result<User, StoreError>;

    async fn preferences(&self, user_id: Uuid) -> Result<Option<Preferences>, StoreError>;
    async fn save_preferences(&self, prefs: &Preferences) -> Result<Preferences, StoreError>;

    async fn wallet_analysis(&self, user_id: Uuid) -> Result<Option<WalletAnalysis>, StoreError>;
    async fn save_wallet_analysis(&self, analysis: &WalletAnalysis) -> Result<WalletAnalysis, StoreError>;

    async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let Some(user) = self.user_by_id(user_id).await? else {
            return Ok(None);
        };
        Ok(Some(UserProfile {
            preferences: self.preferences(user_id).await?,
            wallet_analysis: self.wallet_analysis(user_id).await?,
            user,
        }))
    }

    // Matches

    /// Profiles of users other than `requester` that have preferences and a
    /// wallet analysis, share no match row with `requester` in either
    /// direction, and pass `filter`. Ordered by user id.
    async fn candidate_profiles(&self, requester: Uuid, filter: &CandidateFilter) -> Result<Vec<UserProfile>, StoreError>;

    /// Stores `like` (a PENDING row from `user1_id` to `user2_id`) unless that
    /// directed row already exists, and accepts both rows when the reverse
    /// like is pending. Serialized per unordered pair.
    async fn record_like(&self, like: &Match) -> Result<LikeOutcome, StoreError>;

    async fn match_by_id(&self, id: Uuid) -> Result<Option<Match>, StoreError>;

    /// Every match row involving `user_id`, newest first.
    async fn matches_for_user(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError>;

    // Dates
    async fn insert_date(&self, date: &DateSuggestion) -> Result<DateSuggestion, StoreError>;
    async fn date_by_id(&self, id: Uuid) -> Result<Option<DateSuggestion>, StoreError>;

    /// Overwrites the stored date with `date` only while its status is still
    /// `expected`. Returns `None` when the stored status differs.
    async fn transition_date(&self, date: &DateSuggestion, expected: DateStatus) -> Result<Option<DateSuggestion>, StoreError>;

    /// Dates of a match, newest first.
    async fn dates_for_match(&self, match_id: Uuid) -> Result<Vec<DateSuggestion>, StoreError>;
}
