use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{dates, matches, users};
use crate::models::{DateStatus, DateSuggestion, Match, Preferences, User, UserProfile, WalletAnalysis};
use crate::store::{CandidateFilter, LikeOutcome, Store, StoreError};

/// [`Store`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        users::create_user(&self.pool, user).await.map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                StoreError::Conflict("Wallet already registered".to_string())
            } else {
                e.into()
            }
        })
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(users::get_user_by_id(&self.pool, id).await?)
    }

    async fn user_by_address(&self, solana_address: &str) -> Result<Option<User>, StoreError> {
        Ok(users::get_user_by_solana_address(&self.pool, solana_address).await?)
    }

    async fn update_user(&self, user: &User) -> Result<User, StoreError> {
        users::update_user(&self.pool, user)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn preferences(&self, user_id: Uuid) -> Result<Option<Preferences>, StoreError> {
        Ok(users::get_preferences(&self.pool, user_id).await?)
    }

    async fn save_preferences(&self, prefs: &Preferences) -> Result<Preferences, StoreError> {
        Ok(users::upsert_preferences(&self.pool, prefs).await?)
    }

    async fn wallet_analysis(&self, user_id: Uuid) -> Result<Option<WalletAnalysis>, StoreError> {
        Ok(users::get_wallet_analysis(&self.pool, user_id).await?)
    }

    async fn save_wallet_analysis(&self, analysis: &WalletAnalysis) -> Result<WalletAnalysis, StoreError> {
        Ok(users::upsert_wallet_analysis(&self.pool, analysis).await?)
    }

    async fn candidate_profiles(&self, requester: Uuid, filter: &CandidateFilter) -> Result<Vec<UserProfile>, StoreError> {
        Ok(matches::get_candidate_profiles(&self.pool, requester, filter).await?)
    }

    async fn record_like(&self, like: &Match) -> Result<LikeOutcome, StoreError> {
        matches::record_like(&self.pool, like).await
    }

    async fn match_by_id(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        Ok(matches::get_match_by_id(&self.pool, id).await?)
    }

    async fn matches_for_user(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError> {
        Ok(matches::get_matches_for_user(&self.pool, user_id).await?)
    }

    async fn insert_date(&self, date: &DateSuggestion) -> Result<DateSuggestion, StoreError> {
        Ok(dates::create_date_suggestion(&self.pool, date).await?)
    }

    async fn date_by_id(&self, id: Uuid) -> Result<Option<DateSuggestion>, StoreError> {
        Ok(dates::get_date_suggestion(&self.pool, id).await?)
    }

    async fn transition_date(&self, date: &DateSuggestion, expected: DateStatus) -> Result<Option<DateSuggestion>, StoreError> {
        Ok(dates::transition_date_suggestion(&self.pool, date, expected).await?)
    }

    async fn dates_for_match(&self, match_id: Uuid) -> Result<Vec<DateSuggestion>, StoreError> {
        Ok(dates::get_dates_for_match(&self.pool, match_id).await?)
    }
}
