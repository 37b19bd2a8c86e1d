use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{Preferences, User, WalletAnalysis};

/// Preferences as stored: the age range is split over two columns and the
/// trait weights live in JSONB.
#[derive(Debug, FromRow)]
struct PreferencesRow {
    user_id: Uuid,
    age_min: Option<i32>,
    age_max: Option<i32>,
    gender_preference: Option<String>,
    max_distance: Option<i32>,
    min_sybil_score: Option<f64>,
    desired_traits: Json<BTreeMap<String, f64>>,
    avoid_traits: Vec<String>,
    chain_activity_req: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl From<PreferencesRow> for Preferences {
    fn from(row: PreferencesRow) -> Self {
        Preferences {
            user_id: row.user_id,
            age_range: row.age_min.zip(row.age_max),
            gender_preference: row.gender_preference,
            max_distance: row.max_distance,
            min_sybil_score: row.min_sybil_score,
            desired_traits: row.desired_traits.0,
            avoid_traits: row.avoid_traits,
            chain_activity_req: row.chain_activity_req,
            updated_at: row.updated_at,
        }
    }
}

// User operations
pub async fn create_user(pool: &PgPool, user: &User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, solana_address, username, mobile_auth_token, age, gender,
                           location, bio, profile_picture, verification_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.solana_address)
    .bind(&user.username)
    .bind(&user.mobile_auth_token)
    .bind(user.age)
    .bind(&user.gender)
    .bind(&user.location)
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(user.verification_status)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_solana_address(pool: &PgPool, solana_address: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE solana_address = $1")
        .bind(solana_address)
        .fetch_optional(pool)
        .await
}

/// Writes every mutable column of `user`. Returns `None` if the row is gone.
pub async fn update_user(pool: &PgPool, user: &User) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET username = $2, mobile_auth_token = $3, age = $4, gender = $5, location = $6,
            bio = $7, profile_picture = $8, verification_status = $9, updated_at = $10
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.mobile_auth_token)
    .bind(user.age)
    .bind(&user.gender)
    .bind(&user.location)
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(user.verification_status)
    .bind(user.updated_at)
    .fetch_optional(pool)
    .await
}

// Preferences operations
pub async fn get_preferences(pool: &PgPool, user_id: Uuid) -> Result<Option<Preferences>, sqlx::Error> {
    let row = sqlx::query_as::<_, PreferencesRow>("SELECT * FROM preferences WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Preferences::from))
}

pub async fn get_preferences_for_users(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<Preferences>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PreferencesRow>("SELECT * FROM preferences WHERE user_id = ANY($1)")
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Preferences::from).collect())
}

pub async fn upsert_preferences(pool: &PgPool, prefs: &Preferences) -> Result<Preferences, sqlx::Error> {
    let row = sqlx::query_as::<_, PreferencesRow>(
        r#"
        INSERT INTO preferences (user_id, age_min, age_max, gender_preference, max_distance,
                                 min_sybil_score, desired_traits, avoid_traits, chain_activity_req, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO UPDATE SET
            age_min = EXCLUDED.age_min,
            age_max = EXCLUDED.age_max,
            gender_preference = EXCLUDED.gender_preference,
            max_distance = EXCLUDED.max_distance,
            min_sybil_score = EXCLUDED.min_sybil_score,
            desired_traits = EXCLUDED.desired_traits,
            avoid_traits = EXCLUDED.avoid_traits,
            chain_activity_req = EXCLUDED.chain_activity_req,
            updated_at = EXCLUDED.updated_at
        RETURNING *
        "#,
    )
    .bind(prefs.user_id)
    .bind(prefs.age_range.map(|(min, _)| min))
    .bind(prefs.age_range.map(|(_, max)| max))
    .bind(&prefs.gender_preference)
    .bind(prefs.max_distance)
    .bind(prefs.min_sybil_score)
    .bind(Json(&prefs.desired_traits))
    .bind(&prefs.avoid_traits)
    .bind(&prefs.chain_activity_req)
    .bind(prefs.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

// Wallet analysis operations
pub async fn get_wallet_analysis(pool: &PgPool, user_id: Uuid) -> Result<Option<WalletAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, WalletAnalysis>("SELECT * FROM wallet_analyses WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_wallet_analyses_for_users(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> Result<Vec<WalletAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, WalletAnalysis>("SELECT * FROM wallet_analyses WHERE user_id = ANY($1)")
        .bind(user_ids)
        .fetch_all(pool)
        .await
}

pub async fn upsert_wallet_analysis(pool: &PgPool, analysis: &WalletAnalysis) -> Result<WalletAnalysis, sqlx::Error> {
    sqlx::query_as::<_, WalletAnalysis>(
        r#"
        INSERT INTO wallet_analyses (user_id, nft_count, tx_frequency, sybil_score, top_collections,
                                     cultural_alignment, defi_activity, airdrops_received, rug_count,
                                     wallet_age, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id) DO UPDATE SET
            nft_count = EXCLUDED.nft_count,
            tx_frequency = EXCLUDED.tx_frequency,
            sybil_score = EXCLUDED.sybil_score,
            top_collections = EXCLUDED.top_collections,
            cultural_alignment = EXCLUDED.cultural_alignment,
            defi_activity = EXCLUDED.defi_activity,
            airdrops_received = EXCLUDED.airdrops_received,
            rug_count = EXCLUDED.rug_count,
            wallet_age = EXCLUDED.wallet_age,
            updated_at = EXCLUDED.updated_at
        RETURNING *
        "#,
    )
    .bind(analysis.user_id)
    .bind(analysis.nft_count)
    .bind(analysis.tx_frequency)
    .bind(analysis.sybil_score)
    .bind(&analysis.top_collections)
    .bind(&analysis.cultural_alignment)
    .bind(&analysis.defi_activity)
    .bind(&analysis.airdrops_received)
    .bind(analysis.rug_count)
    .bind(analysis.wallet_age)
    .bind(analysis.updated_at)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(age_min: Option<i32>, age_max: Option<i32>) -> PreferencesRow {
        PreferencesRow {
            user_id: Uuid::new_v4(),
            age_min,
            age_max,
            gender_preference: Some("any".to_string()),
            max_distance: Some(50),
            min_sybil_score: None,
            desired_traits: Json(BTreeMap::from([("defi".to_string(), 0.8)])),
            avoid_traits: vec!["rugger".to_string()],
            chain_activity_req: serde_json::json!({}),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_preferences_row_joins_age_range() {
        let prefs = Preferences::from(row(Some(25), Some(35)));
        assert_eq!(prefs.age_range, Some((25, 35)));
        assert_eq!(prefs.desired_traits.get("defi"), Some(&0.8));
        assert_eq!(prefs.avoid_traits, vec!["rugger"]);

        assert_eq!(Preferences::from(row(None, None)).age_range, None);
    }
}
