use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::users::{get_preferences_for_users, get_wallet_analyses_for_users};
use crate::models::{Match, MatchStatus, PairKey, User, UserProfile};
use crate::store::{CandidateFilter, LikeOutcome, StoreError};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

pub async fn get_match_by_id(pool: &PgPool, match_id: Uuid) -> Result<Option<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1")
        .bind(match_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_matches_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>(
        r#"
        SELECT *
        FROM matches
        WHERE user1_id = $1 OR user2_id = $1
        ORDER BY created_at DESC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_candidate_profiles(
    pool: &PgPool,
    requester: Uuid,
    filter: &CandidateFilter,
) -> Result<Vec<UserProfile>, sqlx::Error> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.*
        FROM users u
        JOIN preferences p ON p.user_id = u.id
        JOIN wallet_analyses w ON w.user_id = u.id
        WHERE u.id <> $1
        AND NOT EXISTS (
            SELECT 1 FROM matches m
            WHERE (m.user1_id = $1 AND m.user2_id = u.id)
               OR (m.user2_id = $1 AND m.user1_id = u.id)
        )
        AND ($2::INT IS NULL OR u.age >= $2)
        AND ($3::INT IS NULL OR u.age <= $3)
        AND ($4::TEXT IS NULL OR u.gender = $4)
        AND ($5::FLOAT8 IS NULL OR w.sybil_score >= $5)
        ORDER BY u.id ASC
        "#,
    )
    .bind(requester)
    .bind(filter.age_range.map(|(min, _)| min))
    .bind(filter.age_range.map(|(_, max)| max))
    .bind(&filter.gender)
    .bind(filter.min_sybil_score)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let mut preferences: HashMap<Uuid, _> = get_preferences_for_users(pool, &ids)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();
    let mut wallets: HashMap<Uuid, _> = get_wallet_analyses_for_users(pool, &ids)
        .await?
        .into_iter()
        .map(|w| (w.user_id, w))
        .collect();

    Ok(users
        .into_iter()
        .map(|user| UserProfile {
            preferences: preferences.remove(&user.id),
            wallet_analysis: wallets.remove(&user.id),
            user,
        })
        .collect())
}

async fn find_directed_match(conn: &mut PgConnection, from: Uuid, to: Uuid) -> Result<Option<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE user1_id = $1 AND user2_id = $2")
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *conn)
        .await
}

/// Records a like inside one transaction holding an advisory lock derived
/// from the unordered pair, so concurrent likes between the same two users
/// run one after the other.
pub async fn record_like(pool: &PgPool, like: &Match) -> Result<LikeOutcome, StoreError> {
    let pair = PairKey::new(like.user1_id, like.user2_id);
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(pair.lock_name())
        .execute(&mut *tx)
        .await?;

    if find_directed_match(&mut tx, like.user1_id, like.user2_id).await?.is_some() {
        return Err(StoreError::Conflict("Match already exists".to_string()));
    }

    let reciprocal = find_directed_match(&mut tx, like.user2_id, like.user1_id)
        .await?
        .filter(|m| m.status == MatchStatus::Pending);

    let inserted = sqlx::query_as::<_, Match>(
        r#"
        INSERT INTO matches (id, user1_id, user2_id, compatibility_score, match_reasons, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(like.id)
    .bind(like.user1_id)
    .bind(like.user2_id)
    .bind(like.compatibility_score)
    .bind(&like.match_reasons)
    .bind(MatchStatus::Pending)
    .bind(like.created_at)
    .bind(like.updated_at)
    .fetch_one(&mut *tx)
    .await;

    let created = match inserted {
        Ok(created) => created,
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Concurrent duplicate like detected for pair {}", pair.lock_name());
            return Err(StoreError::Conflict("Match already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(reciprocal) = reciprocal else {
        tx.commit().await?;
        return Ok(LikeOutcome::Pending(created));
    };

    let mut accepted = sqlx::query_as::<_, Match>(
        r#"
        UPDATE matches
        SET status = $1, updated_at = NOW()
        WHERE id = ANY($2)
        RETURNING *
        "#,
    )
    .bind(MatchStatus::Accepted)
    .bind(vec![created.id, reciprocal.id])
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let reciprocal_pos = accepted
        .iter()
        .position(|m| m.id == reciprocal.id)
        .ok_or(StoreError::NotFound("Reciprocal match"))?;
    let reciprocal = accepted.swap_remove(reciprocal_pos);
    let created = accepted.pop().ok_or(StoreError::NotFound("Created match"))?;

    Ok(LikeOutcome::Mutual { created, reciprocal })
}
