use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{DateStatus, DateSuggestion};

/// Date suggestion as stored, with the venue split into two columns.
#[derive(Debug, FromRow)]
struct DateRow {
    id: Uuid,
    match_id: Uuid,
    suggested_by_id: Uuid,
    title: String,
    description: String,
    location: String,
    venue_latitude: Option<f64>,
    venue_longitude: Option<f64>,
    time: Option<DateTime<Utc>>,
    status: DateStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DateRow> for DateSuggestion {
    fn from(row: DateRow) -> Self {
        DateSuggestion {
            id: row.id,
            match_id: row.match_id,
            suggested_by_id: row.suggested_by_id,
            title: row.title,
            description: row.description,
            location: row.location,
            venue_coordinates: row.venue_latitude.zip(row.venue_longitude),
            time: row.time,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn create_date_suggestion(pool: &PgPool, date: &DateSuggestion) -> Result<DateSuggestion, sqlx::Error> {
    let row = sqlx::query_as::<_, DateRow>(
        r#"
        INSERT INTO date_suggestions (id, match_id, suggested_by_id, title, description, location,
                                      venue_latitude, venue_longitude, time, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(date.id)
    .bind(date.match_id)
    .bind(date.suggested_by_id)
    .bind(&date.title)
    .bind(&date.description)
    .bind(&date.location)
    .bind(date.venue_coordinates.map(|(lat, _)| lat))
    .bind(date.venue_coordinates.map(|(_, lng)| lng))
    .bind(date.time)
    .bind(date.status)
    .bind(date.created_at)
    .bind(date.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn get_date_suggestion(pool: &PgPool, date_id: Uuid) -> Result<Option<DateSuggestion>, sqlx::Error> {
    let row = sqlx::query_as::<_, DateRow>("SELECT * FROM date_suggestions WHERE id = $1")
        .bind(date_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(DateSuggestion::from))
}

/// Compare-and-set update: only applies while the stored status equals `expected`.
pub async fn transition_date_suggestion(
    pool: &PgPool,
    date: &DateSuggestion,
    expected: DateStatus,
) -> Result<Option<DateSuggestion>, sqlx::Error> {
    let row = sqlx::query_as::<_, DateRow>(
        r#"
        UPDATE date_suggestions
        SET description = $2, location = $3, time = $4, status = $5, updated_at = $6
        WHERE id = $1 AND status = $7
        RETURNING *
        "#,
    )
    .bind(date.id)
    .bind(&date.description)
    .bind(&date.location)
    .bind(date.time)
    .bind(date.status)
    .bind(date.updated_at)
    .bind(expected)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(DateSuggestion::from))
}

pub async fn get_dates_for_match(pool: &PgPool, match_id: Uuid) -> Result<Vec<DateSuggestion>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DateRow>(
        r#"
        SELECT *
        FROM date_suggestions
        WHERE match_id = $1
        ORDER BY created_at DESC, id ASC
        "#,
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(DateSuggestion::from).collect())
}
