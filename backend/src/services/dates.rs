use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::onchain::{EscrowRelease, OnchainError, OnchainServices, ProofKind, ProofRequest};
use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{DateStatus, DateSuggestion, LocationType, Match, MatchStatus, User};
use crate::store::Store;
use crate::utils::validation::Validator;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestDateRequest {
    pub match_id: Uuid,
    pub location_type: LocationType,
    pub custom_details: Option<String>,
    pub proposed_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub venue_coordinates: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDateRequest {
    pub confirmed_time: Option<DateTime<Utc>>,
    pub confirmed_location: Option<String>,
    pub additional_details: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDateRequest {
    pub coordinates: Vec<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateProposal {
    pub date_id: Uuid,
    pub proposal_status: &'static str,
    pub date_nft_preview: String,
    pub title: String,
    pub description: String,
    pub location_type: LocationType,
    pub suggested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateConfirmation {
    pub tx_signature: String,
    pub nft_address: String,
    pub calendar_event: String,
    pub escrow_address: String,
    pub confirmed_time: Option<DateTime<Utc>>,
    pub confirmed_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCompletion {
    pub verification_status: DateStatus,
    pub poap_mint_address: String,
    pub released_funds: EscrowRelease,
    pub completion_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDetails {
    pub id: Uuid,
    pub match_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub venue_coordinates: Option<(f64, f64)>,
    pub time: Option<DateTime<Utc>>,
    pub status: DateStatus,
    pub suggested_by: Option<String>,
    pub participants: Vec<String>,
}

/// Great-circle distance in meters between two `(lat, lng)` points.
pub fn haversine_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Validates a `[lat, lng]` pair, recording errors against `field`.
fn coordinates(v: &mut Validator, raw: &[f64], field: &str) -> Option<(f64, f64)> {
    let [lat, lng] = raw else {
        v.push(field, "Coordinates must be [lat, lng]");
        return None;
    };
    let point = (*lat, *lng);
    v.check((-90.0..=90.0).contains(lat), field, "Invalid latitude");
    v.check((-180.0..=180.0).contains(lng), field, "Invalid longitude");
    Some(point)
}

fn notify(user_id: Uuid, title: &str, body: &str) {
    tracing::info!(target: "dinetime::notifications", "Notification to {}: {} - {}", user_id, title, body);
}

async fn username(store: &dyn Store, user_id: Uuid) -> AppResult<String> {
    Ok(store
        .user_by_id(user_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default())
}

/// Restores `original` after its chain effects failed, as long as the stored
/// date is still in the `applied` status.
async fn roll_back(store: &dyn Store, original: &DateSuggestion, applied: DateStatus, cause: OnchainError) -> AppError {
    tracing::warn!("Chain effects for date {} failed, reverting to {:?}: {}", original.id, original.status, cause);
    match store.transition_date(original, applied).await {
        Ok(Some(_)) => {}
        Ok(None) => tracing::error!("Date {} moved on before it could be reverted", original.id),
        Err(e) => tracing::error!("Failed to revert date {}: {}", original.id, e),
    }
    cause.into()
}

/// Loads `date_id` together with its match when `status` matches.
async fn date_in_status(store: &dyn Store, date_id: Uuid, status: DateStatus, missing: &str) -> AppResult<(DateSuggestion, Match)> {
    let date = store
        .date_by_id(date_id)
        .await?
        .filter(|d| d.status == status)
        .ok_or_else(|| AppError::NotFound(missing.to_string()))?;
    let matched = store
        .match_by_id(date.match_id)
        .await?
        .ok_or_else(|| AppError::NotFound(missing.to_string()))?;
    Ok((date, matched))
}

pub async fn suggest_date(
    store: &dyn Store,
    onchain: &dyn OnchainServices,
    caller: &User,
    request: SuggestDateRequest,
) -> AppResult<DateProposal> {
    let mut v = Validator::new();
    let venue = request
        .venue_coordinates
        .as_deref()
        .and_then(|raw| coordinates(&mut v, raw, "venueCoordinates"));
    v.finish()?;

    let matched = store
        .match_by_id(request.match_id)
        .await?
        .filter(|m| m.involves(caller.id) && m.status == MatchStatus::Accepted)
        .ok_or_else(|| AppError::NotFound("Match not found or not accepted".to_string()))?;

    let custom_details = request.custom_details.filter(|d| !d.trim().is_empty());
    let title = request.location_type.title(custom_details.as_deref());
    let phrase = request.location_type.phrase();
    let now = Utc::now();

    // Minted before the insert; a failed mint stores nothing
    let date_id = Uuid::new_v4();
    let preview = onchain
        .mint_proof(&ProofRequest {
            kind: ProofKind::DatePreview,
            subject_id: date_id,
            title: format!("Date NFT - {}", title),
            participants: vec![caller.username.clone()],
        })
        .await?;

    let date = DateSuggestion {
        id: date_id,
        match_id: matched.id,
        suggested_by_id: caller.id,
        title: title.clone(),
        description: custom_details.unwrap_or_else(|| format!("A {} date", phrase)),
        location: request
            .location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "To be determined".to_string()),
        venue_coordinates: venue,
        time: request.proposed_time,
        status: DateStatus::Proposed,
        created_at: now,
        updated_at: now,
    };
    let date = store.insert_date(&date).await?;

    notify(
        matched.other_participant(caller.id),
        "New Date Suggestion",
        &format!("{} suggested a {} date!", caller.username, phrase),
    );
    tracing::info!("Date {} proposed on match {} by {}", date.id, matched.id, caller.id);

    Ok(DateProposal {
        date_id: date.id,
        proposal_status: "PENDING",
        date_nft_preview: preview.metadata_uri,
        title,
        description: date.description,
        location_type: request.location_type,
        suggested_by: caller.username.clone(),
    })
}

pub async fn confirm_date(
    store: &dyn Store,
    onchain: &dyn OnchainServices,
    caller: &User,
    date_id: Uuid,
    request: ConfirmDateRequest,
) -> AppResult<DateConfirmation> {
    const MISSING: &str = "Date suggestion not found or already confirmed";

    let (date, matched) = date_in_status(store, date_id, DateStatus::Proposed, MISSING).await?;
    if !matched.involves(caller.id) {
        return Err(AppError::Forbidden("Not authorized to confirm this date".to_string()));
    }

    let mut confirmed = date.clone();
    confirmed.status = DateStatus::Confirmed;
    confirmed.time = request.confirmed_time.or(date.time);
    if let Some(location) = request.confirmed_location.filter(|l| !l.trim().is_empty()) {
        confirmed.location = location;
    }
    if let Some(details) = request.additional_details.filter(|d| !d.trim().is_empty()) {
        confirmed.description = format!("{}\n\n{}", date.description, details);
    }
    confirmed.updated_at = Utc::now();

    let name1 = username(store, matched.user1_id).await?;
    let name2 = username(store, matched.user2_id).await?;

    let confirmed = store
        .transition_date(&confirmed, DateStatus::Proposed)
        .await?
        .ok_or_else(|| AppError::NotFound(MISSING.to_string()))?;

    // Escrow is locked last
    let effects = async {
        let proof = onchain
            .mint_proof(&ProofRequest {
                kind: ProofKind::ConfirmedDate,
                subject_id: date.id,
                title: format!("Confirmed Date - {}", confirmed.title),
                participants: vec![name1.clone(), name2.clone()],
            })
            .await?;
        let escrow = onchain.lock_escrow(date.id, DATE_ESCROW_AMOUNT_SOL).await?;
        Ok::<_, OnchainError>((proof, escrow))
    };
    let (proof, escrow) = match effects.await {
        Ok(refs) => refs,
        Err(e) => return Err(roll_back(store, &date, DateStatus::Confirmed, e).await),
    };

    notify(matched.user1_id, "Date Confirmed!", &format!("Your date with {} has been confirmed!", name2));
    notify(matched.user2_id, "Date Confirmed!", &format!("Your date with {} has been confirmed!", name1));
    tracing::info!("Date {} confirmed by {}", date.id, caller.id);

    Ok(DateConfirmation {
        tx_signature: proof.tx_signature,
        nft_address: proof.address,
        calendar_event: format!("{}/{}", CALENDAR_EVENT_BASE_URL, date.id),
        escrow_address: escrow.address,
        confirmed_time: confirmed.time,
        confirmed_location: confirmed.location,
    })
}

pub async fn verify_date(
    store: &dyn Store,
    onchain: &dyn OnchainServices,
    caller: &User,
    date_id: Uuid,
    request: VerifyDateRequest,
) -> AppResult<DateCompletion> {
    const MISSING: &str = "Confirmed date not found";

    let mut v = Validator::new();
    let position = coordinates(&mut v, &request.coordinates, "coordinates");
    v.finish()?;
    let Some(position) = position else {
        return Err(AppError::BadRequest("Coordinates must be [lat, lng]".to_string()));
    };

    let (date, matched) = date_in_status(store, date_id, DateStatus::Confirmed, MISSING).await?;
    if !matched.involves(caller.id) {
        return Err(AppError::Forbidden("Not authorized to verify this date".to_string()));
    }

    let scheduled = date
        .time
        .ok_or_else(|| AppError::BadRequest("Date has no scheduled time".to_string()))?;
    if (request.timestamp - scheduled).abs() > Duration::minutes(DATE_VERIFICATION_WINDOW_MINUTES) {
        return Err(AppError::BadRequest(
            "Verification timestamp too far from scheduled time".to_string(),
        ));
    }

    if let Some(venue) = date.venue_coordinates {
        let distance = haversine_meters(position, venue);
        if distance > DATE_VERIFICATION_RADIUS_METERS {
            tracing::debug!("Date {} verification {:.0}m from venue", date.id, distance);
            return Err(AppError::BadRequest("Location verification failed".to_string()));
        }
    }

    let name1 = username(store, matched.user1_id).await?;
    let name2 = username(store, matched.user2_id).await?;

    let mut completed = date.clone();
    completed.status = DateStatus::Completed;
    completed.updated_at = Utc::now();
    store
        .transition_date(&completed, DateStatus::Confirmed)
        .await?
        .ok_or_else(|| AppError::NotFound(MISSING.to_string()))?;

    // Only the caller that won the transition reaches the escrow
    let effects = async {
        let badge = onchain
            .mint_proof(&ProofRequest {
                kind: ProofKind::Completion,
                subject_id: date.id,
                title: "Date Completion POAP".to_string(),
                participants: vec![name1.clone(), name2.clone()],
            })
            .await?;
        let released = onchain.release_escrow(date.id, DATE_ESCROW_AMOUNT_SOL).await?;
        Ok::<_, OnchainError>((badge, released))
    };
    let (badge, released) = match effects.await {
        Ok(refs) => refs,
        Err(e) => return Err(roll_back(store, &date, DateStatus::Completed, e).await),
    };

    let body = |other: &str| format!("Your date with {} has been verified and completed!", other);
    notify(matched.user1_id, "Date Completed!", &body(&name2));
    notify(matched.user2_id, "Date Completed!", &body(&name1));
    tracing::info!("Date {} completed, verified by {}", date.id, caller.id);

    Ok(DateCompletion {
        verification_status: DateStatus::Completed,
        poap_mint_address: badge.address,
        released_funds: released,
        completion_time: request.timestamp,
    })
}

pub async fn get_date(store: &dyn Store, caller: &User, date_id: Uuid) -> AppResult<DateDetails> {
    let date = store
        .date_by_id(date_id)
        .await?
        .ok_or_else(|| AppError::not_found("Date"))?;
    let matched = store
        .match_by_id(date.match_id)
        .await?
        .filter(|m| m.involves(caller.id))
        .ok_or_else(|| AppError::not_found("Date"))?;

    let suggested_by = store.user_by_id(date.suggested_by_id).await?.map(|u| u.username);
    let participants = vec![
        username(store, matched.user1_id).await?,
        username(store, matched.user2_id).await?,
    ];

    Ok(DateDetails {
        id: date.id,
        match_id: date.match_id,
        title: date.title,
        description: date.description,
        location: date.location,
        venue_coordinates: date.venue_coordinates,
        time: date.time,
        status: date.status,
        suggested_by,
        participants,
    })
}

pub async fn dates_for_match(store: &dyn Store, caller: &User, match_id: Uuid) -> AppResult<Vec<DateSuggestion>> {
    store
        .match_by_id(match_id)
        .await?
        .filter(|m| m.involves(caller.id))
        .ok_or_else(|| AppError::not_found("Match"))?;
    Ok(store.dates_for_match(match_id).await?)
}
