use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "date_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateStatus {
    Proposed,
    Confirmed,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    NftGallery,
    CryptoCafe,
    BlockchainEvent,
    DefiMeetup,
    Custom,
}

impl LocationType {
    /// Title shown for a date of this kind. Custom dates use the caller's text.
    pub fn title(&self, custom_details: Option<&str>) -> String {
        match self {
            LocationType::NftGallery => "NFT Gallery Meetup".to_string(),
            LocationType::CryptoCafe => "Crypto Cafe Date".to_string(),
            LocationType::BlockchainEvent => "Blockchain Event Together".to_string(),
            LocationType::DefiMeetup => "DeFi Meetup Date".to_string(),
            LocationType::Custom => custom_details
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("Custom Date")
                .to_string(),
        }
    }

    /// Lower-case phrase such as "crypto cafe".
    pub fn phrase(&self) -> &'static str {
        match self {
            LocationType::NftGallery => "nft gallery",
            LocationType::CryptoCafe => "crypto cafe",
            LocationType::BlockchainEvent => "blockchain event",
            LocationType::DefiMeetup => "defi meetup",
            LocationType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSuggestion {
    pub id: Uuid,
    pub match_id: Uuid,
    pub suggested_by_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    /// `[lat, lng]` of the venue when known
    pub venue_coordinates: Option<(f64, f64)>,
    pub time: Option<DateTime<Utc>>,
    pub status: DateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
