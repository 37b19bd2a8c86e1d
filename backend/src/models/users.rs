use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Unverified,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub solana_address: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub mobile_auth_token: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub user_id: Uuid,
    /// Inclusive `(min, max)` age bounds
    pub age_range: Option<(i32, i32)>,
    pub gender_preference: Option<String>,
    pub max_distance: Option<i32>,
    pub min_sybil_score: Option<f64>,
    pub desired_traits: BTreeMap<String, f64>,
    pub avoid_traits: Vec<String>,
    pub chain_activity_req: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl Preferences {
    /// Empty preferences for `user_id`; every criterion unset.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            age_range: None,
            gender_preference: None,
            max_distance: None,
            min_sybil_score: None,
            desired_traits: BTreeMap::new(),
            avoid_traits: Vec::new(),
            chain_activity_req: serde_json::Value::Object(Default::default()),
            updated_at: Utc::now(),
        }
    }
}

/// Metrics derived from a user's on-chain activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WalletAnalysis {
    pub user_id: Uuid,
    pub nft_count: i32,
    pub tx_frequency: f64,
    pub sybil_score: Option<f64>,
    pub top_collections: Vec<String>,
    pub cultural_alignment: Vec<String>,
    pub defi_activity: Vec<String>,
    pub airdrops_received: Vec<String>,
    pub rug_count: i32,
    pub wallet_age: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl WalletAnalysis {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            nft_count: 0,
            tx_frequency: 0.0,
            sybil_score: None,
            top_collections: Vec::new(),
            cultural_alignment: Vec::new(),
            defi_activity: Vec::new(),
            airdrops_received: Vec::new(),
            rug_count: 0,
            wallet_age: None,
            updated_at: Utc::now(),
        }
    }
}

/// A user together with the records matching reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user: User,
    pub preferences: Option<Preferences>,
    pub wallet_analysis: Option<WalletAnalysis>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_status_wire_format() {
        assert_eq!(serde_json::to_value(VerificationStatus::Verified).unwrap(), "VERIFIED");
        let parsed: VerificationStatus = serde_json::from_str("\"UNVERIFIED\"").unwrap();
        assert_eq!(parsed, VerificationStatus::Unverified);
        assert!(serde_json::from_str::<VerificationStatus>("\"PENDING\"").is_err());
    }

    #[test]
    fn test_user_serialization_hides_auth_token() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            solana_address: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
            username: "satoshi".to_string(),
            mobile_auth_token: Some("secret".to_string()),
            age: Some(30),
            gender: None,
            location: None,
            bio: None,
            profile_picture: None,
            verification_status: VerificationStatus::Unverified,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("mobileAuthToken").is_none());
        assert_eq!(json["solanaAddress"], "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU");
        assert_eq!(json["verificationStatus"], "UNVERIFIED");
    }

    #[test]
    fn test_age_range_serializes_as_pair() {
        let mut prefs = Preferences::empty(Uuid::new_v4());
        prefs.age_range = Some((25, 35));
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["ageRange"], serde_json::json!([25, 35]));
    }
}
