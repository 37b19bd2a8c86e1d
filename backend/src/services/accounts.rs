use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{Preferences, User, UserProfile, VerificationStatus, WalletAnalysis};
use crate::store::Store;
use crate::utils::validation::{is_valid_solana_address, Validator};

const ADDRESS_MESSAGE: &str = "Invalid Solana address";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub solana_address: String,
    pub username: String,
    pub mobile_auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub solana_address: String,
    pub mobile_auth_token: Option<String>,
}

/// Partial profile update. Absent or empty fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
}

/// Partial preference update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub age_range: Option<Vec<i32>>,
    pub gender_preference: Option<String>,
    pub max_distance: Option<i32>,
    pub min_sybil_score: Option<f64>,
    pub desired_traits: Option<BTreeMap<String, f64>>,
    pub avoid_traits: Option<Vec<String>>,
    pub chain_activity_req: Option<serde_json::Value>,
}

/// Wallet metrics produced by the external analysis job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletImport {
    pub nft_count: i32,
    pub tx_frequency: f64,
    pub sybil_score: Option<f64>,
    pub top_collections: Vec<String>,
    pub cultural_alignment: Vec<String>,
    pub defi_activity: Vec<String>,
    pub airdrops_received: Vec<String>,
    pub rug_count: i32,
    pub wallet_age: Option<DateTime<Utc>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn username_ok(username: &str) -> bool {
    let len = username.chars().count();
    (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len)
}

pub async fn register(store: &dyn Store, request: RegisterRequest) -> AppResult<User> {
    let username = request.username.trim().to_string();

    let mut v = Validator::new();
    v.check(is_valid_solana_address(&request.solana_address), "solanaAddress", ADDRESS_MESSAGE);
    v.check(username_ok(&username), "username", "Username must be between 2 and 50 characters");
    v.finish()?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        solana_address: request.solana_address,
        username,
        mobile_auth_token: non_empty(request.mobile_auth_token),
        age: None,
        gender: None,
        location: None,
        bio: None,
        profile_picture: None,
        verification_status: VerificationStatus::Unverified,
        created_at: now,
        updated_at: now,
    };

    let user = store.insert_user(&user).await?;
    tracing::info!("Registered user {} ({})", user.id, user.solana_address);
    Ok(user)
}

pub async fn login(store: &dyn Store, request: LoginRequest) -> AppResult<User> {
    let mut v = Validator::new();
    v.check(is_valid_solana_address(&request.solana_address), "solanaAddress", ADDRESS_MESSAGE);
    v.finish()?;

    let mut user = store
        .user_by_address(&request.solana_address)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Wallet not registered".to_string()))?;

    if let Some(token) = non_empty(request.mobile_auth_token) {
        user.mobile_auth_token = Some(token);
        user.updated_at = Utc::now();
        user = store.update_user(&user).await?;
    }

    tracing::debug!("User {} logged in", user.id);
    Ok(user)
}

pub async fn public_profile(store: &dyn Store, user_id: Uuid) -> AppResult<UserProfile> {
    store
        .profile(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn update_profile(store: &dyn Store, mut user: User, update: ProfileUpdate) -> AppResult<User> {
    let username = non_empty(update.username).map(|u| u.trim().to_string());

    let mut v = Validator::new();
    if let Some(username) = &username {
        v.check(username_ok(username), "username", "Username must be between 2 and 50 characters");
    }
    v.check_range(update.age, MIN_USER_AGE, MAX_USER_AGE, "age", "Age must be between 18 and 100");
    v.finish()?;

    if let Some(username) = username {
        user.username = username;
    }
    if let Some(bio) = non_empty(update.bio) {
        user.bio = Some(bio);
    }
    if let Some(age) = update.age {
        user.age = Some(age);
    }
    if let Some(gender) = non_empty(update.gender) {
        user.gender = Some(gender);
    }
    if let Some(location) = non_empty(update.location) {
        user.location = Some(location);
    }
    if let Some(picture) = non_empty(update.profile_picture) {
        user.profile_picture = Some(picture);
    }
    user.updated_at = Utc::now();

    let user = store.update_user(&user).await?;
    tracing::info!("Updated profile of user {}", user.id);
    Ok(user)
}

fn validate_preferences(update: &PreferencesUpdate) -> Result<(), AppError> {
    let mut v = Validator::new();

    if let Some(range) = &update.age_range {
        if range.len() != 2 {
            v.push("ageRange", "Age range must be an array with exactly 2 numbers");
        } else {
            for age in range {
                v.check_range(Some(*age), MIN_USER_AGE, MAX_USER_AGE, "ageRange", "Age must be between 18 and 100");
            }
            v.check(range[0] <= range[1], "ageRange", "Age range minimum must not exceed maximum");
        }
    }

    if let Some(gender) = &update.gender_preference {
        v.check(GENDER_PREFERENCES.contains(&gender.as_str()), "genderPreference", "Invalid gender preference");
    }

    v.check_range(
        update.max_distance,
        MIN_MAX_DISTANCE,
        MAX_MAX_DISTANCE,
        "maxDistance",
        "Max distance must be between 1 and 500",
    );
    v.check_range(update.min_sybil_score, 0.0, 1.0, "minSybilScore", "Min sybil score must be between 0 and 1");

    if let Some(traits) = &update.desired_traits {
        for (name, weight) in traits {
            if !VALID_TRAITS.contains(&name.as_str()) {
                v.push("desiredTraits", format!("Invalid trait key: {}", name));
            }
            if !(0.0..=1.0).contains(weight) {
                v.push("desiredTraits", format!("Trait weight for {} must be between 0 and 1", name));
            }
        }
    }

    if let Some(traits) = &update.avoid_traits {
        for name in traits {
            if !VALID_TRAITS.contains(&name.as_str()) {
                v.push("avoidTraits", format!("Invalid trait key: {}", name));
            }
        }
    }

    if let Some(req) = &update.chain_activity_req {
        v.check(req.is_object(), "chainActivityReq", "Chain activity requirements must be an object");
    }

    Ok(v.finish()?)
}

pub async fn update_preferences(store: &dyn Store, user_id: Uuid, update: PreferencesUpdate) -> AppResult<Preferences> {
    validate_preferences(&update)?;

    let mut prefs = store
        .preferences(user_id)
        .await?
        .unwrap_or_else(|| Preferences::empty(user_id));

    if let Some(range) = update.age_range {
        prefs.age_range = Some((range[0], range[1]));
    }
    if let Some(gender) = update.gender_preference {
        prefs.gender_preference = Some(gender);
    }
    if let Some(distance) = update.max_distance {
        prefs.max_distance = Some(distance);
    }
    if let Some(score) = update.min_sybil_score {
        prefs.min_sybil_score = Some(score);
    }
    if let Some(traits) = update.desired_traits {
        prefs.desired_traits = traits;
    }
    if let Some(traits) = update.avoid_traits {
        prefs.avoid_traits = traits;
    }
    if let Some(req) = update.chain_activity_req {
        prefs.chain_activity_req = req;
    }
    prefs.updated_at = Utc::now();

    let prefs = store.save_preferences(&prefs).await?;
    tracing::info!("Preferences updated for user {}", user_id);
    Ok(prefs)
}

pub async fn wallet_analysis(store: &dyn Store, user_id: Uuid) -> AppResult<WalletAnalysis> {
    store
        .wallet_analysis(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Wallet analysis"))
}

/// Replaces the wallet analysis of the user owning `solana_address`.
pub async fn import_wallet_analysis(store: &dyn Store, solana_address: &str, import: WalletImport) -> AppResult<WalletAnalysis> {
    let user = store
        .user_by_address(solana_address)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut v = Validator::new();
    v.check_range(import.sybil_score, 0.0, 1.0, "sybilScore", "Sybil score must be between 0 and 1");
    v.check(import.nft_count >= 0, "nftCount", "NFT count must be non-negative");
    v.check(import.rug_count >= 0, "rugCount", "Rug count must be non-negative");
    v.finish()?;

    let analysis = WalletAnalysis {
        user_id: user.id,
        nft_count: import.nft_count,
        tx_frequency: import.tx_frequency,
        sybil_score: import.sybil_score,
        top_collections: import.top_collections,
        cultural_alignment: import.cultural_alignment,
        defi_activity: import.defi_activity,
        airdrops_received: import.airdrops_received,
        rug_count: import.rug_count,
        wallet_age: import.wallet_age,
        updated_at: Utc::now(),
    };

    let analysis = store.save_wallet_analysis(&analysis).await?;
    tracing::info!("Imported wallet analysis for {} ({})", user.id, solana_address);
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const ADDRESS: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    async fn registered(store: &MemoryStore) -> User {
        register(
            store,
            RegisterRequest {
                solana_address: ADDRESS.to_string(),
                username: "  satoshi ".to_string(),
                mobile_auth_token: None,
            },
        )
        .await
        .unwrap()
    }

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_trims_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let user = registered(&store).await;
        assert_eq!(user.username, "satoshi");
        assert_eq!(user.verification_status, VerificationStatus::Unverified);

        let err = register(
            &store,
            RegisterRequest {
                solana_address: ADDRESS.to_string(),
                username: "other".to_string(),
                mobile_auth_token: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Wallet already registered"));
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let store = MemoryStore::new();
        let err = register(
            &store,
            RegisterRequest {
                solana_address: "0xdeadbeef".to_string(),
                username: "x".to_string(),
                mobile_auth_token: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(fields(err), vec!["solanaAddress", "username"]);
    }

    #[tokio::test]
    async fn test_login_replaces_token_and_rejects_unknown_wallet() {
        let store = MemoryStore::new();
        let user = registered(&store).await;

        let logged_in = login(
            &store,
            LoginRequest {
                solana_address: ADDRESS.to_string(),
                mobile_auth_token: Some("device-token".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(logged_in.mobile_auth_token.as_deref(), Some("device-token"));

        let err = login(
            &store,
            LoginRequest {
                solana_address: "11111111111111111111111111111111".to_string(),
                mobile_auth_token: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_update_profile_ignores_empty_fields() {
        let store = MemoryStore::new();
        let user = registered(&store).await;

        let updated = update_profile(
            &store,
            user.clone(),
            ProfileUpdate {
                username: Some(String::new()),
                bio: Some("gm".to_string()),
                age: Some(29),
                gender: Some("".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.username, "satoshi");
        assert_eq!(updated.bio.as_deref(), Some("gm"));
        assert_eq!(updated.age, Some(29));
        assert_eq!(updated.gender, None);

        let err = update_profile(&store, updated, ProfileUpdate { age: Some(17), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(fields(err), vec!["age"]);
    }

    #[tokio::test]
    async fn test_update_preferences_merges_into_existing() {
        let store = MemoryStore::new();
        let user = registered(&store).await;

        let prefs = update_preferences(
            &store,
            user.id,
            PreferencesUpdate {
                age_range: Some(vec![25, 35]),
                gender_preference: Some("any".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(prefs.age_range, Some((25, 35)));

        let mut traits = BTreeMap::new();
        traits.insert("BONK_HOLDER".to_string(), 0.8);
        let prefs = update_preferences(
            &store,
            user.id,
            PreferencesUpdate {
                min_sybil_score: Some(0.0),
                desired_traits: Some(traits),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(prefs.age_range, Some((25, 35)));
        assert_eq!(prefs.gender_preference.as_deref(), Some("any"));
        assert_eq!(prefs.min_sybil_score, Some(0.0));
        assert_eq!(prefs.desired_traits.get("BONK_HOLDER"), Some(&0.8));
    }

    #[tokio::test]
    async fn test_update_preferences_reports_every_bad_field() {
        let store = MemoryStore::new();
        let user = registered(&store).await;

        let mut traits = BTreeMap::new();
        traits.insert("WHALE".to_string(), 0.5);
        let err = update_preferences(
            &store,
            user.id,
            PreferencesUpdate {
                age_range: Some(vec![40, 30]),
                gender_preference: Some("robot".to_string()),
                max_distance: Some(0),
                min_sybil_score: Some(1.5),
                desired_traits: Some(traits),
                avoid_traits: Some(vec!["HODLER".to_string()]),
                chain_activity_req: Some(serde_json::json!([1, 2])),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            fields(err),
            vec!["ageRange", "genderPreference", "maxDistance", "minSybilScore", "desiredTraits", "chainActivityReq"]
        );
        assert!(store.preferences(user.id).await.unwrap().is_none());

        let err = update_preferences(
            &store,
            user.id,
            PreferencesUpdate { age_range: Some(vec![20]), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert_eq!(fields(err), vec!["ageRange"]);
    }

    #[tokio::test]
    async fn test_import_wallet_analysis() {
        let store = MemoryStore::new();
        let user = registered(&store).await;

        let err = wallet_analysis(&store, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Wallet analysis not found"));

        let import: WalletImport = serde_json::from_value(serde_json::json!({
            "nftCount": 12,
            "sybilScore": 0.9,
            "topCollections": ["Mad Lads"]
        }))
        .unwrap();
        import_wallet_analysis(&store, ADDRESS, import).await.unwrap();

        let stored = wallet_analysis(&store, user.id).await.unwrap();
        assert_eq!(stored.nft_count, 12);
        assert_eq!(stored.top_collections, vec!["Mad Lads"]);
        assert!(stored.airdrops_received.is_empty());

        let err = import_wallet_analysis(&store, "11111111111111111111111111111111", WalletImport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
