use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::compatibility::{self, CompatibilityReport};
use super::onchain::{OnchainServices, ProofKind, ProofRequest};
use crate::constants::*;
use crate::error::{AppError, AppResult};
use crate::models::{Match, MatchStatus, UserProfile};
use crate::store::{CandidateFilter, LikeOutcome, Store};
use crate::utils::validation::{parse_int_param, FieldError, Validator};

/// Validated paging for suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionPage {
    pub limit: usize,
    pub offset: usize,
}

impl Default for SuggestionPage {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SUGGESTION_LIMIT as usize,
            offset: 0,
        }
    }
}

impl SuggestionPage {
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Result<Self, Vec<FieldError>> {
        const LIMIT_MESSAGE: &str = "Limit must be between 1 and 50";
        const OFFSET_MESSAGE: &str = "Offset must be non-negative";

        let mut v = Validator::new();
        let limit = parse_int_param(&mut v, limit, "limit", LIMIT_MESSAGE);
        let offset = parse_int_param(&mut v, offset, "offset", OFFSET_MESSAGE);
        v.check_range(limit, 1, MAX_SUGGESTION_LIMIT, "limit", LIMIT_MESSAGE);
        v.check_range(offset, 0, i64::MAX, "offset", OFFSET_MESSAGE);
        v.finish()?;

        Ok(Self {
            limit: limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT) as usize,
            offset: offset.unwrap_or(0) as usize,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSuggestion {
    pub user_id: Uuid,
    pub username: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub compatibility_score: i32,
    pub reasons: Vec<String>,
    pub shared_collections: Vec<String>,
    pub joint_airdrops: Vec<String>,
    pub cultural_alignment: Vec<String>,
}

/// Scores `candidates` for `requester`, drops weak matches and returns the
/// requested page, best first. Equal scores are ordered by user id.
pub fn rank_candidates(requester: &UserProfile, candidates: &[UserProfile], page: SuggestionPage) -> Vec<MatchSuggestion> {
    let mut scored: Vec<MatchSuggestion> = candidates
        .iter()
        .filter(|c| c.user.id != requester.user.id)
        .map(|candidate| {
            let CompatibilityReport { score, reasons } = compatibility::score(requester, candidate);
            MatchSuggestion {
                user_id: candidate.user.id,
                username: candidate.user.username.clone(),
                age: candidate.user.age,
                gender: candidate.user.gender.clone(),
                location: candidate.user.location.clone(),
                profile_picture: candidate.user.profile_picture.clone(),
                compatibility_score: score,
                reasons,
                shared_collections: compatibility::shared_collections(requester, candidate),
                joint_airdrops: compatibility::shared_airdrops(requester, candidate),
                cultural_alignment: compatibility::shared_cultures(requester, candidate),
            }
        })
        .filter(|s| s.compatibility_score > MIN_SUGGESTION_SCORE)
        .collect();

    scored.sort_by(|a, b| {
        b.compatibility_score
            .cmp(&a.compatibility_score)
            .then(a.user_id.cmp(&b.user_id))
    });

    scored.into_iter().skip(page.offset).take(page.limit).collect()
}

pub async fn suggest_matches(store: &dyn Store, requester_id: Uuid, page: SuggestionPage) -> AppResult<Vec<MatchSuggestion>> {
    let requester = store
        .profile(requester_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let prefs = requester
        .preferences
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("User preferences not set".to_string()))?;

    let filter = CandidateFilter::from_preferences(prefs);
    let candidates = store.candidate_profiles(requester_id, &filter).await?;
    let suggestions = rank_candidates(&requester, &candidates, page);

    tracing::debug!(
        "Suggestions for {}: {} candidates, {} returned (limit {}, offset {})",
        requester_id,
        candidates.len(),
        suggestions.len(),
        page.limit,
        page.offset
    );

    Ok(suggestions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LikeStatus {
    Pending,
    Mutual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: Uuid,
    pub compatibility_score: i32,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub match_status: LikeStatus,
    #[serde(rename = "match")]
    pub matched: MatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_mint_address: Option<String>,
}

pub fn chat_channel_id(created: &Match, reciprocal: &Match) -> String {
    format!("chat-{}-{}", created.id, reciprocal.id)
}

/// `liker_id` likes `target_id`. A reciprocal pending like turns both rows
/// into an accepted match.
pub async fn like_user(
    store: &dyn Store,
    onchain: &dyn OnchainServices,
    liker_id: Uuid,
    target_id: Uuid,
) -> AppResult<LikeResponse> {
    if liker_id == target_id {
        return Err(AppError::BadRequest("Cannot like yourself".to_string()));
    }

    let target = store
        .profile(target_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let liker = store
        .profile(liker_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let report = compatibility::score(&liker, &target);
    let now = Utc::now();
    let like = Match {
        id: Uuid::new_v4(),
        user1_id: liker_id,
        user2_id: target_id,
        compatibility_score: report.score,
        match_reasons: report.reasons,
        status: MatchStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    let outcome = store.record_like(&like).await?;
    let created = outcome.created();
    let matched = MatchSummary {
        id: created.id,
        compatibility_score: created.compatibility_score,
        match_reasons: created.match_reasons.clone(),
    };

    let LikeOutcome::Mutual { created, reciprocal } = &outcome else {
        tracing::info!("User {} liked {} (pending)", liker_id, target_id);
        return Ok(LikeResponse {
            match_status: LikeStatus::Pending,
            matched,
            chat_channel_id: None,
            nft_mint_address: None,
        });
    };

    tracing::info!("Mutual match between {} and {}", liker_id, target_id);

    // The match is already committed; a failed mint only drops the proof
    let proof = onchain
        .mint_proof(&ProofRequest {
            kind: ProofKind::Match,
            subject_id: created.id,
            title: format!("Match - {} & {}", liker.user.username, target.user.username),
            participants: vec![liker.user.username.clone(), target.user.username.clone()],
        })
        .await;
    let nft_mint_address = match proof {
        Ok(proof) => Some(proof.address),
        Err(e) => {
            tracing::warn!("Failed to mint match proof for {}: {}", created.id, e);
            None
        }
    };

    Ok(LikeResponse {
        match_status: LikeStatus::Mutual,
        matched,
        chat_channel_id: Some(chat_channel_id(created, reciprocal)),
        nft_mint_address,
    })
}

pub async fn list_matches(store: &dyn Store, user_id: Uuid) -> AppResult<Vec<Match>> {
    Ok(store.matches_for_user(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Preferences, User, VerificationStatus, WalletAnalysis};
    use crate::services::onchain::PlaceholderOnchain;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn seed_user(store: &MemoryStore, name: &str, collections: &[&str]) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let user = User {
            id,
            solana_address: format!("{}{}", name, "1".repeat(40 - name.len())),
            username: name.to_string(),
            mobile_auth_token: None,
            age: Some(30),
            gender: None,
            location: None,
            bio: None,
            profile_picture: None,
            verification_status: VerificationStatus::Unverified,
            created_at: now,
            updated_at: now,
        };
        store.insert_user(&user).await.unwrap();
        store.save_preferences(&Preferences::empty(id)).await.unwrap();
        let mut wallet = WalletAnalysis::empty(id);
        wallet.top_collections = strings(collections);
        store.save_wallet_analysis(&wallet).await.unwrap();
        id
    }

    #[test]
    fn test_page_defaults_and_bounds() {
        assert_eq!(SuggestionPage::parse(None, None).unwrap(), SuggestionPage::default());
        assert_eq!(
            SuggestionPage::parse(Some("50"), Some("3")).unwrap(),
            SuggestionPage { limit: 50, offset: 3 }
        );

        let errors = SuggestionPage::parse(Some("0"), Some("-1")).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["limit", "offset"]);

        assert!(SuggestionPage::parse(Some("51"), None).is_err());
        assert!(SuggestionPage::parse(Some("ten"), None).is_err());
    }

    #[tokio::test]
    async fn test_first_like_creates_one_pending_match() {
        let store = MemoryStore::new();
        let onchain = PlaceholderOnchain;
        let alice = seed_user(&store, "alice", &["SMB"]).await;
        let bob = seed_user(&store, "bob", &["SMB"]).await;

        let response = like_user(&store, &onchain, alice, bob).await.unwrap();
        assert_eq!(response.match_status, LikeStatus::Pending);
        assert_eq!(response.matched.compatibility_score, 15);
        assert_eq!(response.matched.match_reasons, vec!["Both SMB holders"]);
        assert!(response.chat_channel_id.is_none());

        let matches = store.matches_for_user(alice).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].status, MatchStatus::Pending);
        assert_eq!(matches[0].user1_id, alice);
    }

    #[tokio::test]
    async fn test_reciprocal_like_accepts_both() {
        let store = MemoryStore::new();
        let onchain = PlaceholderOnchain;
        let alice = seed_user(&store, "alice", &[]).await;
        let bob = seed_user(&store, "bob", &[]).await;

        let first = like_user(&store, &onchain, alice, bob).await.unwrap();
        let second = like_user(&store, &onchain, bob, alice).await.unwrap();

        assert_eq!(second.match_status, LikeStatus::Mutual);
        let channel = second.chat_channel_id.unwrap();
        assert_eq!(channel, format!("chat-{}-{}", second.matched.id, first.matched.id));
        assert!(second.nft_mint_address.is_some());

        let matches = store.matches_for_user(alice).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.status == MatchStatus::Accepted));
    }

    #[tokio::test]
    async fn test_duplicate_like_is_conflict() {
        let store = MemoryStore::new();
        let onchain = PlaceholderOnchain;
        let alice = seed_user(&store, "alice", &[]).await;
        let bob = seed_user(&store, "bob", &[]).await;

        like_user(&store, &onchain, alice, bob).await.unwrap();
        let err = like_user(&store, &onchain, alice, bob).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_like_after_acceptance_is_conflict() {
        let store = MemoryStore::new();
        let onchain = PlaceholderOnchain;
        let alice = seed_user(&store, "alice", &[]).await;
        let bob = seed_user(&store, "bob", &[]).await;

        like_user(&store, &onchain, alice, bob).await.unwrap();
        like_user(&store, &onchain, bob, alice).await.unwrap();
        for (from, to) in [(alice, bob), (bob, alice)] {
            let err = like_user(&store, &onchain, from, to).await.unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }
        assert_eq!(store.match_count().await, 2);
    }

    #[tokio::test]
    async fn test_like_unknown_or_self_target() {
        let store = MemoryStore::new();
        let onchain = PlaceholderOnchain;
        let alice = seed_user(&store, "alice", &[]).await;

        let err = like_user(&store, &onchain, alice, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = like_user(&store, &onchain, alice, alice).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.match_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_opposite_likes_always_end_mutual() {
        for _ in 0..25 {
            let store = Arc::new(MemoryStore::new());
            let onchain = Arc::new(PlaceholderOnchain);
            let alice = seed_user(&store, "alice", &[]).await;
            let bob = seed_user(&store, "bob", &[]).await;

            let (s1, o1) = (store.clone(), onchain.clone());
            let (s2, o2) = (store.clone(), onchain.clone());
            let h1 = tokio::spawn(async move { like_user(s1.as_ref(), o1.as_ref(), alice, bob).await });
            let h2 = tokio::spawn(async move { like_user(s2.as_ref(), o2.as_ref(), bob, alice).await });

            let r1 = h1.await.unwrap().unwrap();
            let r2 = h2.await.unwrap().unwrap();
            let mutual = [r1.match_status, r2.match_status]
                .iter()
                .filter(|s| **s == LikeStatus::Mutual)
                .count();
            assert_eq!(mutual, 1);

            let matches = store.matches_for_user(alice).await.unwrap();
            assert_eq!(matches.len(), 2);
            assert!(matches.iter().all(|m| m.status == MatchStatus::Accepted));
        }
    }

    #[tokio::test]
    async fn test_suggestions_exclude_existing_matches_and_weak_scores() {
        let store = MemoryStore::new();
        let onchain = PlaceholderOnchain;
        let me = seed_user(&store, "me", &["A", "B", "C"]).await;
        let strong = seed_user(&store, "strong", &["A", "B", "C"]).await; // 45
        let medium = seed_user(&store, "medium", &["A", "B", "C"]).await; // 45
        let weak = seed_user(&store, "weak", &["A", "B"]).await; // 30, dropped
        let liked = seed_user(&store, "liked", &["A", "B", "C"]).await;
        let liker = seed_user(&store, "liker", &["A", "B", "C"]).await;

        like_user(&store, &onchain, me, liked).await.unwrap();
        like_user(&store, &onchain, liker, me).await.unwrap();

        let all = suggest_matches(&store, me, SuggestionPage { limit: 50, offset: 0 }).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|s| s.user_id).collect();
        assert!(!ids.contains(&weak));
        assert!(!ids.contains(&liked));
        assert!(!ids.contains(&liker));
        assert!(!ids.contains(&me));

        let mut expected = vec![strong, medium];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(all[0].shared_collections, strings(&["A", "B", "C"]));

        for offset in 0..4 {
            for limit in 1..4 {
                let page = suggest_matches(&store, me, SuggestionPage { limit, offset }).await.unwrap();
                assert!(page.len() <= limit);
                assert!(page.iter().all(|s| s.user_id != liked && s.user_id != liker));
                let window: Vec<Uuid> = expected.iter().skip(offset).take(limit).cloned().collect();
                assert_eq!(page.iter().map(|s| s.user_id).collect::<Vec<_>>(), window);
            }
        }
    }

    #[tokio::test]
    async fn test_suggestions_require_preferences() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let id = Uuid::new_v4();
        store
            .insert_user(&User {
                id,
                solana_address: "nopref1111111111111111111111111111111".to_string(),
                username: "nopref".to_string(),
                mobile_auth_token: None,
                age: None,
                gender: None,
                location: None,
                bio: None,
                profile_picture: None,
                verification_status: VerificationStatus::Unverified,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let err = suggest_matches(&store, id, SuggestionPage::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "User preferences not set"));

        let err = suggest_matches(&store, Uuid::new_v4(), SuggestionPage::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_suggestions_apply_hard_filters() {
        let store = MemoryStore::new();
        let me = seed_user(&store, "me", &["A", "B", "C"]).await;
        let young = seed_user(&store, "young", &["A", "B", "C"]).await;
        let fits = seed_user(&store, "fits", &["A", "B", "C"]).await;

        let mut young_user = store.user_by_id(young).await.unwrap().unwrap();
        young_user.age = Some(19);
        store.update_user(&young_user).await.unwrap();

        let mut prefs = Preferences::empty(me);
        prefs.age_range = Some((25, 35));
        store.save_preferences(&prefs).await.unwrap();

        let page = suggest_matches(&store, me, SuggestionPage::default()).await.unwrap();
        let ids: Vec<Uuid> = page.iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec![fits]);
    }
}
