//! Compatibility scoring between two users.
//!
//! The score is an additive heuristic over demographic data and on-chain
//! wallet overlap, capped at [`MAX_COMPATIBILITY_SCORE`]. The report is built
//! from the first user's point of view: reasons follow that user's list
//! order, and each gender and sybil term judges one user against the other
//! user's preferences, so the two directions are scored independently.

use serde::Serialize;

use crate::constants::*;
use crate::models::{Preferences, UserProfile, WalletAnalysis};

/// Score and the human readable reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub score: i32,
    pub reasons: Vec<String>,
}

/// Items present in both lists, each once, in `ours` order.
pub fn shared_items(ours: &[String], theirs: &[String]) -> Vec<String> {
    let mut shared: Vec<String> = Vec::new();
    for item in ours {
        if theirs.contains(item) && !shared.contains(item) {
            shared.push(item.clone());
        }
    }
    shared
}

fn shared_by(a: Option<&WalletAnalysis>, b: Option<&WalletAnalysis>, field: fn(&WalletAnalysis) -> &[String]) -> Vec<String> {
    match (a, b) {
        (Some(a), Some(b)) => shared_items(field(a), field(b)),
        _ => Vec::new(),
    }
}

pub fn shared_collections(a: &UserProfile, b: &UserProfile) -> Vec<String> {
    shared_by(a.wallet_analysis.as_ref(), b.wallet_analysis.as_ref(), |w| w.top_collections.as_slice())
}

pub fn shared_cultures(a: &UserProfile, b: &UserProfile) -> Vec<String> {
    shared_by(a.wallet_analysis.as_ref(), b.wallet_analysis.as_ref(), |w| w.cultural_alignment.as_slice())
}

pub fn shared_defi_activity(a: &UserProfile, b: &UserProfile) -> Vec<String> {
    shared_by(a.wallet_analysis.as_ref(), b.wallet_analysis.as_ref(), |w| w.defi_activity.as_slice())
}

pub fn shared_airdrops(a: &UserProfile, b: &UserProfile) -> Vec<String> {
    shared_by(a.wallet_analysis.as_ref(), b.wallet_analysis.as_ref(), |w| w.airdrops_received.as_slice())
}

fn in_range(age: i32, (min, max): (i32, i32)) -> bool {
    age >= min && age <= max
}

/// Age gap when both ages sit inside the other user's range.
fn mutual_age_gap(a: &UserProfile, b: &UserProfile) -> Option<i32> {
    let age_a = a.user.age?;
    let age_b = b.user.age?;
    let range_a = a.preferences.as_ref()?.age_range?;
    let range_b = b.preferences.as_ref()?.age_range?;
    (in_range(age_b, range_a) && in_range(age_a, range_b)).then(|| (age_a - age_b).abs())
}

/// Whether `candidate_gender` satisfies the preference held in `prefs`.
fn gender_matches(prefs: Option<&Preferences>, candidate_gender: Option<&str>) -> bool {
    let Some(wanted) = prefs.and_then(|p| p.gender_preference.as_deref()) else {
        return false;
    };
    match candidate_gender {
        Some(gender) => wanted == ANY_GENDER || wanted == gender,
        None => false,
    }
}

fn sybil_points(a: &UserProfile, b: &UserProfile) -> u32 {
    let sybil_a = a.wallet_analysis.as_ref().and_then(|w| w.sybil_score);
    let sybil_b = b.wallet_analysis.as_ref().and_then(|w| w.sybil_score);
    let (Some(sybil_a), Some(sybil_b)) = (sybil_a, sybil_b) else {
        return 0;
    };
    let threshold = |p: &UserProfile| {
        p.preferences
            .as_ref()
            .and_then(|prefs| prefs.min_sybil_score)
            .unwrap_or(DEFAULT_MIN_SYBIL_SCORE)
    };

    let mut points = 0;
    if sybil_b >= threshold(a) {
        points += SYBIL_MATCH_POINTS;
    }
    if sybil_a >= threshold(b) {
        points += SYBIL_MATCH_POINTS;
    }
    points
}

/// Scores `b` as a match for `a`.
pub fn score(a: &UserProfile, b: &UserProfile) -> CompatibilityReport {
    let mut total: u32 = 0;
    let mut reasons = Vec::new();

    if let Some(gap) = mutual_age_gap(a, b) {
        total += AGE_MATCH_POINTS;
        reasons.push(format!("{} years apart", gap));
    }

    if gender_matches(a.preferences.as_ref(), b.user.gender.as_deref()) {
        total += GENDER_MATCH_POINTS;
    }
    if gender_matches(b.preferences.as_ref(), a.user.gender.as_deref()) {
        total += GENDER_MATCH_POINTS;
    }

    total += sybil_points(a, b);

    for collection in shared_collections(a, b) {
        total += SHARED_COLLECTION_POINTS;
        reasons.push(format!("Both {} holders", collection));
    }

    for culture in shared_cultures(a, b) {
        total += SHARED_CULTURE_POINTS;
        reasons.push(format!("Both {} enthusiasts", culture));
    }

    for activity in shared_defi_activity(a, b) {
        total += SHARED_DEFI_POINTS;
        reasons.push(format!("Both active in {}", activity));
    }

    // Airdrops explain a match but do not move the score
    for airdrop in shared_airdrops(a, b) {
        reasons.push(format!("Both received {} airdrop", airdrop));
    }

    CompatibilityReport {
        score: total.min(MAX_COMPATIBILITY_SCORE) as i32,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, VerificationStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn bare(age: Option<i32>, gender: Option<&str>) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            user: User {
                id: Uuid::new_v4(),
                solana_address: "11111111111111111111111111111111".to_string(),
                username: "user".to_string(),
                mobile_auth_token: None,
                age,
                gender: gender.map(str::to_string),
                location: None,
                bio: None,
                profile_picture: None,
                verification_status: VerificationStatus::Unverified,
                created_at: now,
                updated_at: now,
            },
            preferences: None,
            wallet_analysis: None,
        }
    }

    fn with_prefs(mut p: UserProfile, f: impl FnOnce(&mut Preferences)) -> UserProfile {
        let mut prefs = p.preferences.take().unwrap_or_else(|| Preferences::empty(p.user.id));
        f(&mut prefs);
        p.preferences = Some(prefs);
        p
    }

    fn with_wallet(mut p: UserProfile, f: impl FnOnce(&mut WalletAnalysis)) -> UserProfile {
        let mut wallet = p.wallet_analysis.take().unwrap_or_else(|| WalletAnalysis::empty(p.user.id));
        f(&mut wallet);
        p.wallet_analysis = Some(wallet);
        p
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_data_scores_zero() {
        let report = score(&bare(None, None), &bare(None, None));
        assert_eq!(report.score, 0);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn test_mutual_age_range_adds_twenty() {
        let a = with_prefs(bare(Some(30), None), |p| p.age_range = Some((25, 35)));
        let b = with_prefs(bare(Some(32), None), |p| p.age_range = Some((28, 40)));

        let report = score(&a, &b);
        assert_eq!(report.score, 20);
        assert_eq!(report.reasons, vec!["2 years apart"]);
    }

    #[test]
    fn test_one_sided_age_range_adds_nothing() {
        let a = with_prefs(bare(Some(30), None), |p| p.age_range = Some((25, 35)));
        let b = with_prefs(bare(Some(32), None), |p| p.age_range = Some((33, 40)));
        assert_eq!(score(&a, &b).score, 0);

        // Range missing on one side
        let c = bare(Some(32), None);
        assert_eq!(score(&a, &c).score, 0);
    }

    #[test]
    fn test_two_shared_collections_score_thirty() {
        let a = with_wallet(bare(None, None), |w| {
            w.top_collections = strings(&["Mad Lads", "Tensorians", "SMB"]);
        });
        let b = with_wallet(bare(None, None), |w| {
            w.top_collections = strings(&["SMB", "Claynosaurz", "Mad Lads"]);
        });

        let report = score(&a, &b);
        assert_eq!(report.score, 30);
        assert_eq!(report.reasons, vec!["Both Mad Lads holders", "Both SMB holders"]);
    }

    #[test]
    fn test_duplicate_entries_count_once() {
        let a = with_wallet(bare(None, None), |w| {
            w.top_collections = strings(&["SMB", "SMB"]);
        });
        let b = with_wallet(bare(None, None), |w| {
            w.top_collections = strings(&["SMB"]);
        });
        assert_eq!(score(&a, &b).score, 15);
    }

    #[test]
    fn test_reason_order() {
        let a = with_wallet(
            with_prefs(bare(Some(30), None), |p| p.age_range = Some((18, 99))),
            |w| {
                w.airdrops_received = strings(&["JUP"]);
                w.defi_activity = strings(&["lending"]);
                w.cultural_alignment = strings(&["art"]);
                w.top_collections = strings(&["SMB"]);
            },
        );
        let b = with_wallet(
            with_prefs(bare(Some(30), None), |p| p.age_range = Some((18, 99))),
            |w| {
                w.airdrops_received = strings(&["JUP"]);
                w.defi_activity = strings(&["lending"]);
                w.cultural_alignment = strings(&["art"]);
                w.top_collections = strings(&["SMB"]);
            },
        );

        let report = score(&a, &b);
        assert_eq!(
            report.reasons,
            vec![
                "0 years apart",
                "Both SMB holders",
                "Both art enthusiasts",
                "Both active in lending",
                "Both received JUP airdrop",
            ]
        );
        // 20 + 15 + 10 + 8, airdrops add nothing
        assert_eq!(report.score, 53);
    }

    #[test]
    fn test_score_is_capped_at_one_hundred() {
        let many = strings(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let a = with_wallet(bare(None, None), |w| w.top_collections = many.clone());
        let b = with_wallet(bare(None, None), |w| w.top_collections = many.clone());

        let report = score(&a, &b);
        assert_eq!(report.score, 100);
        assert_eq!(report.reasons.len(), 8);
    }

    #[test]
    fn test_gender_and_sybil_terms_are_directional() {
        // A wants women and a high sybil score; C is a woman with default demands
        let a = with_wallet(
            with_prefs(bare(None, Some("male")), |p| {
                p.gender_preference = Some("female".to_string());
                p.min_sybil_score = Some(0.9);
            }),
            |w| w.sybil_score = Some(0.5),
        );
        let c = with_wallet(
            with_prefs(bare(None, Some("female")), |p| p.gender_preference = Some("female".to_string())),
            |w| w.sybil_score = Some(0.95),
        );

        // Each direction is judged against the other side's preferences
        assert!(gender_matches(a.preferences.as_ref(), c.user.gender.as_deref()));
        assert!(!gender_matches(c.preferences.as_ref(), a.user.gender.as_deref()));

        // C is female (+15), A fails C's preference (0),
        // C clears A's 0.9 (+10), A's 0.5 misses the default 0.7 (0)
        assert_eq!(score(&a, &c).score, 25);
        assert_eq!(sybil_points(&a, &c), 10);
    }

    #[test]
    fn test_reasons_follow_first_user_order() {
        let a = with_wallet(bare(None, None), |w| {
            w.top_collections = strings(&["SMB", "Mad Lads"]);
        });
        let b = with_wallet(bare(None, None), |w| {
            w.top_collections = strings(&["Mad Lads", "SMB"]);
        });

        let ab = score(&a, &b);
        let ba = score(&b, &a);
        assert_eq!(ab.score, ba.score);
        // Reasons follow the first user's ordering
        assert_ne!(ab, ba);
        assert_eq!(ab.reasons[0], "Both SMB holders");
        assert_eq!(ba.reasons[0], "Both Mad Lads holders");
    }

    #[test]
    fn test_sybil_requires_both_scores() {
        let a = with_wallet(bare(None, None), |w| w.sybil_score = Some(0.99));
        let b = with_wallet(bare(None, None), |w| w.sybil_score = None);
        assert_eq!(score(&a, &b).score, 0);

        let c = with_wallet(bare(None, None), |w| w.sybil_score = Some(0.7));
        // Default threshold 0.7 in both directions
        assert_eq!(score(&a, &c).score, 20);
    }

    #[test]
    fn test_any_gender_preference_matches_declared_gender() {
        let a = with_prefs(bare(None, Some("male")), |p| p.gender_preference = Some("any".to_string()));
        let b = bare(None, Some("non-binary"));
        assert_eq!(score(&a, &b).score, 15);
        assert_eq!(score(&a, &bare(None, None)).score, 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let a = with_wallet(
            with_prefs(bare(Some(29), Some("female")), |p| {
                p.age_range = Some((25, 40));
                p.gender_preference = Some("male".to_string());
            }),
            |w| {
                w.sybil_score = Some(0.8);
                w.top_collections = strings(&["SMB", "Mad Lads"]);
                w.cultural_alignment = strings(&["music"]);
            },
        );
        let b = with_wallet(
            with_prefs(bare(Some(33), Some("male")), |p| {
                p.age_range = Some((21, 30));
                p.gender_preference = Some("female".to_string());
            }),
            |w| {
                w.sybil_score = Some(0.75);
                w.top_collections = strings(&["Mad Lads"]);
                w.cultural_alignment = strings(&["music", "art"]);
            },
        );

        let first = score(&a, &b);
        for _ in 0..10 {
            assert_eq!(score(&a, &b), first);
        }
        assert!(first.score >= 0 && first.score <= 100);
        // 20 + 15 + 15 + 20 + 15 + 10
        assert_eq!(first.score, 95);
    }

    #[test]
    fn test_shared_items_keeps_first_list_order() {
        let ours = strings(&["c", "a", "b"]);
        let theirs = strings(&["a", "b", "c"]);
        assert_eq!(shared_items(&ours, &theirs), strings(&["c", "a", "b"]));
        assert!(shared_items(&ours, &[]).is_empty());
    }
}
