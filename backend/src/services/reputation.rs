use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::*;
use crate::error::AppResult;
use crate::models::{User, WalletAnalysis};
use crate::store::Store;

/// Wallet summary derived from the stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub live_reputation: f64,
    pub nft_count: i32,
    pub wallet_age: DateTime<Utc>,
    pub defi_activity: Vec<String>,
}

fn weighted(count: usize, weight: f64, cap: f64) -> f64 {
    (count as f64 * weight).min(cap)
}

/// Reputation in `[0, 1]` from wallet age, holdings, activity and rug history.
/// Users without an analysis sit at the base value.
pub fn live_reputation(analysis: Option<&WalletAnalysis>, now: DateTime<Utc>) -> f64 {
    let Some(analysis) = analysis else {
        return REPUTATION_BASE;
    };

    let mut reputation = REPUTATION_BASE;

    if let Some(created) = analysis.wallet_age {
        let age_days = (now - created).num_seconds() as f64 / 86_400.0;
        for threshold in REPUTATION_AGE_THRESHOLDS_DAYS {
            if age_days > threshold {
                reputation += REPUTATION_AGE_BONUS;
            }
        }
    }

    reputation += weighted(analysis.nft_count.max(0) as usize, REPUTATION_NFT_WEIGHT, REPUTATION_NFT_CAP);
    reputation += weighted(analysis.defi_activity.len(), REPUTATION_DEFI_WEIGHT, REPUTATION_DEFI_CAP);
    reputation += weighted(analysis.airdrops_received.len(), REPUTATION_AIRDROP_WEIGHT, REPUTATION_AIRDROP_CAP);
    reputation -= weighted(analysis.rug_count.max(0) as usize, REPUTATION_RUG_PENALTY, REPUTATION_RUG_PENALTY_CAP);

    reputation.clamp(0.0, 1.0)
}

pub async fn wallet_snapshot(store: &dyn Store, user: &User) -> AppResult<WalletSnapshot> {
    let analysis = store.wallet_analysis(user.id).await?;
    let reputation = live_reputation(analysis.as_ref(), Utc::now());

    Ok(WalletSnapshot {
        live_reputation: (reputation * 100.0).round() / 100.0,
        nft_count: analysis.as_ref().map_or(0, |a| a.nft_count),
        wallet_age: analysis.as_ref().and_then(|a| a.wallet_age).unwrap_or(user.created_at),
        defi_activity: analysis.map(|a| a.defi_activity).unwrap_or_default(),
    })
}
