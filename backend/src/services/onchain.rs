use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OnchainError {
    #[error("on-chain service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofKind {
    /// Minted to both wallets on a mutual like
    Match,
    /// Preview attached to a proposed date
    DatePreview,
    ConfirmedDate,
    /// Commemorative badge for a completed date
    Completion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub kind: ProofKind,
    pub subject_id: Uuid,
    pub title: String,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRef {
    pub address: String,
    pub tx_signature: String,
    pub metadata_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRef {
    pub address: String,
    pub amount: f64,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRelease {
    pub status: &'static str,
    pub amount: f64,
    pub tx_signature: String,
}

/// Chain-side effects of matching and dating. Callers treat every returned
/// reference as opaque.
#[async_trait]
pub trait OnchainServices: Send + Sync {
    async fn mint_proof(&self, request: &ProofRequest) -> Result<ProofRef, OnchainError>;
    async fn lock_escrow(&self, date_id: Uuid, amount: f64) -> Result<EscrowRef, OnchainError>;
    async fn release_escrow(&self, date_id: Uuid, amount: f64) -> Result<EscrowRelease, OnchainError>;
}

/// Stand-in that hands out random references and touches no chain.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderOnchain;

fn placeholder_ref(prefix: &str) -> String {
    format!("{}{}", prefix, hex::encode(rand::random::<[u8; 16]>()))
}

#[async_trait]
impl OnchainServices for PlaceholderOnchain {
    async fn mint_proof(&self, request: &ProofRequest) -> Result<ProofRef, OnchainError> {
        let proof = ProofRef {
            address: placeholder_ref("nft"),
            tx_signature: placeholder_ref("sig"),
            metadata_uri: format!("ipfs://{}", placeholder_ref("Qm")),
        };
        tracing::debug!(
            "Placeholder {:?} proof for {} ({}) -> {}",
            request.kind,
            request.subject_id,
            request.title,
            proof.address
        );
        Ok(proof)
    }

    async fn lock_escrow(&self, date_id: Uuid, amount: f64) -> Result<EscrowRef, OnchainError> {
        tracing::debug!("Placeholder escrow of {} SOL locked for date {}", amount, date_id);
        Ok(EscrowRef {
            address: placeholder_ref("esc"),
            amount,
            status: "LOCKED",
        })
    }

    async fn release_escrow(&self, date_id: Uuid, amount: f64) -> Result<EscrowRelease, OnchainError> {
        tracing::debug!("Placeholder escrow of {} SOL released for date {}", amount, date_id);
        Ok(EscrowRelease {
            status: "RELEASED",
            amount,
            tx_signature: placeholder_ref("rel"),
        })
    }
}
