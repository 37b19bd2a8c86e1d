// =============================================================================
// DineTime Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// COMPATIBILITY SCORING
// =============================================================================

/// Points when both users fall inside each other's age range
pub const AGE_MATCH_POINTS: u32 = 20;

/// Points per direction when a gender matches the other user's preference
pub const GENDER_MATCH_POINTS: u32 = 15;

/// Points per direction when a sybil score clears the other user's threshold
pub const SYBIL_MATCH_POINTS: u32 = 10;

/// Points per NFT collection held by both users
pub const SHARED_COLLECTION_POINTS: u32 = 15;

/// Points per cultural alignment tag shared by both users
pub const SHARED_CULTURE_POINTS: u32 = 10;

/// Points per DeFi activity tag shared by both users
pub const SHARED_DEFI_POINTS: u32 = 8;

/// Upper bound of the compatibility score
pub const MAX_COMPATIBILITY_SCORE: u32 = 100;

/// Sybil threshold applied when a user has not set one
pub const DEFAULT_MIN_SYBIL_SCORE: f64 = 0.7;

/// Gender preference value that accepts every gender
pub const ANY_GENDER: &str = "any";

// =============================================================================
// MATCH SUGGESTIONS
// =============================================================================

/// Candidates must score strictly above this to be suggested
pub const MIN_SUGGESTION_SCORE: i32 = 30;

/// Default page size for suggestions
pub const DEFAULT_SUGGESTION_LIMIT: i64 = 10;

/// Largest page size a client may request
pub const MAX_SUGGESTION_LIMIT: i64 = 50;

// =============================================================================
// PROFILE VALIDATION
// =============================================================================

/// Youngest age accepted in profiles and preferences
pub const MIN_USER_AGE: i32 = 18;

/// Oldest age accepted in profiles and preferences
pub const MAX_USER_AGE: i32 = 100;

/// Username length bounds (in characters)
pub const MIN_USERNAME_LENGTH: usize = 2;
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Max distance preference bounds (km)
pub const MIN_MAX_DISTANCE: i32 = 1;
pub const MAX_MAX_DISTANCE: i32 = 500;

/// Accepted gender preferences
pub const GENDER_PREFERENCES: [&str; 4] = ["male", "female", "non-binary", ANY_GENDER];

/// Trait keys users may weight or avoid
pub const VALID_TRAITS: [&str; 16] = [
    "HAS_MAD_LADS",
    "BONK_HOLDER",
    "JUP_HOLDER",
    "RAY_HOLDER",
    "DEFI_USER",
    "NFT_TRADER",
    "GAMING_NFT_HOLDER",
    "ART_NFT_HOLDER",
    "MEME_COIN_HOLDER",
    "GOVERNANCE_PARTICIPANT",
    "AIRDROP_RECEIVER",
    "HIGH_ACTIVITY",
    "LOW_RISK",
    "HIGH_RISK",
    "DAY_TRADER",
    "HODLER",
];

// =============================================================================
// DATES
// =============================================================================

/// How far (in minutes) a verification may be from the scheduled time
pub const DATE_VERIFICATION_WINDOW_MINUTES: i64 = 120;

/// How close (in meters) a participant must be to the venue
pub const DATE_VERIFICATION_RADIUS_METERS: f64 = 100.0;

/// Escrow amount (SOL) locked when a date is confirmed
pub const DATE_ESCROW_AMOUNT_SOL: f64 = 0.1;

/// Base URL for calendar subscriptions of confirmed dates
pub const CALENDAR_EVENT_BASE_URL: &str = "webcal://dates.dinetimeyt.com/event";

/// Earth's mean radius used by the haversine distance
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// WALLET REPUTATION
// =============================================================================

/// Starting point of the live reputation before any wallet factor
pub const REPUTATION_BASE: f64 = 0.5;

/// Added once for wallets older than each of these ages (days)
pub const REPUTATION_AGE_THRESHOLDS_DAYS: [f64; 2] = [365.0, 730.0];
pub const REPUTATION_AGE_BONUS: f64 = 0.1;

/// Per-item weight and cap for NFT holdings
pub const REPUTATION_NFT_WEIGHT: f64 = 0.02;
pub const REPUTATION_NFT_CAP: f64 = 0.2;

/// Per-protocol weight and cap for DeFi activity
pub const REPUTATION_DEFI_WEIGHT: f64 = 0.05;
pub const REPUTATION_DEFI_CAP: f64 = 0.15;

/// Per-airdrop weight and cap
pub const REPUTATION_AIRDROP_WEIGHT: f64 = 0.03;
pub const REPUTATION_AIRDROP_CAP: f64 = 0.1;

/// Penalty per rug pull and its cap
pub const REPUTATION_RUG_PENALTY: f64 = 0.1;
pub const REPUTATION_RUG_PENALTY_CAP: f64 = 0.3;

// =============================================================================
// IDENTITY
// =============================================================================

/// Request header carrying the caller's wallet address
pub const WALLET_HEADER: &str = "x-solana-address";

/// Solana address length bounds (base58 characters)
pub const MIN_SOLANA_ADDRESS_LENGTH: usize = 32;
pub const MAX_SOLANA_ADDRESS_LENGTH: usize = 44;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default database pool size
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
