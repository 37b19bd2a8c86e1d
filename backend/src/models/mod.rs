pub mod dates;
pub mod matches;
pub mod users;

pub use dates::{DateStatus, DateSuggestion, LocationType};
pub use matches::{Match, MatchStatus, PairKey};
pub use users::{Preferences, User, UserProfile, VerificationStatus, WalletAnalysis};
