pub mod accounts;
pub mod compatibility;
pub mod dates;
pub mod matching;
pub mod onchain;
pub mod reputation;

pub use onchain::{OnchainServices, PlaceholderOnchain};
