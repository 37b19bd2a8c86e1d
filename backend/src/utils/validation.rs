use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::constants::*;

static SOLANA_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^[1-9A-HJ-NP-Za-km-z]{{{},{}}}$",
        MIN_SOLANA_ADDRESS_LENGTH, MAX_SOLANA_ADDRESS_LENGTH
    ))
    .expect("static solana address pattern")
});

/// Validates if a string looks like a base58 Solana address
pub fn is_valid_solana_address(address: &str) -> bool {
    SOLANA_ADDRESS_RE.is_match(address)
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn check_range<T: PartialOrd>(&mut self, value: Option<T>, min: T, max: T, field: &str, message: &str) {
        if let Some(value) = value {
            self.check(value >= min && value <= max, field, message);
        }
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Parses an optional integer query parameter, recording a field error when
/// the value is not a number.
pub fn parse_int_param(validator: &mut Validator, raw: Option<&str>, field: &str, message: &str) -> Option<i64> {
    let raw = raw?.trim();
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            validator.push(field, message);
            None
        }
    }
}
