//! Address sanitation for receipt generation.
//!
//! Addresses are printed verbatim on receipts and in the download filename,
//! so only plain ASCII letters, digits, spaces and `.,-#/` are accepted.
//! Full-width punctuation typed from a CJK keyboard (`，` in particular) is the
//! usual culprit.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

const ALLOWED_PATTERN: &str = r"^[A-Za-z0-9 .,\-#/]+$";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Address cannot be empty")]
    EmptyInput,

    #[error(
        "Address may only contain English letters, digits, spaces and .,-#/ \
         (found '{found}'; check for full-width punctuation such as '，')"
    )]
    InvalidCharacters { found: char },
}

fn allowed() -> &'static Regex {
    static ALLOWED: OnceLock<Regex> = OnceLock::new();
    ALLOWED.get_or_init(|| Regex::new(ALLOWED_PATTERN).expect("address pattern is valid"))
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | ',' | '-' | '#' | '/')
}

/// Validates a customer address.
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    if address.trim().is_empty() {
        return Err(AddressError::EmptyInput);
    }
    if allowed().is_match(address) {
        return Ok(());
    }
    // The regex said no; report the first character that caused it.
    let found = address
        .chars()
        .find(|c| !is_allowed_char(*c))
        .unwrap_or('?');
    Err(AddressError::InvalidCharacters { found })
}
