//! Address canonicalization
//!
//! Equivalent spellings of an address ("12 Main St.", "12  main street")
//! normalize to the same string, so cache keys and location comparisons
//! agree.

use fieldops_core::error::{FieldopsError, Result};

/// Street-type abbreviations and their expansions
const STREET_TYPES: &[(&str, &str)] = &[
    ("st", "street"),
    ("ave", "avenue"),
    ("dr", "drive"),
    ("rd", "road"),
    ("blvd", "boulevard"),
    ("ct", "court"),
    ("crt", "court"),
    ("pl", "place"),
    ("cres", "crescent"),
    ("hwy", "highway"),
];

const MAX_ADDRESS_LEN: usize = 500;

/// Canonicalize a free-text address
///
/// Lower-cases, trims, collapses whitespace, and expands street-type
/// abbreviations. A trailing period on an abbreviation is dropped; trailing
/// commas are kept. The result is a fixed point: normalizing it again
/// returns it unchanged.
pub fn normalize(address: &str) -> String {
    address
        .split_whitespace()
        .map(|token| expand_token(&token.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn expand_token(token: &str) -> String {
    let word = token.trim_end_matches(['.', ',']);
    let Some(expansion) = lookup(word) else {
        return token.to_string();
    };
    let trailing: String = token[word.len()..].chars().filter(|c| *c == ',').collect();
    format!("{}{}", expansion, trailing)
}

fn lookup(word: &str) -> Option<&'static str> {
    STREET_TYPES.iter().find(|(short, _)| *short == word).map(|(_, full)| *full)
}

/// Whether two addresses refer to the same place after normalization
pub fn addresses_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Reject addresses that cannot be routed
pub fn validate_address(address: &str) -> Result<()> {
    let reason = if address.trim().is_empty() {
        Some("address is empty")
    } else if address.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        Some("address contains control characters")
    } else if address.len() > MAX_ADDRESS_LEN {
        Some("address is too long")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(FieldopsError::InvalidAddress {
            address: address.chars().take(80).collect(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
