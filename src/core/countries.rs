//! Country codes accepted in a foreign identification (`IDOtro`).
//!
//! The protocol restricts this field to EU member states plus a few extra
//! codes (`EL` for Greece, `GB`, and `XI` for Northern Ireland).

/// Check whether `code` is an accepted country code (upper-case).
pub fn is_allowed_country_code(code: &str) -> bool {
    ALLOWED_COUNTRY_CODES.binary_search(&code).is_ok()
}

/// Accepted country codes (29 entries). Sorted for binary search.
static ALLOWED_COUNTRY_CODES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "EL", "ES", "FI", "FR", "GB", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK", "XI",
];
