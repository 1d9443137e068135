//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number (E.164)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{9,14}$").expect("valid E.164 pattern"));

// Ten-digit national mobile number without country code
static NATIONAL_MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[6-9]\d{9}$").expect("valid national mobile pattern"));

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Check if a phone number is acceptable at the request boundary.
///
/// Either an E.164 number or a ten-digit national mobile number.
pub fn is_valid_phone(phone: &str) -> bool {
    let normalized = normalize_phone_number(phone);
    INTERNATIONAL_PHONE_REGEX.is_match(&normalized) || NATIONAL_MOBILE_REGEX.is_match(&normalized)
}

/// Mask a phone number for logs (e.g., +91******9999)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() <= 4 {
        return "*".repeat(normalized.len());
    }

    let visible = &normalized[normalized.len() - 4..];
    if let Some(rest) = normalized.strip_prefix('+') {
        let prefix_len = rest.len().saturating_sub(4).min(2);
        let hidden = rest.len() - 4 - prefix_len;
        format!("+{}{}{}", &rest[..prefix_len], "*".repeat(hidden), visible)
    } else {
        format!("{}{}", "*".repeat(normalized.len() - 4), visible)
    }
}
