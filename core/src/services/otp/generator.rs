//! Numeric OTP generation

use pa_shared::config::MAX_OTP_LENGTH;
use rand::{rngs::OsRng, Rng};

use crate::errors::{DomainError, DomainResult};

/// Generate a decimal code of exactly `length` digits using the OS CSPRNG.
///
/// A single digit is drawn from `0..=9`. Longer codes are drawn from
/// `10^(n-1)..=10^n - 1`, so they never start with zero.
pub fn generate_code(length: u32) -> DomainResult<String> {
    if length == 0 || length > MAX_OTP_LENGTH {
        return Err(DomainError::Validation {
            message: format!("OTP length must be between 1 and {}", MAX_OTP_LENGTH),
        });
    }

    let (low, high) = if length == 1 {
        (0u64, 9u64)
    } else {
        (10u64.pow(length - 1), 10u64.pow(length) - 1)
    };

    Ok(OsRng.gen_range(low..=high).to_string())
}
