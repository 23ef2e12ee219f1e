use log::debug;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::BankError;

/// Number of digits in a PIN
pub const PIN_LENGTH: usize = 4;

/// Length of a hex encoded SHA-256 digest
pub const DIGEST_LENGTH: usize = 64;

/// Check that a PIN is exactly four ASCII digits
pub fn validate_pin(pin: &str) -> Result<(), BankError> {
    let pin_regex = Regex::new(r"^[0-9]{4}$")
        .map_err(|e| BankError::validation(format!("Regex error: {}", e)))?;

    if !pin_regex.is_match(pin) {
        return Err(BankError::validation(format!(
            "Invalid PIN. It must be exactly {} digits.",
            PIN_LENGTH
        )));
    }

    Ok(())
}

/// Hash a PIN to a hex SHA-256 digest.
///
/// No salt is applied, so equal PINs produce equal digests across accounts.
pub fn hash_pin(pin: &str) -> Result<String, BankError> {
    validate_pin(pin)?;

    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a PIN against a stored digest
pub fn verify_pin(pin: &str, digest: &str) -> bool {
    match hash_pin(pin) {
        Ok(candidate) => candidate == digest,
        Err(_) => {
            debug!("Rejecting malformed PIN without hashing");
            false
        }
    }
}

/// Generate a random four digit PIN
pub fn generate_pin() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}
