// Security module
// PIN hashing and the login flow built on top of it.

pub mod auth;
pub mod pin;

pub use auth::{authenticate, LoginAttempts};
pub use pin::{generate_pin, hash_pin, validate_pin, verify_pin};
