//! Credential primitives.
//!
//! - [`password`] -- Argon2id password hashing, verification and length rules.

pub mod password;
