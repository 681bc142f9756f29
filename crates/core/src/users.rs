//! User identity rules.

/// Canonical form of an email address: surrounding whitespace removed,
/// lowercased. Uniqueness is checked and stored on this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
