//! Well-known roles and role-name rules.
//!
//! The seed constants must match `crates/db/migrations/*_create_roles_table.sql`.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::DbId;

pub const ROLE_ADMINISTRATOR_ID: DbId = 1;
pub const ROLE_TEAM_LEADER_ID: DbId = 2;
pub const ROLE_TEAM_MEMBER_ID: DbId = 3;

/// Role assigned to users that were not placed on a team.
pub const ROLE_WITHOUT_TEAM_ID: DbId = 4;

pub const ROLE_WITHOUT_TEAM: &str = "User without Team";

/// Seeded roles as `(id, name)`, in id order.
pub const SEED_ROLES: [(DbId, &str); 4] = [
    (ROLE_ADMINISTRATOR_ID, "Administrator"),
    (ROLE_TEAM_LEADER_ID, "Team Leader"),
    (ROLE_TEAM_MEMBER_ID, "Team Member"),
    (ROLE_WITHOUT_TEAM_ID, ROLE_WITHOUT_TEAM),
];

pub const MIN_ROLE_NAME_LENGTH: usize = 2;
pub const MAX_ROLE_NAME_LENGTH: usize = 100;

/// ASCII letters, Latin-1 accented letters and whitespace.
const ROLE_NAME_PATTERN: &str = r"^[a-zA-ZÀ-ÿñÑ\s]+$";

static ROLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ROLE_NAME_PATTERN).expect("valid regex"));

/// Canonical form of a role name before validation and storage.
pub fn normalize_role_name(name: &str) -> String {
    name.trim().to_string()
}

/// Whether `name` only contains characters allowed in a role name.
pub fn has_valid_role_name_chars(name: &str) -> bool {
    ROLE_NAME_RE.is_match(name)
}

/// Validate an already-normalized role name.
///
/// Returns an empty `Vec` if valid; otherwise a list of human-readable errors.
pub fn validate_role_name(name: &str) -> Vec<String> {
    if name.is_empty() {
        return vec!["Role name is required".to_string()];
    }

    let mut errors = Vec::new();

    let len = name.chars().count();
    if !(MIN_ROLE_NAME_LENGTH..=MAX_ROLE_NAME_LENGTH).contains(&len) {
        errors.push(format!(
            "Role name must be between {MIN_ROLE_NAME_LENGTH} and {MAX_ROLE_NAME_LENGTH} characters"
        ));
    }

    if !has_valid_role_name_chars(name) {
        errors.push("Role name may only contain letters and spaces".to_string());
    }

    errors
}
