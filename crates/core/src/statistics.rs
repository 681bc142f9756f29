//! Role distribution statistics.
//!
//! A read-only aggregation over the full role list: how many roles exist,
//! how many are active, and how users spread across them.

use serde::Serialize;

/// Placeholder reported as the most popular role when there are no roles.
pub const NO_ROLE: &str = "N/A";

/// Minimal view of a role needed to compute statistics.
#[derive(Debug, Clone)]
pub struct RoleTally {
    pub name: String,
    pub user_count: i64,
    pub is_active: bool,
}

/// One entry in [`RoleStatistics::role_distribution`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleShare {
    pub role_name: String,
    pub user_count: i64,
    /// Share of all assigned users, in percent, rounded to 2 decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStatistics {
    pub total_roles: usize,
    pub active_roles: usize,
    pub total_users: i64,
    /// Ordered by user count, highest first. Ties keep input order.
    pub role_distribution: Vec<RoleShare>,
    pub most_popular_role: String,
}

/// Compute statistics over `roles` (expected in id order).
pub fn summarize(roles: &[RoleTally]) -> RoleStatistics {
    let total_users: i64 = roles.iter().map(|r| r.user_count).sum();

    let mut role_distribution: Vec<RoleShare> = roles
        .iter()
        .map(|r| RoleShare {
            role_name: r.name.clone(),
            user_count: r.user_count,
            percentage: percentage_of(r.user_count, total_users),
        })
        .collect();
    // `sort_by` is stable, so equal counts stay in id order.
    role_distribution.sort_by(|a, b| b.user_count.cmp(&a.user_count));

    let most_popular_role = role_distribution
        .first()
        .map(|r| r.role_name.clone())
        .unwrap_or_else(|| NO_ROLE.to_string());

    RoleStatistics {
        total_roles: roles.len(),
        active_roles: roles.iter().filter(|r| r.is_active).count(),
        total_users,
        role_distribution,
        most_popular_role,
    }
}

/// `part / total * 100`, rounded to 2 decimals with midpoints going to the
/// even digit; `0.0` when `total` is zero.
pub fn percentage_of(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round_ties_even() / 100.0
}
