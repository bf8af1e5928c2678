// src/domain/retention_policy.rs

//! Retention windows and the dependency-ordering tables used by the
//! soft-delete cascade and the retention purge.
//!
//! The tables are fixed at compile time and inspectable via the API; they
//! are never user-editable.

use chrono::{DateTime, Months, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Every entity kind the lifecycle engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Institution,
    Group,
    Child,
    User,
    Note,
    Message,
    Notification,
    PersonalTask,
    ClosedDay,
    CheckIn,
    FailedLogin,
    ActivityLog,
    AuditLog,
}

impl EntityKind {
    pub const ALL: [EntityKind; 13] = [
        EntityKind::Institution,
        EntityKind::Group,
        EntityKind::Child,
        EntityKind::User,
        EntityKind::Note,
        EntityKind::Message,
        EntityKind::Notification,
        EntityKind::PersonalTask,
        EntityKind::ClosedDay,
        EntityKind::CheckIn,
        EntityKind::FailedLogin,
        EntityKind::ActivityLog,
        EntityKind::AuditLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Institution => "institution",
            EntityKind::Group => "group",
            EntityKind::Child => "child",
            EntityKind::User => "user",
            EntityKind::Note => "note",
            EntityKind::Message => "message",
            EntityKind::Notification => "notification",
            EntityKind::PersonalTask => "personal_task",
            EntityKind::ClosedDay => "closed_day",
            EntityKind::CheckIn => "check_in",
            EntityKind::FailedLogin => "failed_login",
            EntityKind::ActivityLog => "activity_log",
            EntityKind::AuditLog => "audit_log",
        }
    }

    /// Kinds carrying a `deleted_at` column. The remaining kinds are pure
    /// log/attendance data whose retention clock runs on `created_at`.
    pub fn is_soft_deletable(&self) -> bool {
        !matches!(
            self,
            EntityKind::CheckIn
                | EntityKind::FailedLogin
                | EntityKind::ActivityLog
                | EntityKind::AuditLog
        )
    }

    /// Retention window in whole months, measured against `deleted_at`
    /// (soft-deletable kinds) or `created_at` (log kinds).
    pub fn retention_months(&self) -> u32 {
        match self {
            EntityKind::Institution => 24,
            EntityKind::Group => 12,
            EntityKind::Child => 60,
            EntityKind::User => 36,
            EntityKind::Note => 24,
            EntityKind::Message => 24,
            EntityKind::Notification => 6,
            EntityKind::PersonalTask => 12,
            EntityKind::ClosedDay => 12,
            EntityKind::CheckIn => 36,
            EntityKind::FailedLogin => 3,
            EntityKind::ActivityLog => 12,
            EntityKind::AuditLog => 60,
        }
    }

    /// The kind whose rows own rows of this kind, if any. Purge must erase
    /// a kind strictly before its owner.
    pub fn owner(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Group => Some(EntityKind::Institution),
            EntityKind::Child => Some(EntityKind::Group),
            EntityKind::Note => Some(EntityKind::User),
            EntityKind::Message => Some(EntityKind::User),
            EntityKind::Notification => Some(EntityKind::User),
            EntityKind::PersonalTask => Some(EntityKind::User),
            EntityKind::ClosedDay => Some(EntityKind::Institution),
            EntityKind::CheckIn => Some(EntityKind::Child),
            _ => None,
        }
    }
}

/// Hard-deletion order for the purge job: dependents strictly before
/// owners, log kinds at the end (they reference nothing that still
/// constrains them).
pub const PURGE_ORDER: [EntityKind; 13] = [
    EntityKind::CheckIn,
    EntityKind::Note,
    EntityKind::Message,
    EntityKind::Notification,
    EntityKind::PersonalTask,
    EntityKind::Child,
    EntityKind::Group,
    EntityKind::ClosedDay,
    EntityKind::User,
    EntityKind::Institution,
    EntityKind::FailedLogin,
    EntityKind::ActivityLog,
    EntityKind::AuditLog,
];

/// Soft-delete mark order for an institution cascade: owners before
/// dependents, so a half-marked tree is never reachable through a live
/// parent.
pub const INSTITUTION_CASCADE_ORDER: [EntityKind; 3] =
    [EntityKind::Institution, EntityKind::Group, EntityKind::Child];

/// A single retention policy row as exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub entity_type: EntityKind,
    pub retention_months: u32,
    pub measured_against: &'static str,
}

/// Static registry: one entry per entity kind, fixed at process start.
static REGISTRY: Lazy<Vec<RetentionPolicy>> = Lazy::new(|| {
    EntityKind::ALL
        .iter()
        .map(|kind| RetentionPolicy {
            entity_type: *kind,
            retention_months: kind.retention_months(),
            measured_against: if kind.is_soft_deletable() {
                "deleted_at"
            } else {
                "created_at"
            },
        })
        .collect()
});

pub fn retention_policies() -> Vec<RetentionPolicy> {
    REGISTRY.clone()
}

/// Cutoff instant for a kind: rows stamped before this are past their
/// retention window.
pub fn retention_cutoff(
    kind: EntityKind,
    now: DateTime<Utc>,
    override_months: Option<u32>,
) -> DateTime<Utc> {
    let months = override_months.unwrap_or_else(|| kind.retention_months());
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_kind_has_exactly_one_policy_entry() {
        let policies = retention_policies();
        assert_eq!(policies.len(), EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let matching = policies
                .iter()
                .filter(|p| p.entity_type == kind)
                .count();
            assert_eq!(matching, 1, "{} must appear once", kind.as_str());
            assert!(kind.retention_months() > 0);
        }
    }

    #[test]
    fn purge_order_erases_dependents_before_owners() {
        let position = |kind: EntityKind| {
            PURGE_ORDER
                .iter()
                .position(|k| *k == kind)
                .unwrap_or_else(|| panic!("{} missing from purge order", kind.as_str()))
        };
        for kind in EntityKind::ALL {
            if let Some(owner) = kind.owner() {
                assert!(
                    position(kind) < position(owner),
                    "{} must be purged before its owner {}",
                    kind.as_str(),
                    owner.as_str()
                );
            }
        }
    }

    #[test]
    fn purge_order_covers_every_kind_once() {
        for kind in EntityKind::ALL {
            assert_eq!(PURGE_ORDER.iter().filter(|k| **k == kind).count(), 1);
        }
    }

    #[test]
    fn cascade_order_marks_owners_before_dependents() {
        let position = |kind: EntityKind| {
            INSTITUTION_CASCADE_ORDER
                .iter()
                .position(|k| *k == kind)
                .unwrap()
        };
        assert!(position(EntityKind::Institution) < position(EntityKind::Group));
        assert!(position(EntityKind::Group) < position(EntityKind::Child));
    }

    #[test]
    fn cutoff_subtracts_whole_months() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let cutoff = retention_cutoff(EntityKind::Notification, now, None);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap());

        let overridden = retention_cutoff(EntityKind::Notification, now, Some(1));
        assert_eq!(
            overridden,
            Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap()
        );
    }
}
