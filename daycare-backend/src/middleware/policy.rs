// src/middleware/policy.rs

//! Closed role/action/scope rule table, consumed by every GDPR handler
//! instead of per-endpoint role comparisons.

use crate::domain::role::UserRole;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use uuid::Uuid;

/// Every privileged operation of the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    SoftDelete,
    TriggerPurge,
    ViewAuditLogs,
    ViewPendingDeletions,
    ViewRetentionPolicies,
    CreateDeletionRequest,
    ReviewDeletionRequests,
    ExportUserData,
    ViewCompliance,
    VerifyBackup,
}

/// The rule table. Roles not listed for an action are denied.
pub fn is_allowed(role: UserRole, action: PolicyAction) -> bool {
    use PolicyAction::*;
    use UserRole::*;

    match action {
        SoftDelete => matches!(role, Admin | SuperAdmin),
        TriggerPurge => matches!(role, SuperAdmin),
        ViewAuditLogs => matches!(role, SuperAdmin),
        ViewPendingDeletions => matches!(role, SuperAdmin),
        ViewRetentionPolicies => matches!(role, Admin | SuperAdmin),
        // Any authenticated user may request deletion of their own
        // account; the self-or-admin distinction is applied at the call
        // site via `require_self_or_admin`.
        CreateDeletionRequest => true,
        ReviewDeletionRequests => matches!(role, Admin | SuperAdmin),
        ExportUserData => true,
        ViewCompliance => matches!(role, Admin | SuperAdmin),
        VerifyBackup => matches!(role, SuperAdmin),
    }
}

pub fn require(user: &AuthenticatedUser, action: PolicyAction) -> AppResult<()> {
    if is_allowed(user.role, action) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "Role {} may not perform this operation",
        user.role.as_str()
    )))
}

/// Institution-scope boundary: SUPER_ADMIN acts anywhere; ADMIN only
/// within its own institution.
pub fn require_institution_scope(
    user: &AuthenticatedUser,
    institution_id: Option<Uuid>,
) -> AppResult<()> {
    if user.is_super_admin() {
        return Ok(());
    }
    if user.role == UserRole::Admin
        && user.institution_id.is_some()
        && user.institution_id == institution_id
    {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Operation is outside your institution scope".to_string(),
    ))
}

/// Self-service operations: the target must be the caller, unless the
/// caller holds an admin role.
pub fn require_self_or_admin(user: &AuthenticatedUser, target_user_id: Uuid) -> AppResult<()> {
    if user.user_id == target_user_id || user.is_admin() {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "You may only perform this operation on your own account".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, institution_id: Option<Uuid>) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            role,
            institution_id,
        }
    }

    #[test]
    fn only_super_admin_runs_purge_and_sees_audit_logs() {
        for action in [
            PolicyAction::TriggerPurge,
            PolicyAction::ViewAuditLogs,
            PolicyAction::ViewPendingDeletions,
            PolicyAction::VerifyBackup,
        ] {
            assert!(is_allowed(UserRole::SuperAdmin, action));
            assert!(!is_allowed(UserRole::Admin, action));
            assert!(!is_allowed(UserRole::Educator, action));
            assert!(!is_allowed(UserRole::Parent, action));
        }
    }

    #[test]
    fn admins_manage_deletions_but_parents_do_not() {
        for action in [
            PolicyAction::SoftDelete,
            PolicyAction::ReviewDeletionRequests,
            PolicyAction::ViewCompliance,
            PolicyAction::ViewRetentionPolicies,
        ] {
            assert!(is_allowed(UserRole::Admin, action));
            assert!(is_allowed(UserRole::SuperAdmin, action));
            assert!(!is_allowed(UserRole::Parent, action));
            assert!(!is_allowed(UserRole::Educator, action));
        }
    }

    #[test]
    fn institution_scope_binds_admins_only() {
        let institution = Uuid::new_v4();
        let other = Uuid::new_v4();

        let super_admin = user(UserRole::SuperAdmin, None);
        assert!(require_institution_scope(&super_admin, Some(other)).is_ok());

        let admin = user(UserRole::Admin, Some(institution));
        assert!(require_institution_scope(&admin, Some(institution)).is_ok());
        assert!(require_institution_scope(&admin, Some(other)).is_err());
        assert!(require_institution_scope(&admin, None).is_err());

        let educator = user(UserRole::Educator, Some(institution));
        assert!(require_institution_scope(&educator, Some(institution)).is_err());
    }

    #[test]
    fn self_or_admin_gate() {
        let parent = user(UserRole::Parent, None);
        assert!(require_self_or_admin(&parent, parent.user_id).is_ok());
        assert!(require_self_or_admin(&parent, Uuid::new_v4()).is_err());

        let admin = user(UserRole::Admin, None);
        assert!(require_self_or_admin(&admin, Uuid::new_v4()).is_ok());
    }
}
