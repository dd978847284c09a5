// security/src/context.rs
//! Who is making a request. Built once per request from a verified token and
//! handed explicitly to every operation that needs it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{Child, HospitalId, Role};

use crate::errors::{AuthError, AuthResult};
use crate::roles::{AccessPolicy, Permission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Staff {
        user_id: Uuid,
        username: String,
        role: Role,
        hospital_id: Option<HospitalId>,
    },
    /// Read-only guardian session for a single child.
    Parent { child_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub principal: Principal,
}

impl RequestContext {
    pub fn staff(user_id: Uuid, username: impl Into<String>, role: Role, hospital_id: Option<HospitalId>) -> Self {
        RequestContext {
            principal: Principal::Staff { user_id, username: username.into(), role, hospital_id },
        }
    }

    pub fn parent(child_id: Uuid) -> Self {
        RequestContext { principal: Principal::Parent { child_id } }
    }

    /// Staff identity, or `Forbidden` for portal sessions.
    pub fn require_staff(&self) -> AuthResult<(Uuid, Role)> {
        match &self.principal {
            Principal::Staff { user_id, role, .. } => Ok((*user_id, *role)),
            Principal::Parent { .. } => Err(AuthError::Forbidden("staff access required".to_string())),
        }
    }

    /// Checks the permission against `policy`. Portal sessions hold no permissions.
    pub fn authorize(&self, policy: &AccessPolicy, permission: Permission) -> AuthResult<(Uuid, Role)> {
        let (user_id, role) = self.require_staff()?;
        policy.require(role, permission)?;
        Ok((user_id, role))
    }

    /// Hospital the caller is confined to; `None` means every hospital.
    pub fn hospital_scope(&self) -> AuthResult<Option<HospitalId>> {
        match &self.principal {
            Principal::Staff { role: Role::SuperAdmin, .. } => Ok(None),
            Principal::Staff { hospital_id: Some(id), .. } => Ok(Some(*id)),
            Principal::Staff { username, .. } => {
                Err(AuthError::Forbidden(format!("user {} is not attached to a hospital", username)))
            }
            Principal::Parent { .. } => Err(AuthError::Forbidden("staff access required".to_string())),
        }
    }

    pub fn ensure_hospital(&self, hospital_id: HospitalId) -> AuthResult<()> {
        match self.hospital_scope()? {
            None => Ok(()),
            Some(own) if own == hospital_id => Ok(()),
            Some(_) => Err(AuthError::Forbidden(format!("hospital {} is outside your scope", hospital_id))),
        }
    }

    /// Staff accounts may only be created below the caller's own rank, and
    /// hospital admins only inside their hospital.
    pub fn ensure_can_assign(&self, role: Role, hospital_id: Option<HospitalId>) -> AuthResult<()> {
        let (_, own_role) = self.require_staff()?;
        if own_role == Role::SuperAdmin {
            return Ok(());
        }
        if role.rank() >= own_role.rank() {
            return Err(AuthError::Forbidden(format!("{} cannot create {} accounts", own_role, role)));
        }
        match hospital_id {
            Some(id) => self.ensure_hospital(id),
            None => Err(AuthError::Forbidden("a hospital must be given".to_string())),
        }
    }

    /// Staff may see children of their hospital; a guardian only their own child.
    pub fn ensure_child_access(&self, child: &Child) -> AuthResult<()> {
        match &self.principal {
            Principal::Parent { child_id } if *child_id == child.id => Ok(()),
            Principal::Parent { .. } => Err(AuthError::Forbidden("not your child".to_string())),
            Principal::Staff { .. } => self.ensure_hospital(child.hospital_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_confine_staff_to_own_hospital() {
        let nurse = RequestContext::staff(Uuid::new_v4(), "nurse", Role::Nurse, Some(2));
        assert_eq!(nurse.hospital_scope().unwrap(), Some(2));
        assert!(nurse.ensure_hospital(2).is_ok());
        assert!(matches!(nurse.ensure_hospital(3), Err(AuthError::Forbidden(_))));
    }

    #[test]
    fn should_let_super_admin_reach_every_hospital() {
        let admin = RequestContext::staff(Uuid::new_v4(), "root", Role::SuperAdmin, None);
        assert_eq!(admin.hospital_scope().unwrap(), None);
        assert!(admin.ensure_hospital(42).is_ok());
    }

    #[test]
    fn should_deny_staff_permissions_to_parents() {
        let parent = RequestContext::parent(Uuid::new_v4());
        let policy = AccessPolicy::default();
        assert!(matches!(parent.authorize(&policy, Permission::ViewChildren), Err(AuthError::Forbidden(_))));
        assert!(parent.hospital_scope().is_err());
    }

    #[test]
    fn should_limit_account_creation_to_lower_ranks() {
        let admin = RequestContext::staff(Uuid::new_v4(), "admin", Role::HospitalAdmin, Some(1));
        assert!(admin.ensure_can_assign(Role::Nurse, Some(1)).is_ok());
        assert!(admin.ensure_can_assign(Role::Nurse, Some(2)).is_err());
        assert!(admin.ensure_can_assign(Role::HospitalAdmin, Some(1)).is_err());
        let root = RequestContext::staff(Uuid::new_v4(), "root", Role::SuperAdmin, None);
        assert!(root.ensure_can_assign(Role::HospitalAdmin, Some(7)).is_ok());
    }

    #[test]
    fn should_check_permission_through_policy() {
        let policy = AccessPolicy::default();
        let doctor = RequestContext::staff(Uuid::new_v4(), "doc", Role::Doctor, Some(1));
        assert!(doctor.authorize(&policy, Permission::AddMedicalRecord).is_ok());
        assert!(doctor.authorize(&policy, Permission::RecordVaccination).is_err());
    }
}
