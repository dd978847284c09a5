// security/src/roles.rs
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use models::Role;

use crate::errors::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    RegisterChild,
    RecordVaccination,
    AddMedicalRecord,
    ViewChildren,
    ViewReports,
    ManageVaccines,
    ManageStaff,
    SendReminders,
    ManageHospitals,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::RegisterChild,
        Permission::RecordVaccination,
        Permission::AddMedicalRecord,
        Permission::ViewChildren,
        Permission::ViewReports,
        Permission::ManageVaccines,
        Permission::ManageStaff,
        Permission::SendReminders,
        Permission::ManageHospitals,
    ];
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Permission::RegisterChild => "register_child",
            Permission::RecordVaccination => "record_vaccination",
            Permission::AddMedicalRecord => "add_medical_record",
            Permission::ViewChildren => "view_children",
            Permission::ViewReports => "view_reports",
            Permission::ManageVaccines => "manage_vaccines",
            Permission::ManageStaff => "manage_staff",
            Permission::SendReminders => "send_reminders",
            Permission::ManageHospitals => "manage_hospitals",
        };
        write!(f, "{}", name)
    }
}

/// Grants access to roles ranked at least `min_role`, plus any role listed
/// in `roles`. An empty rule grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRule {
    pub min_role: Option<Role>,
    pub roles: Vec<Role>,
}

impl AccessRule {
    pub fn at_least(role: Role) -> Self {
        AccessRule { min_role: Some(role), roles: Vec::new() }
    }

    pub fn one_of(roles: &[Role]) -> Self {
        AccessRule { min_role: None, roles: roles.to_vec() }
    }

    pub fn union(min_role: Role, roles: &[Role]) -> Self {
        AccessRule { min_role: Some(min_role), roles: roles.to_vec() }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.min_role.is_some_and(|min| role.rank() >= min.rank()) || self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    rules: HashMap<Permission, AccessRule>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let rules = HashMap::from([
            (Permission::RegisterChild, AccessRule::at_least(Role::Nurse)),
            (Permission::RecordVaccination, AccessRule::one_of(&[Role::Nurse])),
            (Permission::AddMedicalRecord, AccessRule::one_of(&[Role::Doctor, Role::Nurse])),
            (Permission::ViewChildren, AccessRule::at_least(Role::Nurse)),
            (Permission::ViewReports, AccessRule::at_least(Role::Doctor)),
            (Permission::ManageVaccines, AccessRule::at_least(Role::HospitalAdmin)),
            (Permission::ManageStaff, AccessRule::at_least(Role::HospitalAdmin)),
            (Permission::SendReminders, AccessRule::at_least(Role::HospitalAdmin)),
            (Permission::ManageHospitals, AccessRule::one_of(&[Role::SuperAdmin])),
        ]);
        AccessPolicy { rules }
    }
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    permissions: HashMap<Permission, AccessRule>,
}

impl AccessPolicy {
    /// Default policy with the rules found in `path` replacing their defaults.
    pub fn from_yaml_file(path: &Path) -> AuthResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AuthError::PolicyError(format!("cannot read {}: {}", path.display(), e)))?;
        let policy = Self::from_yaml_str(&content)?;
        info!("Loaded access policy overrides from {}", path.display());
        Ok(policy)
    }

    pub fn from_yaml_str(content: &str) -> AuthResult<Self> {
        let file: PolicyFile =
            serde_yaml::from_str(content).map_err(|e| AuthError::PolicyError(e.to_string()))?;
        let mut policy = AccessPolicy::default();
        policy.rules.extend(file.permissions);
        Ok(policy)
    }

    pub fn rule(&self, permission: Permission) -> Option<&AccessRule> {
        self.rules.get(&permission)
    }

    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.rule(permission).is_some_and(|rule| rule.allows(role))
    }

    pub fn require(&self, role: Role, permission: Permission) -> AuthResult<()> {
        if self.allows(role, permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!("role {} lacks permission {}", role, permission)))
        }
    }
}
