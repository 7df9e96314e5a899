//! Role gate: allow-list authorization.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Access denied: requires one of [{}]", join_roles(.allowed))]
    Forbidden { role: Role, allowed: Vec<Role> },
}

fn join_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

/// Authorize a role against an allow-list.
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role,
            allowed: allowed.to_vec(),
        })
    }
}

/// A route's declared set of acceptable roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    allowed: &'static [Role],
}

impl RoleGate {
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    pub fn allowed(&self) -> &'static [Role] {
        self.allowed
    }

    pub fn check(&self, role: Role) -> Result<(), AuthzError> {
        authorize(role, self.allowed)
    }
}

/// Allow-lists for every protected resource.
pub mod policy {
    use super::RoleGate;
    use crate::Role;

    /// Account registration and user administration.
    pub const USER_ADMIN: RoleGate = RoleGate::new(&[Role::Admin]);

    pub const BENEFICIARY_READ: RoleGate =
        RoleGate::new(&[Role::Admin, Role::FieldAgent, Role::MedicalStaff]);

    pub const BENEFICIARY_WRITE: RoleGate = RoleGate::new(&[Role::Admin, Role::FieldAgent]);

    pub const TRAINING_READ: RoleGate = RoleGate::new(&Role::ALL);

    pub const TRAINING_WRITE: RoleGate = RoleGate::new(&[Role::Admin, Role::Trainer]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn denial_message_names_acceptable_roles() {
        let err = policy::BENEFICIARY_WRITE.check(Role::Trainer).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access denied: requires one of [admin, field_agent]"
        );
    }

    #[test]
    fn trainer_cannot_touch_beneficiaries() {
        assert!(policy::BENEFICIARY_READ.check(Role::Trainer).is_err());
        assert!(policy::BENEFICIARY_WRITE.check(Role::Trainer).is_err());
    }

    #[test]
    fn medical_staff_reads_but_does_not_write_beneficiaries() {
        assert!(policy::BENEFICIARY_READ.check(Role::MedicalStaff).is_ok());
        assert!(policy::BENEFICIARY_WRITE.check(Role::MedicalStaff).is_err());
    }

    #[test]
    fn only_admin_administers_users() {
        for role in Role::ALL {
            assert_eq!(policy::USER_ADMIN.check(role).is_ok(), role == Role::Admin);
        }
    }

    #[test]
    fn every_role_reads_training() {
        for role in Role::ALL {
            assert!(policy::TRAINING_READ.check(role).is_ok());
        }
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        /// Property: the gate admits a role iff the allow-list contains it.
        #[test]
        fn gate_admits_exactly_the_allow_list(
            role in any_role(),
            allowed in prop::sample::subsequence(Role::ALL.to_vec(), 0..=4),
        ) {
            let decision = authorize(role, &allowed);
            prop_assert_eq!(decision.is_ok(), allowed.contains(&role));
        }
    }
}
