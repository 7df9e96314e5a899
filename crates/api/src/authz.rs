//! Route-level role gate.
//!
//! Handlers call [`require`] before touching the request body, so a caller
//! outside the allow-list is refused whatever the payload looks like.

use tracing::warn;

use safeaid_auth::RoleGate;

use crate::app::errors::ApiError;
use crate::context::AuthContext;

pub fn require(ctx: &AuthContext, gate: RoleGate) -> Result<(), ApiError> {
    gate.check(ctx.role()).map_err(|e| {
        warn!(user_id = %ctx.user_id(), role = %ctx.role(), "role gate denied");
        ApiError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeaid_auth::{policy, Role};
    use safeaid_core::UserId;

    #[test]
    fn trainer_cannot_write_beneficiaries() {
        let ctx = AuthContext::new(UserId::new(), Role::Trainer);
        assert!(matches!(
            require(&ctx, policy::BENEFICIARY_WRITE),
            Err(ApiError::Forbidden(_))
        ));
        assert!(require(&ctx, policy::TRAINING_WRITE).is_ok());
    }

    #[test]
    fn medical_staff_reads_but_does_not_write() {
        let ctx = AuthContext::new(UserId::new(), Role::MedicalStaff);
        assert!(require(&ctx, policy::BENEFICIARY_READ).is_ok());
        assert!(require(&ctx, policy::BENEFICIARY_WRITE).is_err());
        assert!(require(&ctx, policy::USER_ADMIN).is_err());
    }
}
