use std::net::IpAddr;

use safeaid_auth::Role;
use safeaid_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted into request extensions by the auth middleware; handlers behind
/// that middleware can rely on it being present.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: UserId,
    role: Role,
}

impl AuthContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Best-effort client address, used as the rate-limit key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClientIp(pub IpAddr);
