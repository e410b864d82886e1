use chrono::{DateTime, Utc};
use secflow_core::{Permission, Role};
use serde::Serialize;

use crate::claims::{Claims, TokenKind};

/// Identity derived from a verified token. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject_id: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub token_id: String,
    pub kind: TokenKind,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    /// Permissions from `required` this principal lacks.
    pub fn missing_permissions(&self, required: &[Permission]) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|p| !self.has_permission(*p))
            .collect()
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            role: claims.role,
            permissions: claims.permissions,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
            issued_at: DateTime::from_timestamp(claims.iat, 0).unwrap_or_default(),
            token_id: claims.jti,
            kind: claims.kind,
        }
    }
}
