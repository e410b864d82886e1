//! Roles, permissions and the grant table linking them.
//!
//! Permissions are derived from the role when a token is issued and carried
//! inside the access token, so guards never consult the table at request
//! time.
//!
//! # Example
//!
//! ```ignore
//! use secflow_core::permissions::{Permission, Role};
//!
//! let role: Role = "editor".parse()?;
//! assert!(role.permissions().contains(&Permission::WriteItems));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[serde(alias = "admin", alias = "Admin")]
    Admin,
    #[serde(alias = "editor", alias = "Editor")]
    Editor,
    #[serde(alias = "user", alias = "User")]
    User,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::User => "USER",
        }
    }

    /// Permissions granted to this role.
    pub const fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::ReadItems,
                Permission::WriteItems,
                Permission::ReadData,
            ],
            Role::Editor => &[Permission::ReadItems, Permission::WriteItems],
            Role::User => &[Permission::ReadItems],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "EDITOR" => Ok(Role::Editor),
            "USER" => Ok(Role::User),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ReadItems,
    WriteItems,
    ReadData,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadItems => "READ_ITEMS",
            Permission::WriteItems => "WRITE_ITEMS",
            Permission::ReadData => "READ_DATA",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
