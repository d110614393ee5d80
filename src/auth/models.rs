//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Account role. `Stranger` is the role of anonymous guest accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Stranger,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Stranger => "stranger",
        }
    }

    /// The role on the other side of a tutoring relationship.
    pub fn counterpart(&self) -> Option<Role> {
        match self {
            Role::Student => Some(Role::Tutor),
            Role::Tutor => Some(Role::Student),
            Role::Stranger => None,
        }
    }

    /// Roles a full (non-guest) account may hold
    pub fn is_member(&self) -> bool {
        matches!(self, Role::Student | Role::Tutor)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            "stranger" | "guest" => Ok(Role::Stranger),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// User database model
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: String,
    pub is_anonymous: bool,
    pub device_fingerprint: Option<String>,
    pub created_at: String,
}

impl User {
    /// Parsed role; unknown values are treated as guests.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Stranger)
    }
}

/// User as returned to clients (no password hash)
#[derive(Serialize, Debug, Clone)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_guest: bool,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role(),
            is_guest: user.is_anonymous,
            created_at: user.created_at.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct GuestRequest {
    pub device_fingerprint: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpgradeRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
