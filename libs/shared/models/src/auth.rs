use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub squad_id: String,
    pub user_type: UserType,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Doctor,
    Patient,
    Admin,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Doctor => write!(f, "doctor"),
            UserType::Patient => write!(f, "patient"),
            UserType::Admin => write!(f, "admin"),
        }
    }
}

/// The authenticated actor of a request.
///
/// Passed explicitly to every scoped store call and visibility check; an absent
/// principal (`Option::None`) is the unauthenticated context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub squad_id: Uuid,
    pub user_type: UserType,
}

impl Principal {
    pub fn new(id: Uuid, squad_id: Uuid, user_type: UserType) -> Self {
        Self { id, squad_id, user_type }
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: Uuid,
    pub squad_id: Uuid,
    pub user_type: UserType,
}
