//! User DTOs - Data Transfer Objects per utenti

use crate::core::auth::{LOGIN_REGEX, UPPERCASE_REGEX};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credenziali inviate con USER_LOGIN e USER_LOGOUT
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Validate)]
pub struct CredentialsDTO {
    #[validate(
        length(min = 3, message = "Login must be at least 3 characters long"),
        regex(path = *LOGIN_REGEX, message = "Login can only contain letters and numbers")
    )]
    pub login: String,

    #[validate(
        length(min = 6, message = "Password must be at least 6 characters long"),
        regex(path = *UPPERCASE_REGEX, message = "Password must contain at least one uppercase letter")
    )]
    pub password: String,
}

impl CredentialsDTO {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

/// Stato di login di un utente come lo riporta il server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserStatusDTO {
    pub login: String,
    #[serde(rename = "isLogined", default)]
    pub is_logined: bool,
}

/// Riferimento ad un utente, usato per richiedere lo storico (MSG_FROM_USER)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRefDTO {
    pub login: String,
}
