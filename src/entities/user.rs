//! User entity - Entità utente del roster

use serde::{Deserialize, Serialize};

/// Utente noto al client. L'identità è il login.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub online: bool,
}

impl User {
    pub fn new(login: impl Into<String>, online: bool) -> Self {
        Self {
            login: login.into(),
            online,
        }
    }

    /// Etichetta di presenza mostrata nel roster e nell'header del dialogo
    pub fn presence_label(&self) -> &'static str {
        if self.online { "Online" } else { "Offline" }
    }
}
