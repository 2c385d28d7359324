//! Session Store - Archivio chiave/valore delle credenziali della sessione
//!
//! Vive quanto il processo (l'equivalente della scheda del browser).
//! Le credenziali sono tenute in chiaro: servono per il re-login e per USER_LOGOUT.

use crate::dtos::CredentialsDTO;
use std::collections::HashMap;
use tracing::debug;

pub const TOKEN_KEY: &str = "token";
pub const LOGIN_KEY: &str = "login";
pub const PASSWORD_KEY: &str = "password";

#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    items: HashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) {
        debug!(key, "Session item stored");
        self.items.insert(key.to_string(), value.into());
    }

    pub fn remove_item(&mut self, key: &str) -> Option<String> {
        self.items.remove(key)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Salva token, login e password dopo un USER_LOGIN riuscito
    pub fn store_login(&mut self, token: String, credentials: &CredentialsDTO) {
        self.set_item(TOKEN_KEY, token);
        self.set_item(LOGIN_KEY, credentials.login.clone());
        self.set_item(PASSWORD_KEY, credentials.password.clone());
    }

    pub fn login(&self) -> Option<&str> {
        self.get_item(LOGIN_KEY)
    }

    /// Credenziali salvate, solo se login e password sono entrambi presenti
    pub fn credentials(&self) -> Option<CredentialsDTO> {
        match (self.get_item(LOGIN_KEY), self.get_item(PASSWORD_KEY)) {
            (Some(login), Some(password)) => Some(CredentialsDTO::new(login, password)),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_item(TOKEN_KEY).is_some()
    }

    /// Rimuove le tre chiavi della sessione
    pub fn forget_login(&mut self) {
        self.remove_item(TOKEN_KEY);
        self.remove_item(LOGIN_KEY);
        self.remove_item(PASSWORD_KEY);
    }
}
