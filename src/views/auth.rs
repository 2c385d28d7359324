//! Auth view - Form di login su terminale
//!
//! Il form chiede prima il login e poi la password, mostrando l'errore di
//! validazione del campo finché il valore non è accettabile.

use crate::core::{login_error, password_error};
use crate::dtos::CredentialsDTO;
use std::fmt;

pub const TITLE: &str = "Login to Fun Chat";
pub const CONNECTION_FAILED: &str = "Connection to server failed";
pub const NOT_LOGGED_IN: &str = "Authentication failed: user not logged in";
pub const DEFAULT_SERVER_ERROR: &str = "Authentication failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    Login,
    Password,
    /// USER_LOGIN inviato, in attesa della risposta
    Waiting,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub login: String,
    pub password: String,
    pub login_error: Option<&'static str>,
    pub password_error: Option<&'static str>,
    pub server_error: Option<String>,
    pub step: AuthStep,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthForm {
    pub fn new() -> Self {
        Self {
            login: String::new(),
            password: String::new(),
            login_error: None,
            password_error: None,
            server_error: None,
            step: AuthStep::Login,
        }
    }

    /// Aggiorna il login; passa alla password solo se il valore è valido
    pub fn set_login(&mut self, value: &str) {
        self.login = value.to_string();
        self.login_error = login_error(value);
        self.server_error = None;
        if self.login_error.is_none() {
            self.step = AuthStep::Password;
        }
    }

    /// Torna alla richiesta del login tenendo il valore già scritto
    pub fn back_to_login(&mut self) {
        self.password.clear();
        self.password_error = None;
        self.server_error = None;
        self.step = AuthStep::Login;
    }

    pub fn set_password(&mut self, value: &str) {
        self.password = value.to_string();
        self.password_error = password_error(value);
        self.server_error = None;
    }

    /// Equivalente del pulsante di login abilitato
    pub fn can_submit(&self) -> bool {
        !self.login.is_empty()
            && !self.password.is_empty()
            && login_error(&self.login).is_none()
            && password_error(&self.password).is_none()
    }

    pub fn credentials(&self) -> CredentialsDTO {
        CredentialsDTO::new(self.login.clone(), self.password.clone())
    }

    pub fn start_waiting(&mut self) {
        self.step = AuthStep::Waiting;
        self.server_error = None;
    }

    pub fn is_waiting(&self) -> bool {
        self.step == AuthStep::Waiting
    }

    /// Login fallito: mostra l'errore e riparte dalla richiesta del login
    pub fn fail(&mut self, error: impl Into<String>) {
        self.server_error = Some(error.into());
        self.password.clear();
        self.step = AuthStep::Login;
    }

    pub fn prompt(&self) -> &'static str {
        match self.step {
            AuthStep::Login => "Login:",
            AuthStep::Password => "Password (empty line to change login):",
            AuthStep::Waiting => "Logging in...",
        }
    }
}

impl fmt::Display for AuthForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = self.login_error {
            writeln!(f, "! {}", err)?;
        }
        if self.step != AuthStep::Login {
            if let Some(err) = self.password_error {
                writeln!(f, "! {}", err)?;
            }
        }
        if let Some(err) = &self.server_error {
            writeln!(f, "! {}", err)?;
        }
        write!(f, "{}", self.prompt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_advances_only_on_valid_login() {
        let mut form = AuthForm::new();
        form.set_login("ab");
        assert_eq!(form.step, AuthStep::Login);
        assert!(form.login_error.is_some());

        form.set_login("abc123");
        assert_eq!(form.step, AuthStep::Password);
        assert!(!form.can_submit());

        form.set_password("secret1");
        assert!(!form.can_submit());
        form.set_password("Secret1");
        assert!(form.can_submit());
    }

    #[test]
    fn failure_resets_to_login_step() {
        let mut form = AuthForm::new();
        form.set_login("alice");
        form.set_password("Secret1");
        form.start_waiting();
        form.fail("incorrect password");
        assert_eq!(form.step, AuthStep::Login);
        assert_eq!(form.server_error.as_deref(), Some("incorrect password"));
        assert!(form.password.is_empty());
    }

    #[test]
    fn empty_password_line_returns_to_login_step() {
        let mut form = AuthForm::new();
        form.set_login("alice");
        form.set_password("secret");
        assert!(form.password_error.is_some());

        form.back_to_login();
        assert_eq!(form.step, AuthStep::Login);
        assert_eq!(form.login, "alice");
        assert!(form.password.is_empty());
        assert!(form.password_error.is_none());
        assert_eq!(form.to_string(), "Login:");

        form.set_login("bob42");
        assert_eq!(form.step, AuthStep::Password);
        assert_eq!(form.credentials().login, "bob42");
    }
}
