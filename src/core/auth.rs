//! Auth - Validazione lato client delle credenziali e generazione del token di sessione

use crate::core::AppError;
use crate::dtos::CredentialsDTO;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument, warn};
use validator::Validate;

lazy_static! {
    /// Login: solo lettere e numeri ASCII
    pub static ref LOGIN_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
    /// Password: almeno una lettera maiuscola
    pub static ref UPPERCASE_REGEX: Regex = Regex::new(r"[A-Z]").unwrap();
}

pub const LOGIN_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Primo errore di validazione del campo login, nell'ordine in cui va mostrato.
/// `None` se il login è valido.
pub fn login_error(value: &str) -> Option<&'static str> {
    if value.chars().count() < LOGIN_MIN_LEN {
        return Some("Login must be at least 3 characters long");
    }
    if !LOGIN_REGEX.is_match(value) {
        return Some("Login can only contain letters and numbers");
    }
    None
}

/// Primo errore di validazione del campo password. `None` se la password è valida.
pub fn password_error(value: &str) -> Option<&'static str> {
    if value.chars().count() < PASSWORD_MIN_LEN {
        return Some("Password must be at least 6 characters long");
    }
    if !UPPERCASE_REGEX.is_match(value) {
        return Some("Password must contain at least one uppercase letter");
    }
    None
}

/// Controllo completo prima dell'invio di USER_LOGIN.
/// Il pulsante di login resta disabilitato finché questa funzione fallisce.
#[instrument(skip(credentials), fields(login = %credentials.login))]
pub fn validate_credentials(credentials: &CredentialsDTO) -> Result<(), AppError> {
    credentials.validate().map_err(|e| {
        warn!("Credentials rejected by client-side validation");
        AppError::from(e)
    })?;
    debug!("Credentials accepted");
    Ok(())
}

/// Il token è un segnaposto opaco: indica solo che la sessione è autenticata
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
