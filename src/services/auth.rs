//! Auth services - Login, ripristino della sessione e logout

use crate::core::auth::new_session_token;
use crate::core::{AppError, AppState, SessionStore, validate_credentials};
use crate::dtos::{ClientRequest, CredentialsDTO, ServerEvent};
use crate::views::auth::{DEFAULT_SERVER_ERROR, NOT_LOGGED_IN};
use tracing::{debug, info, instrument, warn};

/// Esito di un frame ricevuto mentre si attende la risposta a USER_LOGIN
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    Rejected(String),
    /// Frame non pertinente al login, da ignorare
    Ignored,
}

/// Prepara la richiesta USER_LOGIN dopo la validazione lato client
#[instrument(skip(credentials), fields(login = %credentials.login))]
pub fn login_request(credentials: &CredentialsDTO) -> Result<ClientRequest, AppError> {
    validate_credentials(credentials)?;
    Ok(ClientRequest::login(credentials.clone()))
}

/// Interpreta la risposta del server al login
pub fn login_outcome(event: &ServerEvent) -> LoginOutcome {
    match event {
        ServerEvent::UserLogin(payload) if payload.user.is_logined => LoginOutcome::Accepted,
        ServerEvent::UserLogin(_) => LoginOutcome::Rejected(NOT_LOGGED_IN.to_string()),
        ServerEvent::Error(payload) if !payload.error.is_empty() => {
            LoginOutcome::Rejected(payload.error.clone())
        }
        ServerEvent::Error(_) => LoginOutcome::Rejected(DEFAULT_SERVER_ERROR.to_string()),
        other => {
            debug!(kind = other.kind(), "Unexpected response while logging in");
            LoginOutcome::Ignored
        }
    }
}

/// Login riuscito: salva token, login e password nel session store
#[instrument(skip(session, credentials), fields(login = %credentials.login))]
pub fn complete_login(session: &mut SessionStore, credentials: &CredentialsDTO) {
    session.store_login(new_session_token(), credentials);
    info!("User logged in");
}

/// Logout: USER_LOGOUT con le credenziali salvate (se presenti) e pulizia del session store.
/// La chiusura della connessione spetta al chiamante, che la possiede.
#[instrument(skip(state, session), fields(me = %state.me))]
pub fn logout(state: &AppState, session: &mut SessionStore) {
    if let Some(credentials) = session.credentials() {
        if let Err(e) = state.send(ClientRequest::logout(credentials)) {
            warn!("Logout request not sent: {}", e);
        }
    }
    session.forget_login();
    info!("User logged out");
}
