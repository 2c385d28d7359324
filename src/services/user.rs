//! User services - Roster, presenza e ricerca

use crate::core::{AppError, AppState};
use crate::dtos::ClientRequest;
use crate::views::{RosterEntry, RosterView};
use tracing::{debug, instrument};

/// Richiede la presenza aggiornata: USER_ACTIVE e USER_INACTIVE con payload null.
/// Chiamata all'ingresso nella main view e poi dal timer di polling.
#[instrument(skip(state), fields(me = %state.me))]
pub fn request_presence(state: &AppState) -> Result<(), AppError> {
    state.send(ClientRequest::UserActive(()))?;
    state.send(ClientRequest::UserInactive(()))?;
    debug!("Presence requested");
    Ok(())
}

/// Imposta il filtro del roster. Stringa vuota = nessun filtro.
pub fn set_search(state: &mut AppState, query: &str) {
    state.search_query = query.trim().to_string();
}

/// Roster visibile: senza l'utente corrente, filtrato per sottostringa case-insensitive
pub fn roster_view(state: &AppState) -> RosterView {
    let entries = state
        .users
        .visible(&state.me, &state.search_query)
        .into_iter()
        .map(|u| RosterEntry {
            login: u.login.clone(),
            online: u.online,
            unread: state.users.unread_count(&u.login),
        })
        .collect();

    RosterView {
        query: state.search_query.clone(),
        entries,
    }
}
