//! Services module - Operazioni che la UI invoca sullo stato della sessione
//!
//! Ogni modulo raccoglie le operazioni di una funzionalità. Le operazioni mandano
//! comandi al server e non attendono risposta: lo stato si riallinea con gli eventi
//! che arrivano dalla connessione (vedi `ws::event_handlers`).

pub mod auth;
pub mod chat;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{LoginOutcome, complete_login, login_outcome, login_request, logout};
pub use chat::{
    acknowledge, begin_edit, cancel_edit, delete_message, dialog_view, open_conversation, submit,
};
pub use user::{request_presence, roster_view, set_search};
