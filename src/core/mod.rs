//! Core Module - Componenti infrastrutturali del client
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Validazione credenziali
//! - Configurazione
//! - Gestione errori
//! - Session store
//! - Stato della sessione autenticata

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{login_error, password_error, validate_credentials};
pub use config::Config;
pub use error::{AppError, ErrorKind};
pub use session::SessionStore;
pub use state::{AppState, OpenChat};
