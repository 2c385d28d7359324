//! WebSocket Module - Comunicazione real-time con il server
//!
//! Questo modulo gestisce l'unica connessione WebSocket del client e lo stato
//! che gli eventi in arrivo aggiornano. Include:
//! - Gestione della connessione (split sender/receiver, get/set/close)
//! - Dispatcher unico degli eventi in arrivo
//! - Mappa delle conversazioni e roster degli utenti
//! - Utility per l'invio delle richieste

pub mod chatmap;
pub mod connection;
pub mod event_handlers;
pub mod usermap;
pub mod utils;

// Re-exports pubblici
pub use chatmap::ChatMap;
pub use connection::{Connection, ConnectionEvent, ConnectionManager};
pub use event_handlers::{Redraw, process_event};
pub use usermap::UserMap;
pub use utils::{Outbox, WriterSignal, send_request};
