//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene le entità che il client mantiene in memoria durante la sessione.
//! Niente viene persistito: tutto vive finché vive la sessione del processo.

pub mod conversation;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use conversation::ConversationKey;
pub use message::{Message, MessageStatus};
pub use user::User;
