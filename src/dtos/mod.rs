//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione sul filo (JSON) dalle entità tenute in memoria.

pub mod message;
pub mod user;
pub mod ws_event;

// Re-exports per mantenere gli import corti
pub use message::{
    EditMessageDTO, MessageIdDTO, MessagePatchDTO, MessageStatusPatchDTO, SendMessageDTO,
};
pub use user::{CredentialsDTO, UserRefDTO, UserStatusDTO};
pub use ws_event::{
    ClientRequest, ErrorPayload, MessagePayload, MessagesPayload, Outgoing, ServerEvent,
    ServerFrame, UserPayload, UsersPayload,
};
