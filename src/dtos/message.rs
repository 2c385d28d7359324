//! Message DTOs - Data Transfer Objects per messaggi

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO per inviare un nuovo messaggio (id e datetime li assegna il server)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Validate)]
pub struct SendMessageDTO {
    pub to: String,

    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub text: String,
}

/// DTO per modificare il testo di un messaggio esistente
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Validate)]
pub struct EditMessageDTO {
    pub id: String,

    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub text: String,
}

/// DTO con il solo id, usato da MSG_DELETE e MSG_READ
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageIdDTO {
    pub id: String,
}

/// Flag di stato parziali: il server manda solo quelli che cambiano
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageStatusPatchDTO {
    pub is_delivered: Option<bool>,
    pub is_readed: Option<bool>,
    pub is_edited: Option<bool>,
    pub is_deleted: Option<bool>,
}

/// Notifica di modifica di un messaggio (MSG_EDIT, MSG_DELETE, MSG_DELIVER, MSG_READ).
/// Solo `id` è garantito, il resto è opzionale.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatchDTO {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatusPatchDTO>,
}

impl MessagePatchDTO {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// true se il server riporta il messaggio come cancellato
    pub fn reports_deleted(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.is_deleted)
            .unwrap_or(false)
    }
}
