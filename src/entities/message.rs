//! Message entity - Entità messaggio

use super::conversation::ConversationKey;
use serde::{Deserialize, Serialize};

/// Flag di stato del messaggio.
/// Il server li serializza in camelCase (`isDelivered`, `isReaded`, ...).
/// Sono latch a senso unico: una volta `true` non tornano mai `false`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageStatus {
    pub is_delivered: bool,
    pub is_readed: bool,
    pub is_edited: bool,
    pub is_deleted: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// id opaco assegnato dal server, immutabile
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    /// epoch in millisecondi
    pub datetime: i64,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(&self.from, &self.to)
    }

    pub fn is_from(&self, login: &str) -> bool {
        self.from == login
    }

    /// Messaggio in arrivo da `peer` verso `me` non ancora letto
    pub fn is_unread_from(&self, peer: &str, me: &str) -> bool {
        self.from == peer && self.to == me && !self.status.is_readed
    }

    pub fn apply_edit(&mut self, text: String) {
        self.text = text;
        self.status.is_edited = true;
    }

    pub fn mark_deleted(&mut self) {
        self.status.is_deleted = true;
    }

    pub fn mark_delivered(&mut self) {
        self.status.is_delivered = true;
    }

    pub fn mark_read(&mut self) {
        self.status.is_readed = true;
    }
}
