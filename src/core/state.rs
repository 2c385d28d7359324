//! Application State - Contesto della sessione autenticata
//!
//! Creato al login e distrutto al logout. Tiene tutto lo stato che prima viveva
//! in variabili globali: conversazioni, roster, conversazione aperta, canale di invio.

use crate::core::AppError;
use crate::dtos::ClientRequest;
use crate::entities::ConversationKey;
use crate::ws::chatmap::ChatMap;
use crate::ws::usermap::UserMap;
use crate::ws::utils::{Outbox, send_request};
use std::collections::HashSet;
use tracing::warn;

/// Stato della conversazione aperta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenChat {
    pub peer: String,
    /// true dopo ogni (ri)caricamento dello storico, false alla prima interazione
    pub show_unread_divider: bool,
    /// id del messaggio in modifica: il prossimo invio diventa MSG_EDIT
    pub editing: Option<String>,
    /// id dei messaggi per cui è già partita una ricevuta di lettura
    pub receipts_sent: HashSet<String>,
}

impl OpenChat {
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            show_unread_divider: true,
            editing: None,
            receipts_sent: HashSet::new(),
        }
    }
}

pub struct AppState {
    /// Login dell'utente della sessione
    pub me: String,

    /// Liste di messaggi per conversazione
    pub chats: ChatMap,

    /// Utenti noti, presenza e contatori dei non letti
    pub users: UserMap,

    /// Conversazione attualmente aperta, se c'è
    pub open_chat: Option<OpenChat>,

    /// Filtro di ricerca del roster (solo presentazione)
    pub search_query: String,

    /// Canale verso la connessione attiva
    outbox: Option<Outbox>,
}

impl AppState {
    pub fn new(me: impl Into<String>) -> Self {
        Self {
            me: me.into(),
            chats: ChatMap::new(),
            users: UserMap::new(),
            open_chat: None,
            search_query: String::new(),
            outbox: None,
        }
    }

    pub fn attach_outbox(&mut self, outbox: Outbox) {
        self.outbox = Some(outbox);
    }

    /// Invia una richiesta sulla connessione attiva. Senza connessione la richiesta è persa.
    pub fn send(&self, request: ClientRequest) -> Result<String, AppError> {
        match &self.outbox {
            Some(outbox) => send_request(outbox, request),
            None => {
                warn!(kind = request.kind(), "No connection attached, request dropped");
                Err(AppError::connection("Not connected"))
            }
        }
    }

    pub fn open_peer(&self) -> Option<&str> {
        self.open_chat.as_ref().map(|c| c.peer.as_str())
    }

    pub fn open_key(&self) -> Option<ConversationKey> {
        self.open_peer().map(|peer| ConversationKey::new(&self.me, peer))
    }

    pub fn is_open(&self, key: &ConversationKey) -> bool {
        self.open_key().as_ref() == Some(key)
    }
}
