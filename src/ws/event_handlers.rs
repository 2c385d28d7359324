//! WebSocket Event Handlers - Dispatcher unico degli eventi in arrivo
//!
//! Ogni evento viene applicato allo stato della sessione indipendentemente dalla
//! conversazione aperta: le mutazioni per id cercano il messaggio in tutte le
//! conversazioni note. Il valore di ritorno dice quali view vanno ridisegnate.
//!
//! Gli eventi sullo stesso id vengono applicati nell'ordine di arrivo, senza
//! controllo di versione (last-write-wins).

use crate::core::AppState;
use crate::dtos::{MessagePatchDTO, ServerEvent};
use crate::entities::{ConversationKey, Message};
use crate::services::chat::send_read_receipts;
use tracing::{debug, info, instrument, warn};

/// View da ridisegnare dopo un evento
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Redraw {
    pub roster: bool,
    pub dialog: bool,
}

impl Redraw {
    pub const NONE: Redraw = Redraw {
        roster: false,
        dialog: false,
    };
    pub const ROSTER: Redraw = Redraw {
        roster: true,
        dialog: false,
    };
    pub const DIALOG: Redraw = Redraw {
        roster: false,
        dialog: true,
    };

    pub fn merge(self, other: Redraw) -> Redraw {
        Redraw {
            roster: self.roster || other.roster,
            dialog: self.dialog || other.dialog,
        }
    }

    pub fn is_none(&self) -> bool {
        !self.roster && !self.dialog
    }
}

#[instrument(skip(state, event), fields(me = %state.me, kind = event.kind()))]
pub fn process_event(state: &mut AppState, event: ServerEvent) -> Redraw {
    match event {
        ServerEvent::UserActive(payload) => {
            let mut changed = state.users.mark_active(&payload.users);
            if state.users.get(&state.me).is_none() {
                let me = state.me.clone();
                state.users.set_presence(&me, true);
                changed.push(me);
            }
            presence_redraw(state, &changed)
        }
        ServerEvent::UserInactive(payload) => {
            let changed = state.users.mark_inactive(&payload.users);
            presence_redraw(state, &changed)
        }
        ServerEvent::MsgSend(payload) => process_new_message(state, payload.message),
        ServerEvent::MsgFromUser(payload) => process_history(state, payload.messages),
        ServerEvent::MsgDelete(payload) => process_delete(state, payload.message),
        ServerEvent::MsgEdit(payload) => process_edit(state, payload.message),
        ServerEvent::MsgDeliver(payload) => {
            let touched = state.chats.update(&payload.message.id, Message::mark_delivered);
            dialog_if_open(state, &touched)
        }
        ServerEvent::MsgRead(payload) => process_read(state, payload.message),
        ServerEvent::Error(payload) => {
            // durante la chat gli errori del server vengono solo loggati
            warn!(error = %payload.error, "Server reported an error");
            Redraw::NONE
        }
        ServerEvent::UserLogin(_) | ServerEvent::UserLogout(_) => {
            debug!("Login state echo ignored");
            Redraw::NONE
        }
    }
}

/// La presenza cambia il roster e, se il peer aperto è coinvolto, l'header del dialogo.
/// Il polling ripete le stesse risposte: senza cambiamenti non si ridisegna nulla.
fn presence_redraw(state: &AppState, changed: &[String]) -> Redraw {
    if changed.is_empty() {
        return Redraw::NONE;
    }
    let peer_changed = state
        .open_peer()
        .is_some_and(|peer| changed.iter().any(|login| login == peer));
    if peer_changed {
        Redraw::ROSTER.merge(Redraw::DIALOG)
    } else {
        Redraw::ROSTER
    }
}

fn dialog_if_open(state: &AppState, touched: &[ConversationKey]) -> Redraw {
    if touched.iter().any(|k| state.is_open(k)) {
        Redraw::DIALOG
    } else {
        Redraw::NONE
    }
}

#[instrument(skip(state, msg), fields(message_id = %msg.id, from = %msg.from))]
fn process_new_message(state: &mut AppState, msg: Message) -> Redraw {
    // 1. Un messaggio nuovo in arrivo non letto, fuori dalla conversazione aperta, incrementa il contatore
    // 2. Accodare il messaggio nella sua conversazione (un id già noto viene sostituito)
    // 3. Se la conversazione è aperta ridisegnare e mandare le ricevute di lettura
    let mut redraw = Redraw::NONE;
    let from_open_peer = state.open_peer() == Some(msg.from.as_str());
    let already_known = state.chats.find(&msg.id).is_some();
    if msg.to == state.me
        && msg.from != state.me
        && !already_known
        && !msg.status.is_readed
        && !msg.status.is_deleted
        && !from_open_peer
    {
        let count = state.users.increment_unread(&msg.from);
        debug!(unread = count, "Unread counter incremented");
        redraw = Redraw::ROSTER;
    }

    let key = state.chats.append(msg);
    if state.is_open(&key) {
        send_read_receipts(state);
        redraw = redraw.merge(Redraw::DIALOG);
    }
    redraw
}

#[instrument(skip(state, messages), fields(count = messages.len()))]
fn process_history(state: &mut AppState, messages: Vec<Message>) -> Redraw {
    let empty = messages.is_empty();
    let touched = state.chats.load_history(messages);
    let open_touched = touched.iter().any(|k| state.is_open(k));

    // storico vuoto: è la risposta per la conversazione appena aperta
    if open_touched || (empty && state.open_chat.is_some()) {
        if let Some(chat) = state.open_chat.as_mut() {
            chat.show_unread_divider = true;
            chat.receipts_sent.clear();
        }
        info!("History loaded for open conversation");
        return Redraw::DIALOG;
    }
    Redraw::NONE
}

fn process_delete(state: &mut AppState, patch: MessagePatchDTO) -> Redraw {
    let touched = state.chats.update(&patch.id, Message::mark_deleted);
    if let Some(chat) = state.open_chat.as_mut() {
        if chat.editing.as_deref() == Some(patch.id.as_str()) {
            debug!(message_id = %patch.id, "Message under edit was deleted, leaving edit mode");
            chat.editing = None;
        }
    }
    dialog_if_open(state, &touched)
}

fn process_edit(state: &mut AppState, patch: MessagePatchDTO) -> Redraw {
    let Some(text) = patch.text else {
        warn!(message_id = %patch.id, "Edit event without text ignored");
        return Redraw::NONE;
    };
    let touched = state.chats.update(&patch.id, |m| m.apply_edit(text.clone()));
    if let Some(chat) = state.open_chat.as_mut() {
        if chat.editing.as_deref() == Some(patch.id.as_str()) {
            chat.editing = None;
        }
    }
    dialog_if_open(state, &touched)
}

#[instrument(skip(state, patch), fields(message_id = %patch.id))]
fn process_read(state: &mut AppState, patch: MessagePatchDTO) -> Redraw {
    // l'autore può mancare nel payload: lo si ricava dal messaggio noto
    let known = state.chats.find(&patch.id);
    let from = patch
        .from
        .clone()
        .or_else(|| known.map(|m| m.from.clone()));
    let deleted = patch.reports_deleted() || known.is_some_and(|m| m.status.is_deleted);

    let touched = state.chats.update(&patch.id, Message::mark_read);
    let mut redraw = dialog_if_open(state, &touched);

    if let Some(from) = from {
        if from != state.me && !deleted && state.users.decrement_unread(&from) {
            debug!(from = %from, "Unread counter decremented");
            redraw = redraw.merge(Redraw::ROSTER);
        }
    }
    redraw
}
