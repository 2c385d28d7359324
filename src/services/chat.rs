//! Chat services - Operazioni dell'utente sulla conversazione aperta

use crate::core::{AppError, AppState, OpenChat};
use crate::dtos::{ClientRequest, EditMessageDTO, SendMessageDTO};
use crate::entities::Message;
use crate::views::DialogView;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Apre (o riapre) la conversazione con `peer` e richiede lo storico.
/// Lo stato della conversazione precedente (modalità edit, divisore) viene scartato:
/// il dispatcher è unico, non ci sono listener da staccare.
#[instrument(skip(state), fields(me = %state.me))]
pub fn open_conversation(state: &mut AppState, peer: &str) -> Result<String, AppError> {
    // 1. Verificare che il peer sia un altro utente noto
    // 2. Sostituire la conversazione aperta, azzerando il contatore dei non letti del peer
    // 3. Richiedere lo storico con MSG_FROM_USER
    if peer == state.me {
        return Err(AppError::invalid_state("Cannot open a conversation with yourself"));
    }
    if state.users.get(peer).is_none() {
        warn!("Attempted to open conversation with unknown user");
        return Err(AppError::not_found("Unknown user").with_details(peer.to_string()));
    }

    state.open_chat = Some(OpenChat::new(peer));
    state.users.clear_unread(peer);
    info!("Conversation opened");

    state.send(ClientRequest::history(peer))
}

/// Invia il testo del composer: MSG_EDIT se è attiva la modalità edit, altrimenti MSG_SEND.
/// Inviare conta come interazione con la conversazione (vedi `acknowledge`).
/// Ritorna `None` se il testo è vuoto dopo il trim.
#[instrument(skip(state, text), fields(me = %state.me))]
pub fn submit(state: &mut AppState, text: &str) -> Result<Option<String>, AppError> {
    let text = text.trim();
    let chat = state
        .open_chat
        .as_mut()
        .ok_or_else(|| AppError::invalid_state("No conversation selected"))?;
    if text.is_empty() {
        return Ok(None);
    }

    // la modalità edit resta attiva finché la richiesta non parte davvero
    let editing = chat.editing.clone();
    let request = match editing {
        Some(id) => {
            let dto = EditMessageDTO {
                id,
                text: text.to_string(),
            };
            dto.validate()?;
            debug!(message_id = %dto.id, "Submitting edit");
            ClientRequest::edit(dto.id, dto.text)
        }
        None => {
            let dto = SendMessageDTO {
                to: chat.peer.clone(),
                text: text.to_string(),
            };
            dto.validate()?;
            ClientRequest::send_message(dto.to, dto.text)
        }
    };

    let id = state.send(request)?;
    if let Some(chat) = state.open_chat.as_mut() {
        chat.editing = None;
    }
    acknowledge(state);
    Ok(Some(id))
}

/// Messaggio in posizione `index` (1-based) della conversazione aperta
pub fn message_at(state: &AppState, index: usize) -> Result<&Message, AppError> {
    let key = state
        .open_key()
        .ok_or_else(|| AppError::invalid_state("No conversation selected"))?;
    index
        .checked_sub(1)
        .and_then(|i| state.chats.messages(&key).get(i))
        .ok_or_else(|| AppError::not_found("No message with that number"))
}

fn own_live_message(state: &AppState, index: usize) -> Result<&Message, AppError> {
    let msg = message_at(state, index)?;
    if !msg.is_from(&state.me) {
        return Err(AppError::invalid_state("You can only change your own messages"));
    }
    if msg.status.is_deleted {
        return Err(AppError::invalid_state("Message already deleted"));
    }
    Ok(msg)
}

/// Entra in modalità edit sul messaggio `index` e ritorna il testo da precaricare nel composer
#[instrument(skip(state))]
pub fn begin_edit(state: &mut AppState, index: usize) -> Result<String, AppError> {
    let (id, text) = {
        let msg = own_live_message(state, index)?;
        (msg.id.clone(), msg.text.clone())
    };
    if let Some(chat) = state.open_chat.as_mut() {
        chat.editing = Some(id);
    }
    Ok(text)
}

/// Esce dalla modalità edit. Ritorna true se era attiva.
pub fn cancel_edit(state: &mut AppState) -> bool {
    state
        .open_chat
        .as_mut()
        .and_then(|chat| chat.editing.take())
        .is_some()
}

/// Chiede la cancellazione del messaggio `index`. Lo stato locale cambia solo
/// quando arriva il MSG_DELETE dal server.
#[instrument(skip(state))]
pub fn delete_message(state: &mut AppState, index: usize) -> Result<String, AppError> {
    let id = own_live_message(state, index)?.id.clone();
    state.send(ClientRequest::delete(id))
}

/// Prima interazione dell'utente (scroll, click, invio) con la conversazione aperta:
/// nasconde il divisore e manda una ricevuta per ogni messaggio non letto in arrivo.
/// Ritorna true se il divisore era visibile (serve un nuovo render).
#[instrument(skip(state), fields(me = %state.me))]
pub fn acknowledge(state: &mut AppState) -> bool {
    let Some(chat) = state.open_chat.as_mut() else {
        return false;
    };
    if !chat.show_unread_divider {
        return false;
    }
    chat.show_unread_divider = false;
    let sent = send_read_receipts(state);
    debug!(receipts = sent, "Unread divider dismissed");
    true
}

/// Manda MSG_READ per i messaggi non letti in arrivo nella conversazione aperta,
/// saltando quelli per cui la ricevuta è già partita. Ritorna quante ne ha mandate.
pub fn send_read_receipts(state: &mut AppState) -> usize {
    let Some(key) = state.open_key() else {
        return 0;
    };
    let Some(peer) = state.open_peer().map(str::to_owned) else {
        return 0;
    };

    let pending: Vec<String> = state
        .chats
        .messages(&key)
        .iter()
        .filter(|m| m.is_unread_from(&peer, &state.me))
        .filter(|m| {
            state
                .open_chat
                .as_ref()
                .is_some_and(|c| !c.receipts_sent.contains(&m.id))
        })
        .map(|m| m.id.clone())
        .collect();

    let mut sent = 0;
    for id in pending {
        match state.send(ClientRequest::read(id.clone())) {
            Ok(_) => {
                if let Some(chat) = state.open_chat.as_mut() {
                    chat.receipts_sent.insert(id);
                }
                sent += 1;
            }
            Err(e) => {
                warn!("Read receipt not sent: {}", e);
                break;
            }
        }
    }
    sent
}

/// Vista del dialogo aperto
pub fn dialog_view(state: &AppState) -> DialogView {
    match (&state.open_chat, state.open_key()) {
        (Some(chat), Some(key)) => DialogView::build(
            &state.me,
            &chat.peer,
            state.users.get(&chat.peer),
            state.chats.messages(&key),
            chat.show_unread_divider,
            chat.editing.is_some(),
        ),
        _ => DialogView::no_selection(),
    }
}
