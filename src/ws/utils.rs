//! WebSocket Utilities - Funzioni di supporto per l'invio di richieste

use crate::core::AppError;
use crate::dtos::{ClientRequest, Outgoing};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Segnali verso il task di scrittura della connessione
#[derive(Debug)]
pub enum WriterSignal {
    Send(Outgoing),
    Shutdown,
}

/// Lato di invio verso il task di scrittura della connessione attiva
pub type Outbox = UnboundedSender<WriterSignal>;

/// Invia una richiesta con un id nuovo e ritorna l'id.
/// Fire-and-forget: non si attende nessuna risposta e, se la connessione è chiusa,
/// la richiesta è persa (nessuna coda, nessun retry).
pub fn send_request(outbox: &Outbox, request: ClientRequest) -> Result<String, AppError> {
    let outgoing = Outgoing::new(request);
    let id = outgoing.id.clone();
    let kind = outgoing.request.kind();

    outbox.send(WriterSignal::Send(outgoing)).map_err(|_| {
        warn!(kind, "Connection closed, request dropped");
        AppError::connection("Connection closed")
    })?;

    debug!(kind, request_id = %id, "Request queued for sending");
    Ok(id)
}
