//! WebSocket Connection Management - Gestione della connessione verso il server

use crate::core::AppError;
use crate::dtos::{ClientRequest, ServerFrame};
use crate::ws::utils::{Outbox, WriterSignal, send_request};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Eventi prodotti dal task di lettura, etichettati con l'id della connessione
/// così gli eventi di una connessione già sostituita possono essere ignorati
#[derive(Debug)]
pub enum ConnectionEvent {
    Frame(u64, ServerFrame),
    Error(u64, String),
    Closed(u64),
}

impl ConnectionEvent {
    pub fn connection_id(&self) -> u64 {
        match self {
            ConnectionEvent::Frame(id, _)
            | ConnectionEvent::Error(id, _)
            | ConnectionEvent::Closed(id) => *id,
        }
    }
}

/// Una connessione WebSocket aperta: un task legge, un task scrive
pub struct Connection {
    id: u64,
    outbox: Outbox,
    closed: Arc<AtomicBool>,
}

impl Connection {
    #[instrument(skip(events))]
    pub async fn open(
        url: &str,
        ping_interval: Duration,
        events: UnboundedSender<ConnectionEvent>,
    ) -> Result<Self, AppError> {
        let (ws, _response) = connect_async(url).await.map_err(|e| {
            error!("WebSocket handshake failed: {:?}", e);
            AppError::from(e)
        })?;

        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        info!(connection = id, "WebSocket connection established");

        // Dividiamo il WebSocket in due metà: sender e receiver
        let (ws_tx, ws_rx) = ws.split();
        let (out_tx, out_rx) = unbounded_channel::<WriterSignal>();
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(listen_ws(id, ws_rx, events, out_tx.clone(), closed.clone()));
        tokio::spawn(write_ws(id, ws_tx, out_rx, ping_interval, closed.clone()));

        Ok(Self {
            id,
            outbox: out_tx,
            closed,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    pub fn send(&self, request: ClientRequest) -> Result<String, AppError> {
        if self.is_closed() {
            warn!(connection = self.id, kind = request.kind(), "Send on closed connection");
            return Err(AppError::connection("Connection closed"));
        }
        send_request(&self.outbox, request)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(connection = self.id, "Closing connection");
        }
        let _ = self.outbox.send(WriterSignal::Shutdown);
    }
}

#[instrument(skip(websocket_tx, internal_rx, closed))]
async fn write_ws(
    connection: u64,
    mut websocket_tx: SplitSink<WsStream, Message>,
    mut internal_rx: UnboundedReceiver<WriterSignal>,
    ping_interval: Duration,
    closed: Arc<AtomicBool>,
) {
    debug!("Write task started");

    let mut ping = interval(ping_interval);
    ping.tick().await; // Consuma primo tick immediato

    loop {
        tokio::select! {
            signal = internal_rx.recv() => {
                match signal {
                    Some(WriterSignal::Send(outgoing)) => {
                        let json = match outgoing.encode() {
                            Ok(json) => json,
                            Err(e) => {
                                error!("Failed to serialize request: {:?}", e);
                                continue;
                            }
                        };
                        if let Err(e) = websocket_tx.send(Message::Text(json)).await {
                            warn!("Failed to send frame, closing connection: {:?}", e);
                            break;
                        }
                        debug!(kind = outgoing.request.kind(), request_id = %outgoing.id, "Frame sent");
                    }
                    Some(WriterSignal::Shutdown) | None => {
                        info!("Shutdown signal received");
                        let _ = websocket_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            _ = ping.tick() => {
                if let Err(e) = websocket_tx.send(Message::Ping(Vec::new())).await {
                    warn!("Failed to send ping: {:?}", e);
                    break;
                }
                debug!("Ping sent");
            }
        }
    }

    closed.store(true, Ordering::Release);
    debug!("Write task terminated");
}

#[instrument(skip(websocket_rx, events, writer, closed))]
async fn listen_ws(
    connection: u64,
    mut websocket_rx: SplitStream<WsStream>,
    events: UnboundedSender<ConnectionEvent>,
    writer: Outbox,
    closed: Arc<AtomicBool>,
) {
    debug!("Listen task started");

    while let Some(msg_result) = websocket_rx.next().await {
        let msg = match msg_result {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket error: {:?}", e);
                let _ = events.send(ConnectionEvent::Error(connection, e.to_string()));
                break;
            }
        };

        match msg {
            Message::Text(text) => match ServerFrame::decode(&text) {
                Ok(frame) => {
                    debug!(kind = frame.event.kind(), "Frame received");
                    if events.send(ConnectionEvent::Frame(connection, frame)).is_err() {
                        info!("Event receiver dropped");
                        break;
                    }
                }
                // payload malformati o tipi sconosciuti vengono ignorati
                Err(e) => warn!("Failed to decode frame: {}", e),
            },
            Message::Close(_) => {
                info!("Close frame received");
                break;
            }
            _ => {}
        }
    }

    closed.store(true, Ordering::Release);
    let _ = writer.send(WriterSignal::Shutdown);
    let _ = events.send(ConnectionEvent::Closed(connection));
    info!("Listen task terminated");
}

/// Possiede l'unica connessione della sessione.
/// Nessun reconnect automatico: una connessione caduta resta chiusa finché qualcuno chiama `get`.
pub struct ConnectionManager {
    url: String,
    ping_interval: Duration,
    events: UnboundedSender<ConnectionEvent>,
    current: Option<Connection>,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        ping_interval: Duration,
    ) -> (Self, UnboundedReceiver<ConnectionEvent>) {
        let (events, events_rx) = unbounded_channel();
        let manager = Self {
            url: url.into(),
            ping_interval,
            events,
            current: None,
        };
        (manager, events_rx)
    }

    /// Apre una connessione nuova senza registrarla (il flusso di login la registra con `set`)
    pub async fn open(&self) -> Result<Connection, AppError> {
        Connection::open(&self.url, self.ping_interval, self.events.clone()).await
    }

    /// Ritorna la connessione attiva, aprendone una se assente o chiusa
    pub async fn get(&mut self) -> Result<&Connection, AppError> {
        let stale = self.current.as_ref().is_none_or(Connection::is_closed);
        if stale {
            debug!("No live connection, opening a new one");
            let connection = self.open().await?;
            self.set(connection);
        }
        self.current
            .as_ref()
            .ok_or_else(|| AppError::connection("Connection to server failed"))
    }

    /// Sostituisce la connessione attiva; quella precedente viene chiusa
    pub fn set(&mut self, connection: Connection) {
        if let Some(previous) = self.current.replace(connection) {
            previous.close();
        }
    }

    pub fn close(&mut self) {
        if let Some(connection) = self.current.take() {
            connection.close();
        }
    }

    pub fn current(&self) -> Option<&Connection> {
        self.current.as_ref()
    }

    pub fn is_current(&self, connection_id: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| c.id() == connection_id)
    }
}
