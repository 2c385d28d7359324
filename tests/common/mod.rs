#![allow(dead_code)]

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::any;
use funchat::core::{AppState, Config};
use funchat::dtos::{
    ClientRequest, ErrorPayload, MessagePatchDTO, MessagePayload, MessageStatusPatchDTO,
    MessagesPayload, Outgoing, ServerEvent, ServerFrame, UserPayload, UserStatusDTO, UsersPayload,
};
use funchat::entities::{Message, MessageStatus};
use funchat::ws::WriterSignal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::{Duration, sleep};

pub const PASSWORD: &str = "Secret1";

/// Crea un messaggio non letto con datetime fisso
pub fn message(id: &str, from: &str, to: &str, text: &str) -> Message {
    Message {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        text: text.to_string(),
        datetime: 1_709_647_629_000,
        status: MessageStatus::default(),
    }
}

pub fn read_message(id: &str, from: &str, to: &str, text: &str) -> Message {
    let mut msg = message(id, from, to, text);
    msg.status.is_delivered = true;
    msg.status.is_readed = true;
    msg
}

pub fn users(list: &[(&str, bool)]) -> Vec<UserStatusDTO> {
    list.iter()
        .map(|(login, online)| UserStatusDTO {
            login: login.to_string(),
            is_logined: *online,
        })
        .collect()
}

pub fn msg_send(msg: Message) -> ServerEvent {
    ServerEvent::MsgSend(MessagePayload { message: msg })
}

pub fn history(messages: Vec<Message>) -> ServerEvent {
    ServerEvent::MsgFromUser(MessagesPayload { messages })
}

pub fn user_active(list: &[(&str, bool)]) -> ServerEvent {
    ServerEvent::UserActive(UsersPayload { users: users(list) })
}

pub fn user_inactive(list: &[(&str, bool)]) -> ServerEvent {
    ServerEvent::UserInactive(UsersPayload { users: users(list) })
}

pub fn patch(id: &str, status: MessageStatusPatchDTO) -> MessagePatchDTO {
    MessagePatchDTO {
        status: Some(status),
        ..MessagePatchDTO::new(id)
    }
}

pub fn msg_deleted(id: &str) -> ServerEvent {
    ServerEvent::MsgDelete(MessagePayload {
        message: patch(
            id,
            MessageStatusPatchDTO {
                is_deleted: Some(true),
                ..Default::default()
            },
        ),
    })
}

pub fn msg_edited(id: &str, text: &str) -> ServerEvent {
    let mut message = patch(
        id,
        MessageStatusPatchDTO {
            is_edited: Some(true),
            ..Default::default()
        },
    );
    message.text = Some(text.to_string());
    ServerEvent::MsgEdit(MessagePayload { message })
}

pub fn msg_delivered(id: &str) -> ServerEvent {
    ServerEvent::MsgDeliver(MessagePayload {
        message: patch(
            id,
            MessageStatusPatchDTO {
                is_delivered: Some(true),
                ..Default::default()
            },
        ),
    })
}

pub fn msg_read(id: &str, from: Option<&str>) -> ServerEvent {
    let mut message = patch(
        id,
        MessageStatusPatchDTO {
            is_readed: Some(true),
            ..Default::default()
        },
    );
    message.from = from.map(str::to_owned);
    ServerEvent::MsgRead(MessagePayload { message })
}

/// Stato di sessione collegato ad un canale locale al posto della connessione:
/// le richieste inviate si leggono dal receiver ritornato
pub fn create_test_state(me: &str) -> (AppState, UnboundedReceiver<WriterSignal>) {
    let (tx, rx) = unbounded_channel();
    let mut state = AppState::new(me);
    state.attach_outbox(tx);
    (state, rx)
}

/// Svuota il canale e ritorna le richieste inviate nel frattempo
pub fn drain_requests(rx: &mut UnboundedReceiver<WriterSignal>) -> Vec<ClientRequest> {
    let mut requests = Vec::new();
    while let Ok(signal) = rx.try_recv() {
        if let WriterSignal::Send(outgoing) = signal {
            requests.push(outgoing.request);
        }
    }
    requests
}

pub fn read_receipt_ids(requests: &[ClientRequest]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|r| match r {
            ClientRequest::MsgRead(payload) => Some(payload.message.id.clone()),
            _ => None,
        })
        .collect()
}

// ********************* SERVER DI TEST **********************//

/// Server WebSocket di test: risponde come il server Fun Chat a un sottoinsieme
/// di richieste e registra tutto ciò che riceve
#[derive(Clone)]
pub struct TestServer {
    pub url: String,
    received: Arc<Mutex<Vec<Outgoing>>>,
    push: broadcast::Sender<String>,
    history: Arc<Vec<Message>>,
    next_id: Arc<AtomicU64>,
    login_delay: Duration,
}

impl TestServer {
    /// Avvia il server su una porta libera di localhost
    pub async fn start(history: Vec<Message>) -> TestServer {
        TestServer::start_with_login_delay(history, Duration::ZERO).await
    }

    /// Come `start`, ma la risposta a USER_LOGIN arriva dopo `login_delay`
    pub async fn start_with_login_delay(history: Vec<Message>, login_delay: Duration) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("No local address");
        let (push, _) = broadcast::channel(64);

        let server = TestServer {
            url: format!("ws://{}/", addr),
            received: Arc::new(Mutex::new(Vec::new())),
            push,
            history: Arc::new(history),
            next_id: Arc::new(AtomicU64::new(1)),
            login_delay,
        };

        let app = Router::new()
            .route("/", any(ws_handler))
            .with_state(server.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        server
    }

    pub fn config(&self) -> Config {
        Config {
            server_url: self.url.clone(),
            presence_poll_millis: 50,
            login_settle_millis: 20,
            ..Config::default()
        }
    }

    pub fn received(&self) -> Vec<Outgoing> {
        self.received.lock().expect("poisoned").clone()
    }

    pub fn received_kinds(&self) -> Vec<&'static str> {
        self.received().iter().map(|o| o.request.kind()).collect()
    }

    /// Manda un frame grezzo a tutti i client connessi
    pub fn push_raw(&self, text: impl Into<String>) {
        let _ = self.push.send(text.into());
    }

    pub fn push_event(&self, event: ServerEvent) {
        let frame = ServerFrame { id: None, event };
        self.push_raw(frame.encode().expect("encodable frame"));
    }

    /// Attende finché il server non ha ricevuto una richiesta del tipo indicato
    pub async fn wait_for(&self, kind: &str) -> Outgoing {
        for _ in 0..200 {
            if let Some(found) = self.received().into_iter().find(|o| o.request.kind() == kind) {
                return found;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("Request {} never received", kind);
    }

    fn reply(&self, request: &Outgoing) -> Option<ServerEvent> {
        match &request.request {
            ClientRequest::UserLogin(payload) => {
                let user = &payload.user;
                if user.password == PASSWORD {
                    Some(ServerEvent::UserLogin(UserPayload {
                        user: UserStatusDTO {
                            login: user.login.clone(),
                            is_logined: true,
                        },
                    }))
                } else {
                    Some(ServerEvent::Error(ErrorPayload {
                        error: "incorrect password".to_string(),
                    }))
                }
            }
            ClientRequest::UserLogout(payload) => Some(ServerEvent::UserLogout(UserPayload {
                user: UserStatusDTO {
                    login: payload.user.login.clone(),
                    is_logined: false,
                },
            })),
            ClientRequest::UserActive(()) => Some(user_active(&[("bob", true)])),
            ClientRequest::UserInactive(()) => Some(user_inactive(&[("carol", false)])),
            ClientRequest::MsgFromUser(payload) => {
                let peer = &payload.user.login;
                let messages = self
                    .history
                    .iter()
                    .filter(|m| &m.from == peer || &m.to == peer)
                    .cloned()
                    .collect();
                Some(history(messages))
            }
            ClientRequest::MsgSend(payload) => {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed);
                let mut msg = message(&format!("srv-{}", n), "", &payload.message.to, "");
                msg.text = payload.message.text.clone();
                msg.from = self.logged_in().unwrap_or_default();
                Some(msg_send(msg))
            }
            ClientRequest::MsgEdit(payload) => {
                Some(msg_edited(&payload.message.id, &payload.message.text))
            }
            ClientRequest::MsgDelete(payload) => Some(msg_deleted(&payload.message.id)),
            ClientRequest::MsgRead(payload) => Some(msg_read(&payload.message.id, None)),
        }
    }

    fn logged_in(&self) -> Option<String> {
        self.received().iter().rev().find_map(|o| match &o.request {
            ClientRequest::UserLogin(payload) => Some(payload.user.login.clone()),
            _ => None,
        })
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(server): State<TestServer>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, server))
}

async fn handle_socket(mut socket: WebSocket, server: TestServer) {
    let mut pushed = server.push.subscribe();
    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                };
                let Ok(request) = Outgoing::decode(text.as_str()) else {
                    continue;
                };
                server.received.lock().expect("poisoned").push(request.clone());

                if matches!(request.request, ClientRequest::UserLogin(_)) {
                    sleep(server.login_delay).await;
                }
                if let Some(event) = server.reply(&request) {
                    let frame = ServerFrame { id: Some(request.id.clone()), event };
                    let json = frame.encode().expect("encodable frame");
                    if socket.send(WsMessage::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
            Ok(raw) = pushed.recv() => {
                if socket.send(WsMessage::Text(raw.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Output del terminale condiviso tra l'app e il test
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("poisoned")).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }
}

impl std::io::Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Indirizzo ws su cui non ascolta nessuno
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("ws://{}/", addr)
}

/// Attende che una condizione diventi vera (polling ogni 10ms, max 2s)
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}
