//! WebSocket Event DTOs - Data Transfer Objects per eventi WebSocket
//!
//! Ogni frame è un oggetto JSON `{ "id": ..., "type": ..., "payload": ... }`.
//! Serde gestisce `type`/`payload` come tagged union adiacente, l'`id` viene
//! letto e scritto a parte perché non fa parte della variante.

use crate::dtos::{
    CredentialsDTO, EditMessageDTO, MessageIdDTO, MessagePatchDTO, SendMessageDTO, UserRefDTO,
    UserStatusDTO,
};
use crate::entities::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ********************* PAYLOAD **********************//

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserPayload<T> {
    pub user: T,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UsersPayload {
    #[serde(default)]
    pub users: Vec<UserStatusDTO>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessagePayload<T> {
    pub message: T,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessagesPayload {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: String,
}

// ********************* EVENTI IN ARRIVO **********************//

/// Eventi che il server invia al client (risposte e broadcast).
/// Serde serializza questo come:
/// { "type": "MSG_SEND", "payload": { "message": { ... } } }
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    UserLogin(UserPayload<UserStatusDTO>),
    UserLogout(UserPayload<UserStatusDTO>),
    UserActive(UsersPayload),
    UserInactive(UsersPayload),
    MsgSend(MessagePayload<Message>),
    MsgFromUser(MessagesPayload),
    MsgDelete(MessagePayload<MessagePatchDTO>),
    MsgEdit(MessagePayload<MessagePatchDTO>),
    MsgDeliver(MessagePayload<MessagePatchDTO>),
    MsgRead(MessagePayload<MessagePatchDTO>),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::UserLogin(_) => "USER_LOGIN",
            ServerEvent::UserLogout(_) => "USER_LOGOUT",
            ServerEvent::UserActive(_) => "USER_ACTIVE",
            ServerEvent::UserInactive(_) => "USER_INACTIVE",
            ServerEvent::MsgSend(_) => "MSG_SEND",
            ServerEvent::MsgFromUser(_) => "MSG_FROM_USER",
            ServerEvent::MsgDelete(_) => "MSG_DELETE",
            ServerEvent::MsgEdit(_) => "MSG_EDIT",
            ServerEvent::MsgDeliver(_) => "MSG_DELIVER",
            ServerEvent::MsgRead(_) => "MSG_READ",
            ServerEvent::Error(_) => "ERROR",
        }
    }
}

/// Frame ricevuto e già decodificato al confine della connessione
#[derive(Debug, Clone, PartialEq)]
pub struct ServerFrame {
    pub id: Option<String>,
    pub event: ServerEvent,
}

impl ServerFrame {
    /// Decodifica un frame testuale. Frame malformati o di tipo sconosciuto
    /// ritornano errore e vengono scartati dal chiamante.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let id = value.get("id").and_then(Value::as_str).map(str::to_owned);
        let event = ServerEvent::deserialize(&value)?;
        Ok(Self { id, event })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        encode_with_id(&self.event, self.id.as_deref())
    }
}

// ********************* RICHIESTE IN USCITA **********************//

/// Comandi che il client invia al server.
/// USER_ACTIVE e USER_INACTIVE viaggiano con `payload: null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientRequest {
    UserLogin(UserPayload<CredentialsDTO>),
    UserLogout(UserPayload<CredentialsDTO>),
    UserActive(()),
    UserInactive(()),
    MsgSend(MessagePayload<SendMessageDTO>),
    MsgFromUser(UserPayload<UserRefDTO>),
    MsgEdit(MessagePayload<EditMessageDTO>),
    MsgDelete(MessagePayload<MessageIdDTO>),
    MsgRead(MessagePayload<MessageIdDTO>),
}

impl ClientRequest {
    pub fn login(credentials: CredentialsDTO) -> Self {
        ClientRequest::UserLogin(UserPayload { user: credentials })
    }

    pub fn logout(credentials: CredentialsDTO) -> Self {
        ClientRequest::UserLogout(UserPayload { user: credentials })
    }

    pub fn send_message(to: impl Into<String>, text: impl Into<String>) -> Self {
        ClientRequest::MsgSend(MessagePayload {
            message: SendMessageDTO {
                to: to.into(),
                text: text.into(),
            },
        })
    }

    pub fn history(login: impl Into<String>) -> Self {
        ClientRequest::MsgFromUser(UserPayload {
            user: UserRefDTO {
                login: login.into(),
            },
        })
    }

    pub fn edit(id: impl Into<String>, text: impl Into<String>) -> Self {
        ClientRequest::MsgEdit(MessagePayload {
            message: EditMessageDTO {
                id: id.into(),
                text: text.into(),
            },
        })
    }

    pub fn delete(id: impl Into<String>) -> Self {
        ClientRequest::MsgDelete(MessagePayload {
            message: MessageIdDTO { id: id.into() },
        })
    }

    pub fn read(id: impl Into<String>) -> Self {
        ClientRequest::MsgRead(MessagePayload {
            message: MessageIdDTO { id: id.into() },
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientRequest::UserLogin(_) => "USER_LOGIN",
            ClientRequest::UserLogout(_) => "USER_LOGOUT",
            ClientRequest::UserActive(_) => "USER_ACTIVE",
            ClientRequest::UserInactive(_) => "USER_INACTIVE",
            ClientRequest::MsgSend(_) => "MSG_SEND",
            ClientRequest::MsgFromUser(_) => "MSG_FROM_USER",
            ClientRequest::MsgEdit(_) => "MSG_EDIT",
            ClientRequest::MsgDelete(_) => "MSG_DELETE",
            ClientRequest::MsgRead(_) => "MSG_READ",
        }
    }
}

/// Richiesta in uscita con il suo id univoco generato lato client
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub id: String,
    pub request: ClientRequest,
}

impl Outgoing {
    pub fn new(request: ClientRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        encode_with_id(&self.request, Some(&self.id))
    }

    /// Decodifica lato server, usata dal server di test
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default();
        let request = ClientRequest::deserialize(&value)?;
        Ok(Self { id, request })
    }
}

fn encode_with_id<T: Serialize>(body: &T, id: Option<&str>) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(body)?;
    if let Value::Object(map) = &mut value {
        let id = id.map(|s| Value::String(s.to_owned())).unwrap_or(Value::Null);
        map.insert("id".to_string(), id);
    }
    serde_json::to_string(&value)
}
