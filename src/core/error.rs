use std::fmt;

/// Categoria dell'errore, sostituisce lo status HTTP del server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connessione al server assente, fallita o chiusa
    Connection,
    /// Frame non serializzabile o non decodificabile
    Protocol,
    /// Input utente non valido (credenziali, testo del messaggio, configurazione)
    Validation,
    /// Risorsa locale inesistente (utente, messaggio, indice)
    NotFound,
    /// Operazione non ammessa nello stato corrente della sessione
    InvalidState,
    /// Lettura dell'input o scrittura sul terminale fallita
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    kind: ErrorKind,
    message: &'static str,
    details: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    // Common error constructors
    pub fn connection(message: &'static str) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn protocol(message: &'static str) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    pub fn validation(message: &'static str) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_state(message: &'static str) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => f.write_str(self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                Self::connection("Connection closed")
            }
            other => Self::connection("Connection to server failed").with_details(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol("Malformed frame").with_details(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::validation("Validation error").with_details(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, "Terminal I/O failed").with_details(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::validation("Invalid server url").with_details(err.to_string())
    }
}
