use crate::core::AppError;
use dotenv::dotenv;
use std::env;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:4000";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub presence_poll_millis: u64,
    pub login_settle_millis: u64,
    pub ping_interval_secs: u64,
    pub app_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            presence_poll_millis: 1000,
            login_settle_millis: 200,
            ping_interval_secs: 30,
            app_env: "development".to_string(),
        }
    }
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let server_url = env::var("SERVER_URL").unwrap_or_else(|_| {
            warn!("SERVER_URL not set, using default {}", DEFAULT_SERVER_URL);
            DEFAULT_SERVER_URL.to_string()
        });
        Self::check_server_url(&server_url)?;

        let presence_poll_millis = Self::parse_number(
            "PRESENCE_POLL_MILLIS",
            "1000",
            "Invalid PRESENCE_POLL_MILLIS: must be a positive number",
        )?;

        let login_settle_millis = Self::parse_number(
            "LOGIN_SETTLE_MILLIS",
            "200",
            "Invalid LOGIN_SETTLE_MILLIS: must be a positive number",
        )?;

        let ping_interval_secs = Self::parse_number(
            "PING_INTERVAL_SECS",
            "30",
            "Invalid PING_INTERVAL_SECS: must be a positive number",
        )?;

        if presence_poll_millis == 0 || ping_interval_secs == 0 {
            return Err(AppError::validation("Intervals must be greater than zero"));
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_url,
            presence_poll_millis,
            login_settle_millis,
            ping_interval_secs,
            app_env,
        })
    }

    /// Accetta solo url ws:// o wss://
    pub fn check_server_url(raw: &str) -> Result<(), AppError> {
        let url = Url::parse(raw)?;
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(AppError::validation("Server url must use ws or wss")
                .with_details(format!("got scheme {}", other))),
        }
    }

    fn parse_number(key: &str, default: &str, message: &'static str) -> Result<u64, AppError> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .map_err(|_| AppError::validation(message))
    }

    pub fn presence_poll_interval(&self) -> Duration {
        Duration::from_millis(self.presence_poll_millis)
    }

    pub fn login_settle_delay(&self) -> Duration {
        Duration::from_millis(self.login_settle_millis)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Logga la configurazione effettiva
    pub fn log_info(&self) {
        info!(
            environment = %self.app_env,
            server_url = %self.server_url,
            presence_poll_millis = self.presence_poll_millis,
            login_settle_millis = self.login_settle_millis,
            ping_interval_secs = self.ping_interval_secs,
            "Client configuration loaded"
        );
    }
}
