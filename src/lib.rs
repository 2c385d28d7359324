//! funChat client library - espone i moduli principali per il binario e per i test

pub mod app;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod services;
pub mod views;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use app::{App, Page};
pub use core::{AppError, AppState, Config, SessionStore, auth, config};
