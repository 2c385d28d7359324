//! Views - Rendering testuale delle pagine (auth, main, about)
//!
//! Le view sono pura presentazione: ricevono dati già calcolati e producono testo.

pub mod about;
pub mod auth;
pub mod main;

pub use about::{BackTo, render_about};
pub use auth::{AuthForm, AuthStep};
pub use main::{DialogLine, DialogView, MessageLine, RosterEntry, RosterView, StatusLabel};
