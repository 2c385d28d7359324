//! Main view - Roster e dialogo renderizzati come testo

use crate::entities::{Message, User};
use std::fmt;

pub const NO_CHAT_SELECTED: &str = "Select a user to start chatting";
pub const EMPTY_DIALOG: &str = "This is the beginning of the dialogue";
pub const DELETED_PLACEHOLDER: &str = "Message deleted";
pub const EDITED_SUFFIX: &str = " (Edited)";
pub const UNREAD_DIVIDER: &str = "Unread messages";

/// Etichetta di stato dei messaggi propri: ne compare una sola, la più avanzata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Sent,
    Delivered,
    Read,
}

impl StatusLabel {
    pub fn for_message(msg: &Message) -> Self {
        if msg.status.is_readed {
            StatusLabel::Read
        } else if msg.status.is_delivered {
            StatusLabel::Delivered
        } else {
            StatusLabel::Sent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Sent => "Sent",
            StatusLabel::Delivered => "Delivered",
            StatusLabel::Read => "Read",
        }
    }
}

/// Orario nel formato `M/D/YYYY, h:mm:ss AM` (UTC)
pub fn format_time(datetime: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(datetime) {
        Some(dt) => dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => String::from("-"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLine {
    /// posizione 1-based nella conversazione, usata da /edit e /delete
    pub index: usize,
    pub outgoing: bool,
    pub time: String,
    pub text: String,
    pub edited: bool,
    pub status: Option<StatusLabel>,
}

impl MessageLine {
    /// Il delete domina l'edit: un messaggio cancellato mostra solo il placeholder
    pub fn from_message(index: usize, msg: &Message, me: &str) -> Self {
        let outgoing = msg.is_from(me);
        let deleted = msg.status.is_deleted;
        Self {
            index,
            outgoing,
            time: format_time(msg.datetime),
            text: if deleted {
                DELETED_PLACEHOLDER.to_string()
            } else {
                msg.text.clone()
            },
            edited: msg.status.is_edited && !deleted,
            status: (outgoing && !deleted).then(|| StatusLabel::for_message(msg)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogLine {
    UnreadDivider,
    Message(MessageLine),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub header: String,
    pub lines: Vec<DialogLine>,
    pub selected: bool,
    pub editing: bool,
}

impl DialogView {
    pub fn no_selection() -> Self {
        Self {
            header: NO_CHAT_SELECTED.to_string(),
            lines: Vec::new(),
            selected: false,
            editing: false,
        }
    }

    /// Costruisce il dialogo con `peer`.
    /// Il divisore compare una sola volta, subito prima del primo messaggio non letto in arrivo
    /// dal peer, e solo finché `show_unread_divider` è true.
    pub fn build(
        me: &str,
        peer: &str,
        peer_user: Option<&User>,
        messages: &[Message],
        show_unread_divider: bool,
        editing: bool,
    ) -> Self {
        let presence = peer_user.map(User::presence_label).unwrap_or("Offline");
        let mut lines = Vec::with_capacity(messages.len() + 1);
        let mut divider_inserted = false;

        for (i, msg) in messages.iter().enumerate() {
            if show_unread_divider && !divider_inserted && msg.is_unread_from(peer, me) {
                lines.push(DialogLine::UnreadDivider);
                divider_inserted = true;
            }
            lines.push(DialogLine::Message(MessageLine::from_message(i + 1, msg, me)));
        }

        Self {
            header: format!("{} ({})", peer, presence),
            lines,
            selected: true,
            editing,
        }
    }

    pub fn has_divider(&self) -> bool {
        self.lines.iter().any(|l| matches!(l, DialogLine::UnreadDivider))
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageLine> {
        self.lines.iter().filter_map(|l| match l {
            DialogLine::Message(m) => Some(m),
            DialogLine::UnreadDivider => None,
        })
    }
}

impl fmt::Display for DialogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.header)?;
        if !self.selected {
            return Ok(());
        }
        if self.lines.is_empty() {
            return writeln!(f, "{}", EMPTY_DIALOG);
        }
        for line in &self.lines {
            match line {
                DialogLine::UnreadDivider => writeln!(f, "----- {} -----", UNREAD_DIVIDER)?,
                DialogLine::Message(m) => {
                    let arrow = if m.outgoing { ">>" } else { "<<" };
                    write!(f, "[{}] {} {} {}", m.index, m.time, arrow, m.text)?;
                    if m.edited {
                        f.write_str(EDITED_SUFFIX)?;
                    }
                    if let Some(status) = m.status {
                        write!(f, "  [{}]", status.as_str())?;
                    }
                    writeln!(f)?;
                }
            }
        }
        if self.editing {
            writeln!(f, "(editing: next line replaces the message text, /cancel to abort)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub login: String,
    pub online: bool,
    pub unread: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterView {
    pub query: String,
    pub entries: Vec<RosterEntry>,
}

impl fmt::Display for RosterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            writeln!(f, "--- Users ---")?;
        } else {
            writeln!(f, "--- Users (search: {}) ---", self.query)?;
        }
        for entry in &self.entries {
            let status = if entry.online { "Online" } else { "Offline" };
            write!(f, "  {:<20} {}", entry.login, status)?;
            if entry.unread > 0 {
                write!(f, "  ({})", entry.unread)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn render_header(login: &str) -> String {
    format!("Fun Chat | Welcome, {}!", login)
}

pub const HELP: &str = "\
Commands:
  /open <login>    open the conversation with a user
  /search [query]  filter the user list (empty query clears)
  /users           show the user list
  /edit <n>        edit your message number n
  /cancel          leave edit mode
  /delete <n>      delete your message number n
  /read            mark the open conversation as read
  /about           about this app
  /back            leave the about page
  /help            show this help
  /logout          log out
  /quit            exit
Any other line is sent to the open conversation.";
