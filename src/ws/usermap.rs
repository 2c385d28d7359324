use crate::dtos::UserStatusDTO;
use crate::entities::User;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Roster della sessione: utenti noti con la loro presenza e i contatori dei non letti.
/// Gli utenti non vengono mai rimossi finché la sessione è viva.
#[derive(Debug, Default)]
pub struct UserMap {
    users: Vec<User>,
    /// login -> numero di messaggi in arrivo non letti. Mai a zero: l'entry viene rimossa.
    unread: HashMap<String, u32>,
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users: Vec::new(),
            unread: HashMap::new(),
        }
    }

    /// Upsert della presenza: gli utenti sconosciuti vengono accodati.
    /// Ritorna true se il roster è cambiato.
    #[instrument(skip(self))]
    pub fn set_presence(&mut self, login: &str, online: bool) -> bool {
        match self.users.iter_mut().find(|u| u.login == login) {
            Some(user) if user.online == online => false,
            Some(user) => {
                user.online = online;
                true
            }
            None => {
                debug!("New user added to roster");
                self.users.push(User::new(login, online));
                true
            }
        }
    }

    /// USER_ACTIVE: tutti gli utenti della lista sono online.
    /// Ritorna i login la cui presenza è cambiata.
    pub fn mark_active(&mut self, users: &[UserStatusDTO]) -> Vec<String> {
        self.apply_presence(users, true)
    }

    /// USER_INACTIVE: tutti gli utenti della lista sono offline
    pub fn mark_inactive(&mut self, users: &[UserStatusDTO]) -> Vec<String> {
        self.apply_presence(users, false)
    }

    fn apply_presence(&mut self, users: &[UserStatusDTO], online: bool) -> Vec<String> {
        let changed: Vec<String> = users
            .iter()
            .filter(|u| self.set_presence(&u.login, online))
            .map(|u| u.login.clone())
            .collect();
        if !changed.is_empty() {
            info!(online, changed = changed.len(), "Presence updated");
        }
        changed
    }

    pub fn get(&self, login: &str) -> Option<&User> {
        self.users.iter().find(|u| u.login == login)
    }

    pub fn all(&self) -> &[User] {
        &self.users
    }

    /// Utenti da mostrare: escluso se stessi, filtrati per sottostringa case-insensitive.
    /// Il filtro è solo di presentazione e non tocca lo stato.
    pub fn visible(&self, me: &str, query: &str) -> Vec<&User> {
        let query = query.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| u.login != me)
            .filter(|u| query.is_empty() || u.login.to_lowercase().contains(&query))
            .collect()
    }

    pub fn unread_count(&self, login: &str) -> u32 {
        self.unread.get(login).copied().unwrap_or(0)
    }

    pub fn increment_unread(&mut self, login: &str) -> u32 {
        let count = self.unread.entry(login.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrementa di uno, rimuovendo l'entry quando arriva a zero.
    /// Ritorna false se non c'era nulla da decrementare.
    pub fn decrement_unread(&mut self, login: &str) -> bool {
        match self.unread.get_mut(login) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.unread.remove(login);
                true
            }
            None => false,
        }
    }

    pub fn clear_unread(&mut self, login: &str) {
        self.unread.remove(login);
    }
}
