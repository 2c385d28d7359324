use crate::entities::{ConversationKey, Message};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Liste di messaggi per conversazione, indicizzate dalla coppia canonica dei partecipanti.
/// Le liste sono append-only: i messaggi cambiano solo tramite mutazioni mirate per id.
#[derive(Debug, Default)]
pub struct ChatMap {
    conversations: HashMap<ConversationKey, Vec<Message>>,
}

impl ChatMap {
    pub fn new() -> Self {
        ChatMap {
            conversations: HashMap::new(),
        }
    }

    /// Accoda un messaggio alla sua conversazione.
    /// Un id già presente viene sovrascritto in posizione (last-write-wins).
    #[instrument(skip(self, msg), fields(message_id = %msg.id))]
    pub fn append(&mut self, msg: Message) -> ConversationKey {
        let key = msg.key();
        let list = self.conversations.entry(key.clone()).or_default();
        match list.iter_mut().find(|m| m.id == msg.id) {
            Some(existing) => {
                debug!("Message already known, replacing in place");
                *existing = msg;
            }
            None => list.push(msg),
        }
        key
    }

    /// Carica uno storico (MSG_FROM_USER).
    /// Per ogni conversazione toccata lo storico diventa la base della lista, i messaggi
    /// già noti ma assenti dallo storico restano in coda nell'ordine di arrivo.
    /// Ritorna le chiavi delle conversazioni aggiornate.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub fn load_history(&mut self, messages: Vec<Message>) -> Vec<ConversationKey> {
        let mut order: Vec<ConversationKey> = Vec::new();
        let mut grouped: HashMap<ConversationKey, Vec<Message>> = HashMap::new();
        for msg in messages {
            let key = msg.key();
            let slot = grouped.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            match slot.iter_mut().find(|m| m.id == msg.id) {
                Some(existing) => *existing = msg,
                None => slot.push(msg),
            }
        }

        let mut touched = Vec::with_capacity(order.len());
        for key in order {
            let mut history = grouped.remove(&key).unwrap_or_default();
            let known: HashSet<&str> = history.iter().map(|m| m.id.as_str()).collect();
            let leftovers: Vec<Message> = self
                .conversations
                .remove(&key)
                .unwrap_or_default()
                .into_iter()
                .filter(|m| !known.contains(m.id.as_str()))
                .collect();
            history.extend(leftovers);
            info!(conversation = %key, messages = history.len(), "History merged");
            self.conversations.insert(key.clone(), history);
            touched.push(key);
        }
        touched
    }

    pub fn messages(&self, key: &ConversationKey) -> &[Message] {
        self.conversations
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, id: &str) -> Option<&Message> {
        self.conversations
            .values()
            .flat_map(|list| list.iter())
            .find(|m| m.id == id)
    }

    /// Applica `f` al messaggio con quell'id in ogni conversazione che lo contiene.
    /// Ritorna le chiavi delle conversazioni modificate (vuoto se l'id è sconosciuto).
    #[instrument(skip(self, f))]
    pub fn update(&mut self, id: &str, mut f: impl FnMut(&mut Message)) -> Vec<ConversationKey> {
        let mut touched = Vec::new();
        for (key, list) in self.conversations.iter_mut() {
            let mut hit = false;
            for msg in list.iter_mut().filter(|m| m.id == id) {
                f(msg);
                hit = true;
            }
            if hit {
                touched.push(key.clone());
            }
        }
        if touched.is_empty() {
            debug!("Update for unknown message ignored");
        }
        touched
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
