use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::models::{Exchange, Outcome, Role};
use crate::service::HistoryEntry;

/// State for the active chat. Exactly one role per session.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: Uuid,
    pub role: Role,
    pub started_at: DateTime<Utc>,
    responses: Vec<Exchange>,
    // Data the server has collected about the user so far
    collected: Map<String, Value>,
}

impl Session {
    pub fn begin(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            started_at: Utc::now(),
            responses: Vec::new(),
            collected: Map::new(),
        }
    }

    pub fn responses(&self) -> &[Exchange] {
        &self.responses
    }

    pub fn collected(&self) -> &Map<String, Value> {
        &self.collected
    }

    /// Records a newly sent message and returns the ID of its exchange.
    pub fn record_sent(&mut self, message: &str) -> Uuid {
        let exchange = Exchange::new(message);
        let id = exchange.id;
        self.responses.push(exchange);
        id
    }

    /// Sets the outcome of an exchange. Returns false if the ID is not
    /// part of this session.
    pub fn resolve(&mut self, id: Uuid, outcome: Outcome) -> bool {
        match self.responses.iter_mut().find(|e| e.id == id) {
            Some(exchange) => {
                exchange.outcome = outcome;
                true
            }
            None => false,
        }
    }

    pub fn replace_collected(&mut self, data: Map<String, Value>) {
        self.collected = data;
    }

    /// Conversation history of completed exchanges in the shape the
    /// chat server expects. Pending and failed replies are left out
    /// but the user's message is kept.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let mut history = Vec::new();
        for exchange in self.responses.iter() {
            if exchange.outcome == Outcome::Pending {
                continue;
            }
            history.push(HistoryEntry::user(&exchange.message));
            if let Outcome::Replied(reply) = &exchange.outcome {
                history.push(HistoryEntry::bot(reply));
            }
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_begin_starts_empty() {
        let session = Session::begin(Role::Pro);
        assert_eq!(session.role, Role::Pro);
        assert!(session.responses().is_empty());
        assert!(session.collected().is_empty());
    }

    #[test]
    fn test_begin_accepts_unknown_role() {
        let session = Session::begin(Role::from("astronaute"));
        assert_eq!(session.role.as_str(), "astronaute");
    }

    #[test]
    fn test_resolve_updates_matching_exchange() {
        let mut session = Session::begin(Role::Chercheur);
        let first = session.record_sent("un");
        let second = session.record_sent("deux");

        assert!(session.resolve(second, Outcome::Replied("2".into())));
        assert!(!session.resolve(Uuid::new_v4(), Outcome::Failed));

        assert_eq!(session.responses()[0].id, first);
        assert_eq!(session.responses()[0].outcome, Outcome::Pending);
        assert_eq!(session.responses()[1].outcome, Outcome::Replied("2".into()));
    }

    #[test]
    fn test_history_skips_pending_and_failed_replies() {
        let mut session = Session::begin(Role::Pro);
        let a = session.record_sent("Bonjour");
        let b = session.record_sent("Ça va ?");
        session.record_sent("Encore là ?");
        session.resolve(a, Outcome::Replied("Salut !".into()));
        session.resolve(b, Outcome::Failed);

        let history = serde_json::to_value(session.history()).unwrap();
        assert_eq!(
            history,
            json!([
                {"role": "user", "content": "Bonjour"},
                {"role": "bot", "content": "Salut !"},
                {"role": "user", "content": "Ça va ?"},
            ])
        );
    }
}
