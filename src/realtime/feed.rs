// src/realtime/feed.rs

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{answer::Answer, participant::Participant, room::Room};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// The changed row, tagged by its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum Record {
    Rooms(Room),
    RoomParticipants(Participant),
    QuizAnswers(Answer),
}

/// A row-level change, as seen by subscribers of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub room_id: i64,
    pub record: Record,
}

impl ChangeEvent {
    pub fn room(kind: ChangeKind, room: &Room) -> Self {
        Self {
            kind,
            room_id: room.id,
            record: Record::Rooms(room.clone()),
        }
    }

    pub fn participant(kind: ChangeKind, participant: &Participant) -> Self {
        Self {
            kind,
            room_id: participant.room_id,
            record: Record::RoomParticipants(participant.clone()),
        }
    }

    pub fn answer(answer: &Answer) -> Self {
        Self {
            kind: ChangeKind::Insert,
            room_id: answer.room_id,
            record: Record::QuizAnswers(answer.clone()),
        }
    }
}

/// Fan-out of row changes to every live subscriber.
///
/// Delivery is best effort: a subscriber that falls behind gets `Lagged`
/// and is expected to reload its snapshot from the store.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is the normal idle state.
        let receivers = self.tx.send(event).unwrap_or(0);
        tracing::debug!("Published change to {} subscriber(s)", receivers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}
