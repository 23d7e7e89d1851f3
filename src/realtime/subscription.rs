// src/realtime/subscription.rs

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use super::{ChangeEvent, ChangeFeed, RoomSnapshot};
use crate::{error::AppError, store::Store};

/// A room snapshot kept current from the change feed.
pub struct RoomSubscription {
    store: Arc<dyn Store>,
    room_id: i64,
    rx: broadcast::Receiver<ChangeEvent>,
    snapshot: RoomSnapshot,
}

impl RoomSubscription {
    /// Subscribes, then loads the room. `None` when the room does not exist.
    ///
    /// The subscription comes first so a change between the two is not lost;
    /// replaying it on top of the loaded rows is a no-op.
    pub async fn open(
        store: Arc<dyn Store>,
        feed: &ChangeFeed,
        room_id: i64,
    ) -> Result<Option<Self>, AppError> {
        let rx = feed.subscribe();
        let Some(snapshot) = RoomSnapshot::load(store.as_ref(), room_id).await? else {
            return Ok(None);
        };

        Ok(Some(Self {
            store,
            room_id,
            rx,
            snapshot,
        }))
    }

    pub fn snapshot(&self) -> &RoomSnapshot {
        &self.snapshot
    }

    /// Waits until the snapshot changes. Returns `false` once the feed is closed
    /// or the room can no longer be loaded.
    ///
    /// A receiver that lagged behind the feed reloads the snapshot from the store.
    pub async fn next_change(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                Ok(change) => {
                    if self.snapshot.apply(&change) {
                        return true;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Live subscriber for room {} lagged by {} event(s), reloading",
                        self.room_id,
                        skipped
                    );
                    return match RoomSnapshot::load(self.store.as_ref(), self.room_id).await {
                        Ok(Some(snapshot)) => {
                            self.snapshot = snapshot;
                            true
                        }
                        Ok(None) => false,
                        Err(e) => {
                            tracing::error!("Failed to reload room {}: {}", self.room_id, e);
                            false
                        }
                    };
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }
}
