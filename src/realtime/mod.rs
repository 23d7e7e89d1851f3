// src/realtime/mod.rs

pub mod feed;
pub mod snapshot;
pub mod subscription;

pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, Record};
pub use snapshot::{Dashboard, RoomSnapshot};
pub use subscription::RoomSubscription;
