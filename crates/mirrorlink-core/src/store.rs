//! Persistence of the scanned room identifier.
//!
//! The room is the only state that survives a restart. It is written when a
//! room is scanned, read when joining and cleared on disconnect, always by the
//! session itself.

use mirrorlink_proto::RoomId;

use crate::error::StoreError;

/// Key under which the room identifier is stored.
pub const ROOM_KEY: &str = "room";

/// Durable single-value store for the room identifier.
pub trait RoomStore {
    /// Read the stored room, if any.
    fn load(&self) -> Result<Option<RoomId>, StoreError>;

    /// Replace the stored room.
    fn save(&mut self, room: &RoomId) -> Result<(), StoreError>;

    /// Remove the stored room. Clearing an empty store is not an error.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    room: Option<RoomId>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `room`.
    pub fn with_room(room: RoomId) -> Self {
        Self { room: Some(room) }
    }
}

impl RoomStore for MemoryStore {
    fn load(&self) -> Result<Option<RoomId>, StoreError> {
        Ok(self.room.clone())
    }

    fn save(&mut self, room: &RoomId) -> Result<(), StoreError> {
        self.room = Some(room.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.room = None;
        Ok(())
    }
}

impl<S: RoomStore + ?Sized> RoomStore for Box<S> {
    fn load(&self) -> Result<Option<RoomId>, StoreError> {
        (**self).load()
    }

    fn save(&mut self, room: &RoomId) -> Result<(), StoreError> {
        (**self).save(room)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        (**self).clear()
    }
}
