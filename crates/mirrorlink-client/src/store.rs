//! Durable room store backed by redb.

use std::path::Path;

use mirrorlink_core::{ROOM_KEY, RoomStore, StoreError};
use mirrorlink_proto::RoomId;
use redb::{Database, TableDefinition, TableError};

const SESSION_TABLE: TableDefinition<&str, &str> = TableDefinition::new("session");

/// Persists the scanned room across restarts in a single redb file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend)?;
        Ok(Self { db })
    }
}

impl RoomStore for RedbStore {
    fn load(&self) -> Result<Option<RoomId>, StoreError> {
        let txn = self.db.begin_read().map_err(backend)?;
        let table = match txn.open_table(SESSION_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(error) => return Err(backend(error)),
        };

        let Some(value) = table.get(ROOM_KEY).map_err(backend)? else {
            return Ok(None);
        };
        RoomId::new(value.value()).map(Some).map_err(|_| StoreError::InvalidRoom)
    }

    fn save(&mut self, room: &RoomId) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = txn.open_table(SESSION_TABLE).map_err(backend)?;
            table.insert(ROOM_KEY, room.as_str()).map_err(backend)?;
        }
        txn.commit().map_err(backend)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = txn.open_table(SESSION_TABLE).map_err(backend)?;
            table.remove(ROOM_KEY).map_err(backend)?;
        }
        txn.commit().map_err(backend)
    }
}

fn backend(error: impl Into<redb::Error>) -> StoreError {
    StoreError::Backend(error.into().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.redb");
        let room = RoomId::new("ROOM42").unwrap();

        {
            let mut store = RedbStore::open(&path).unwrap();
            assert_eq!(store.load(), Ok(None));
            store.save(&room).unwrap();
        }

        let mut store = RedbStore::open(&path).unwrap();
        assert_eq!(store.load(), Ok(Some(room)));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), Ok(None));
    }
}
