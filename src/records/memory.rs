use super::{NewRecord, Record, RecordStore};
use crate::error::{HeadshotError, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// Record list kept in memory, gone when dropped
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    table: Mutex<Table>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<Record> {
        let mut table = self.table();
        table.last_id += 1;
        let stored = Record {
            id: table.last_id,
            name: record.name,
            phone: record.phone,
            image_ref: record.image_ref,
        };
        table.rows.insert(stored.id, stored.clone());
        tracing::debug!("Inserted record {}", stored.id);
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.table().rows.remove(&id) {
            Some(_) => {
                tracing::debug!("Deleted record {}", id);
                Ok(())
            }
            None => Err(HeadshotError::RecordNotFound(id)),
        }
    }

    async fn update(&self, record: Record) -> Result<()> {
        let mut table = self.table();
        match table.rows.get_mut(&record.id) {
            Some(row) => {
                *row = record;
                Ok(())
            }
            None => Err(HeadshotError::RecordNotFound(record.id)),
        }
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.table().rows.values().cloned().collect())
    }
}
