//! Saved headshots: name, phone number and the stored image.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::error::{HeadshotError, Result};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub image_ref: String,
}

/// A record before an id has been assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub name: String,
    pub phone: String,
    pub image_ref: String,
}

impl NewRecord {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        image_ref: impl Into<String>,
    ) -> Result<Self> {
        let record = Self {
            name: name.into().trim().to_string(),
            phone: phone.into().trim().to_string(),
            image_ref: image_ref.into(),
        };
        if record.name.is_empty() {
            return Err(HeadshotError::invalid("name must not be empty"));
        }
        if record.phone.is_empty() {
            return Err(HeadshotError::invalid("phone must not be empty"));
        }
        Ok(record)
    }
}

/// Handle to the record list
///
/// Constructed by the caller and passed to whatever needs it. Ids only grow;
/// a deleted id is never handed out again.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Store a new record under the next id
    async fn insert(&self, record: NewRecord) -> Result<Record>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Replace every field of an existing record
    async fn update(&self, record: Record) -> Result<()>;

    /// All records ordered by id
    async fn list(&self) -> Result<Vec<Record>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        assert!(NewRecord::new("  ", "123", "r").is_err());
        assert!(NewRecord::new("Ana", "", "r").is_err());
        assert_eq!(NewRecord::new(" Ana ", "123", "r").unwrap().name, "Ana");
    }
}
