use super::{NewRecord, Record, RecordStore};
use crate::error::{HeadshotError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Record list kept in a sqlite database file
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open the database, creating it and its table if needed
    pub async fn open<P: AsRef<Path>>(db_file: P) -> Result<Self> {
        let db_file = db_file.as_ref();
        tracing::info!("Opening record database {}", db_file.display());

        let connect_opts = SqliteConnectOptions::new()
            .filename(db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Wait for pending writes and close every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<Record> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO record (name, phone, image_ref) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.image_ref)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!("Inserted record {}", id);

        Ok(Record {
            id,
            name: record.name,
            phone: record.phone,
            image_ref: record.image_ref,
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM record WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(HeadshotError::RecordNotFound(id));
        }
        tracing::debug!("Deleted record {}", id);
        Ok(())
    }

    async fn update(&self, record: Record) -> Result<()> {
        let done = sqlx::query("UPDATE record SET name = ?, phone = ?, image_ref = ? WHERE id = ?")
            .bind(&record.name)
            .bind(&record.phone)
            .bind(&record.image_ref)
            .bind(record.id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(HeadshotError::RecordNotFound(record.id));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let records = sqlx::query_as::<_, Record>(
            "SELECT id, name, phone, image_ref FROM record ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(name: &str) -> NewRecord {
        NewRecord::new(name, "0812", format!("/tmp/{}.jpg", name)).unwrap()
    }

    #[tokio::test]
    async fn records_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let db_file = dir.path().join("records.db");

        let store = SqliteRecordStore::open(&db_file).await.unwrap();
        let a = store.insert(new_record("a")).await.unwrap();
        let b = store.insert(new_record("b")).await.unwrap();
        store.delete(b.id).await.unwrap();
        store.close().await;

        let store = SqliteRecordStore::open(&db_file).await.unwrap();
        let c = store.insert(new_record("c")).await.unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        assert_eq!(store.list().await.unwrap(), vec![a, c]);
        store.close().await;
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(dir.path().join("records.db"))
            .await
            .unwrap();
        let mut record = store.insert(new_record("old")).await.unwrap();
        record.name = "new".into();
        record.phone = "999".into();
        record.image_ref = "/tmp/other.png".into();

        store.update(record.clone()).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![record]);
        store.close().await;
    }

    #[tokio::test]
    async fn missing_records_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(dir.path().join("records.db"))
            .await
            .unwrap();

        assert!(matches!(
            store.delete(4).await,
            Err(HeadshotError::RecordNotFound(4))
        ));
        let ghost = Record {
            id: 9,
            name: "n".into(),
            phone: "p".into(),
            image_ref: "r".into(),
        };
        assert!(matches!(
            store.update(ghost).await,
            Err(HeadshotError::RecordNotFound(9))
        ));
        store.close().await;
    }

    #[tokio::test]
    async fn unopenable_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir/records.db");

        let err = SqliteRecordStore::open(&missing).await.unwrap_err();

        assert!(matches!(err, HeadshotError::Database(_)));
    }
}
