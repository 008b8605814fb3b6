//! SQLite bus backend.
//!
//! One table per queue, `(id INTEGER PRIMARY KEY AUTOINCREMENT, raw TEXT)`,
//! payload is the JSON of the domain object. Send is an INSERT; receive is a
//! transactional SELECT-oldest plus DELETE. Survives restarts on the same
//! path.

use crate::{BusError, SpiderBusBackend};
use arachne_protocol::{ChunkKind, DataChunk, Item, ScheduledTask, TaskPromise};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

pub struct SqliteSpiderBusBackend {
    pool: Pool<Sqlite>,
}

impl SqliteSpiderBusBackend {
    /// Open (creating if missing) the queue database at `path`. Table
    /// creation is idempotent.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, BusError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        for kind in [
            ChunkKind::ScheduledTask,
            ChunkKind::TaskPromise,
            ChunkKind::Item,
        ] {
            let create = format!(
                "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, raw TEXT)",
                kind.queue_name()
            );
            sqlx::query(&create).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn push_chunk(&self, chunk: &DataChunk) -> Result<(), BusError> {
        let raw = String::from_utf8_lossy(&chunk.payload).into_owned();
        let insert = format!("INSERT INTO {} (raw) VALUES (?)", chunk.kind.queue_name());
        sqlx::query(&insert).bind(raw).execute(&self.pool).await?;
        Ok(())
    }

    async fn pop_chunk(&self, kind: ChunkKind) -> Result<Option<DataChunk>, BusError> {
        let table = kind.queue_name();
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT id, raw FROM {table} ORDER BY id ASC LIMIT 1");
        let row: Option<(i64, String)> = sqlx::query_as(&select).fetch_optional(&mut *tx).await?;

        let Some((id, raw)) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let delete = format!("DELETE FROM {table} WHERE id = ?");
        sqlx::query(&delete).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(Some(DataChunk {
            kind,
            payload: raw.into_bytes(),
        }))
    }

    async fn count(&self, kind: ChunkKind) -> Result<i64, BusError> {
        let query = format!("SELECT COUNT(*) FROM {}", kind.queue_name());
        Ok(sqlx::query_scalar(&query).fetch_one(&self.pool).await?)
    }
}

#[async_trait]
impl SpiderBusBackend for SqliteSpiderBusBackend {
    async fn send_scheduled_task(&self, task: &ScheduledTask) -> Result<(), BusError> {
        self.push_chunk(&DataChunk::from_scheduled_task(task)?).await
    }

    async fn receive_scheduled_task(&self) -> Result<Option<ScheduledTask>, BusError> {
        match self.pop_chunk(ChunkKind::ScheduledTask).await? {
            Some(chunk) => Ok(Some(chunk.to_scheduled_task()?)),
            None => Ok(None),
        }
    }

    async fn send_task_promise(&self, promise: &TaskPromise) -> Result<(), BusError> {
        self.push_chunk(&DataChunk::from_task_promise(promise)?).await
    }

    async fn receive_task_promise(&self) -> Result<Option<TaskPromise>, BusError> {
        match self.pop_chunk(ChunkKind::TaskPromise).await? {
            Some(chunk) => Ok(Some(chunk.to_task_promise()?)),
            None => Ok(None),
        }
    }

    async fn send_item(&self, item: &Item) -> Result<(), BusError> {
        self.push_chunk(&DataChunk::from_item(item)?).await
    }

    async fn receive_item(&self) -> Result<Option<Item>, BusError> {
        match self.pop_chunk(ChunkKind::Item).await? {
            Some(chunk) => Ok(Some(chunk.to_item()?)),
            None => Ok(None),
        }
    }

    async fn is_empty(&self) -> Result<bool, BusError> {
        let scheduled = self.count(ChunkKind::ScheduledTask).await?;
        let promises = self.count(ChunkKind::TaskPromise).await?;
        let items = self.count(ChunkKind::Item).await?;
        Ok(scheduled == 0 && promises == 0 && items == 0)
    }

    async fn close(&self) -> Result<(), BusError> {
        self.pool.close().await;
        Ok(())
    }
}
