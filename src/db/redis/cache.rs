use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Top products by likes, for a given page size
    Trending(usize),
    /// Tag-overlap neighbours of a product, for a given page size
    SimilarProducts(Uuid, usize),
}

impl CacheKey {
    /// Matches every cached similar-products list
    pub const SIMILAR_PRODUCTS_PATTERN: &'static str = "similar:*";
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Trending(limit) => write!(f, "trending:{}", limit),
            CacheKey::SimilarProducts(id, limit) => write!(f, "similar:{}:{}", id, limit),
        }
    }
}

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Work queued for the background writer, applied in order
enum PendingWrite {
    Set { key: String, value: String, ttl: u64 },
    /// Deletes every key matching a glob pattern
    Invalidate { pattern: String },
}

impl PendingWrite {
    fn target(&self) -> &str {
        match self {
            PendingWrite::Set { key, .. } => key,
            PendingWrite::Invalidate { pattern } => pattern,
        }
    }
}

/// Redis-backed cache for read-mostly catalog lists.
///
/// Reads go straight to Redis. Writes are queued and applied by a background
/// task so a slow cache never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once queued writes are applied
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    writer: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer and waits until it has drained its queue
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.writer.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
        tracing::info!("Cache writer stopped");
    }
}

impl Cache {
    /// Creates a cache and spawns its background writer
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer = tokio::spawn(Self::run_writer(
            redis_client.clone(),
            write_rx,
            shutdown_rx,
        ));

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle {
                shutdown_tx,
                writer,
            },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => Self::apply(&client, write).await,
                _ = shutdown_rx.recv() => break,
            }
        }

        // Cache clones may still hold senders, so drain without waiting on them
        let mut flushed = 0usize;
        while let Ok(write) = write_rx.try_recv() {
            Self::apply(&client, write).await;
            flushed += 1;
        }
        tracing::debug!(flushed, "Cache writer drained queue");
    }

    async fn apply(client: &Client, write: PendingWrite) {
        let target = write.target().to_string();
        if let Err(e) = Self::write_to_redis(client, write).await {
            tracing::warn!(error = %e, key = %target, "Cache write failed");
        }
    }

    async fn write_to_redis(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        match write {
            PendingWrite::Set { key, value, ttl } => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            PendingWrite::Invalidate { pattern } => {
                let removed = Self::delete_matching(&mut conn, &pattern).await?;
                tracing::debug!(pattern = %pattern, removed, "Cache entries invalidated");
            }
        }
        Ok(())
    }

    /// SCANs for `pattern` and deletes each batch; returns the number of keys removed
    async fn delete_matching(
        conn: &mut redis::aio::MultiplexedConnection,
        pattern: &str,
    ) -> AppResult<usize> {
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                let _: () = conn.del(keys).await?;
            }
            if next == 0 {
                return Ok(removed);
            }
            cursor = next;
        }
    }

    /// Looks up a cached value; `None` when the key is absent
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Like [`Cache::get_from_cache`], but a Redis failure counts as a miss
    pub async fn get_or_miss<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.get_from_cache(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Queues a write; returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite::Set {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, dropping write");
        }
    }

    /// Queues deletion of every key matching `pattern`, behind any pending writes
    pub fn invalidate_in_background(&self, pattern: &str) {
        let write = PendingWrite::Invalidate {
            pattern: pattern.to_string(),
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(pattern = %pattern, "Cache writer is gone, dropping invalidation");
        }
    }
}
