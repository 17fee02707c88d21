use anyhow::{Context, Result};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::model::{ContextMessage, FallbackAnswer};

/// Key/value storage behind the response cache. Expiry is judged at read
/// time against the caller's TTL; an expired entry must be removed by the
/// read that observes it.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str, ttl: Duration) -> Result<Option<FallbackAnswer>>;
    fn put(&self, key: &str, value: &FallbackAnswer) -> Result<()>;
}

/// One JSON file per key; age comes from the file's modification time.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {:?}", dir))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str, ttl: Duration) -> Result<Option<FallbackAnswer>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let modified = fs::metadata(&path)?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > ttl {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to purge expired entry {:?}", path))?;
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt cache entry {:?}", path))?;
        Ok(Some(value))
    }

    fn put(&self, key: &str, value: &FallbackAnswer) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, serde_json::to_string(value)?)
            .with_context(|| format!("Failed to write cache entry {:?}", path))?;
        Ok(())
    }
}

/// In-process store for tests and cache-less deployments that still want
/// deduplication.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Instant, FallbackAnswer)>>,
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str, ttl: Duration) -> Result<Option<FallbackAnswer>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some((stored_at, _)) => stored_at.elapsed() > ttl,
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(_, value)| value.clone()))
    }

    fn put(&self, key: &str, value: &FallbackAnswer) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), (Instant::now(), value.clone()));
        Ok(())
    }
}

/// Deterministic key over the query, the latest context turn and the location.
pub fn cache_key(query: &str, context: &[ContextMessage], location: Option<&str>) -> String {
    let context_key = context.last().map(|m| m.content.as_str()).unwrap_or("");
    let combined = format!("{}::{}::{}", query, context_key, location.unwrap_or(""));
    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache in front of the LLM fallback. Never fails: read errors are misses,
/// write errors are logged. Store calls run on the blocking pool.
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(store: Box<dyn CacheStore>, ttl: Duration, enabled: bool) -> Self {
        Self {
            store: Arc::from(store),
            ttl,
            enabled,
        }
    }

    pub async fn get(
        &self,
        query: &str,
        context: &[ContextMessage],
        location: Option<&str>,
    ) -> Option<FallbackAnswer> {
        if !self.enabled {
            return None;
        }
        let key = cache_key(query, context, location);
        let store = Arc::clone(&self.store);
        let ttl = self.ttl;
        let lookup = key.clone();
        let result = tokio::task::spawn_blocking(move || store.get(&lookup, ttl))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        match result {
            Ok(hit) => {
                if hit.is_some() {
                    log::debug!("Cache hit for {}", key);
                }
                hit
            }
            Err(e) => {
                log::warn!("Cache read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    pub async fn put(
        &self,
        query: &str,
        response: &FallbackAnswer,
        context: &[ContextMessage],
        location: Option<&str>,
    ) {
        if !self.enabled {
            return;
        }
        let key = cache_key(query, context, location);
        let store = Arc::clone(&self.store);
        let value = response.clone();
        let result = tokio::task::spawn_blocking(move || store.put(&key, &value))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        if let Err(e) = result {
            log::warn!("Error saving to cache: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use tokio::time;
    use tempfile::TempDir;

    fn answer() -> FallbackAnswer {
        FallbackAnswer {
            message: "Take the morning bus.".to_string(),
            suggestions: vec!["How long is the ride?".to_string()],
        }
    }

    #[test]
    fn key_is_deterministic_and_input_sensitive() {
        let ctx = vec![ContextMessage::user("first"), ContextMessage::assistant("last")];
        let a = cache_key("bus to kampot", &ctx, Some("Kampot"));
        let b = cache_key("bus to kampot", &ctx, Some("Kampot"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, cache_key("bus to kampot", &ctx, None));
        assert_ne!(a, cache_key("bus to kampot", &ctx[..1], Some("Kampot")));
    }

    #[test]
    fn key_only_looks_at_latest_context_turn() {
        let a = vec![ContextMessage::user("one"), ContextMessage::user("same")];
        let b = vec![ContextMessage::assistant("two"), ContextMessage::user("same")];
        assert_eq!(cache_key("q", &a, None), cache_key("q", &b, None));
        assert_eq!(cache_key("q", &[], None), cache_key("q", &[ContextMessage::user("")], None));
    }

    #[actix_web::test]
    async fn file_store_round_trip_and_expiry() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(
            Box::new(FileStore::new(dir.path().join("cache")).unwrap()),
            Duration::from_millis(200),
            true,
        );

        cache.put("bus", &answer(), &[], Some("Kampot")).await;
        assert_eq!(cache.get("bus", &[], Some("Kampot")).await, Some(answer()));
        assert_eq!(cache.get("bus", &[], None).await, None);

        let file = dir
            .path()
            .join("cache")
            .join(format!("{}.json", cache_key("bus", &[], Some("Kampot"))));
        assert!(file.exists());

        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(cache.get("bus", &[], Some("Kampot")).await, None);
        assert!(!file.exists());
    }

    #[actix_web::test]
    async fn corrupt_file_reads_as_miss() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let key = cache_key("q", &[], None);
        fs::write(dir.path().join(format!("{key}.json")), "{not json").unwrap();

        let cache = ResponseCache::new(Box::new(store), Duration::from_secs(60), true);
        assert_eq!(cache.get("q", &[], None).await, None);
    }

    #[actix_web::test]
    async fn write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("gone")).unwrap();
        fs::remove_dir_all(dir.path().join("gone")).unwrap();

        let cache = ResponseCache::new(Box::new(store), Duration::from_secs(60), true);
        cache.put("q", &answer(), &[], None).await;
        assert_eq!(cache.get("q", &[], None).await, None);
    }

    #[test]
    fn memory_store_expires_and_purges() {
        let store = MemoryStore::default();
        store.put("k", &answer()).unwrap();
        assert_eq!(store.get("k", Duration::from_secs(60)).unwrap(), Some(answer()));

        sleep(Duration::from_millis(30));
        assert_eq!(store.get("k", Duration::from_millis(10)).unwrap(), None);
        assert!(store.entries.lock().is_empty());
    }

    #[actix_web::test]
    async fn disabled_cache_never_stores() {
        let store = MemoryStore::default();
        let cache = ResponseCache::new(Box::new(store), Duration::from_secs(60), false);
        cache.put("q", &answer(), &[], None).await;
        assert_eq!(cache.get("q", &[], None).await, None);
    }
}
