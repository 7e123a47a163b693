use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::StorageError;

/// String key/value persistence. Values are serialized JSON records.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Returns `(key, value)` pairs for every key matching a glob pattern, sorted by key.
    async fn list(&self, pattern: &str) -> Result<Vec<(String, String)>, StorageError>;
}

/// Redis-backed store sharing one managed connection. Clones of the manager
/// multiplex over the same socket and reconnect on failure.
#[derive(Clone)]
pub struct RedisKvStore {
    con: ConnectionManager,
}

impl RedisKvStore {
    pub async fn connect(client: redis::Client) -> Result<Self, StorageError> {
        let con = ConnectionManager::new(client).await?;
        Ok(Self { con })
    }

    fn connection(&self) -> ConnectionManager {
        self.con.clone()
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut con = self.connection();
        con.set::<_, _, ()>(key, value).await?;
        debug!("SET {key} ({} bytes)", value.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut con = self.connection();
        Ok(con.get(key).await?)
    }

    async fn list(&self, pattern: &str) -> Result<Vec<(String, String)>, StorageError> {
        let mut con = self.connection();
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = con.scan_match::<_, String>(pattern).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Ok(vec![]);
        }
        // SCAN may return a key more than once.
        keys.sort();
        keys.dedup();

        // MGET with a single key returns a bare value rather than an array.
        let values: Vec<Option<String>> = if keys.len() == 1 {
            vec![con.get(&keys[0]).await?]
        } else {
            con.mget(&keys).await?
        };

        Ok(pair_live_values(keys, values))
    }
}

/// Zips keys with their fetched values, dropping keys that expired between
/// SCAN and the value lookup.
fn pair_live_values(keys: Vec<String>, values: Vec<Option<String>>) -> Vec<(String, String)> {
    keys.into_iter()
        .zip(values)
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_pairs_values_in_key_order() {
        let pairs = pair_live_values(
            keys(&["resume:a", "resume:b"]),
            vec![Some("1".to_string()), Some("2".to_string())],
        );
        assert_eq!(
            pairs,
            vec![
                ("resume:a".to_string(), "1".to_string()),
                ("resume:b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_expired_keys_are_dropped() {
        let pairs = pair_live_values(
            keys(&["resume:a", "resume:b", "resume:c"]),
            vec![Some("1".to_string()), None, Some("3".to_string())],
        );
        let names: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["resume:a", "resume:c"]);
    }

    #[test]
    fn test_single_expired_key_yields_nothing() {
        assert!(pair_live_values(keys(&["resume:a"]), vec![None]).is_empty());
    }

    #[test]
    fn test_single_live_key_is_kept() {
        let pairs = pair_live_values(keys(&["resume:a"]), vec![Some("{}".to_string())]);
        assert_eq!(pairs, vec![("resume:a".to_string(), "{}".to_string())]);
    }
}
