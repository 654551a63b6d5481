use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use crate::errors::LoadError;
use crate::store::KeyValueStore;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// [`KeyValueStore`] over a multiplexed Redis connection.
pub struct RedisKeyValueStore {
    connection: MultiplexedConnection,
}

impl RedisKeyValueStore {
    pub async fn connect(url: &str) -> Result<Self, LoadError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LoadError> {
        let mut connection = self.connection.clone();
        connection.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}
