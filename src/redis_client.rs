use redis::{aio::MultiplexedConnection, Client};
use tracing::info;

/// Shared handle to the backing store. Cloning is cheap and every clone
/// multiplexes over the same connection, so handlers never lock it.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Connected to backing store");
        Ok(RedisClient { conn })
    }
}
