//! Object store for binary blobs keyed by name inside a bucket.
//!
//! The service only needs its bucket to exist at startup; the blob calls
//! serve image-style payloads keyed by event id.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::redis_client::RedisClient;

const BUCKETS_KEY: &str = "catalog:buckets";

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("bucket '{0}' does not exist")]
    NoSuchBucket(String),

    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    #[error("object store request failed: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for ObjectStoreError {
    fn from(err: redis::RedisError) -> Self {
        ObjectStoreError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError>;

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Removes `key`. Removing a key that is not there succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;

    /// Head the bucket and create it when absent.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        if self.bucket_exists(bucket).await? {
            info!("Bucket '{}' already exists", bucket);
            return Ok(());
        }
        info!("Bucket '{}' does not exist, creating it", bucket);
        self.create_bucket(bucket).await?;
        info!("Bucket '{}' created", bucket);
        Ok(())
    }
}

#[derive(Clone)]
pub struct RedisObjectStore {
    redis: RedisClient,
}

impl RedisObjectStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    fn object_key(bucket: &str, key: &str) -> String {
        format!("bucket:{}:{}", bucket, key)
    }

    async fn require_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        if self.bucket_exists(bucket).await? {
            Ok(())
        } else {
            Err(ObjectStoreError::NoSuchBucket(bucket.to_string()))
        }
    }
}

#[async_trait]
impl ObjectStore for RedisObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        let mut conn = self.redis.conn.clone();
        Ok(conn.sismember(BUCKETS_KEY, bucket).await?)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        let mut conn = self.redis.conn.clone();
        let _: i64 = conn.sadd(BUCKETS_KEY, bucket).await?;
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.require_bucket(bucket).await?;
        let mut conn = self.redis.conn.clone();
        let _: () = conn.set(Self::object_key(bucket, key), body).await?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.require_bucket(bucket).await?;
        let mut conn = self.redis.conn.clone();
        let body: Option<Vec<u8>> = conn.get(Self::object_key(bucket, key)).await?;
        body.ok_or_else(|| ObjectStoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.require_bucket(bucket).await?;
        let mut conn = self.redis.conn.clone();
        let _: i64 = conn.del(Self::object_key(bucket, key)).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashSet<String>>,
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.buckets.read().await.contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        self.buckets.write().await.insert(bucket.to_string());
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ObjectStoreError> {
        if !self.bucket_exists(bucket).await? {
            return Err(ObjectStoreError::NoSuchBucket(bucket.to_string()));
        }
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        if !self.bucket_exists(bucket).await? {
            return Err(ObjectStoreError::NoSuchBucket(bucket.to_string()));
        }
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        if !self.bucket_exists(bucket).await? {
            return Err(ObjectStoreError::NoSuchBucket(bucket.to_string()));
        }
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
