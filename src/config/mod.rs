use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Top-level configuration, read once at startup and handed to every component
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub redis: RedisConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("expected 'text' or 'json', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("expected 'redis' or 'memory', got '{}'", other),
        }
    }
}

// Tables, bucket and provisioning
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub events_table: String,
    pub categories_table: String,
    pub auto_create_tables: bool,
    pub bucket_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Text,
    Json,
}

impl FromStr for MessageFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageFormat::Text),
            "json" => Ok(MessageFormat::Json),
            other => bail!("expected 'text' or 'json', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub name: String,
    pub message_format: MessageFormat,
}

// Listing bounds for GET /events
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub default_list_limit: usize,
    pub max_list_limit: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api = ApiConfig {
            default_list_limit: parsed("DEFAULT_LIST_LIMIT", "10")?,
            max_list_limit: parsed("MAX_LIST_LIMIT", "100")?,
        };
        if api.default_list_limit == 0 || api.max_list_limit < api.default_list_limit {
            bail!("DEFAULT_LIST_LIMIT must be positive and not above MAX_LIST_LIMIT");
        }

        Ok(Config {
            app: AppConfig {
                host: var("HOST", "0.0.0.0"),
                port: parsed("PORT", "8080")?,
                environment: var("ENVIRONMENT", "development"),
                rust_log: var("RUST_LOG", "event_catalog=debug,tower_http=debug"),
                log_format: parsed("LOG_FORMAT", "text")?,
            },
            redis: RedisConfig {
                url: var("REDIS_URL", "redis://127.0.0.1:6379"),
            },
            storage: StorageConfig {
                backend: parsed("STORE_BACKEND", "redis")?,
                events_table: var("EVENTS_TABLE", "events"),
                categories_table: var("CATEGORIES_TABLE", "categories"),
                auto_create_tables: parsed("AUTO_CREATE_TABLES", "true")?,
                bucket_name: var("BUCKET_NAME", "event-bucket"),
            },
            queue: QueueConfig {
                name: var("QUEUE_NAME", "event-queue"),
                message_format: parsed("NOTIFY_FORMAT", "text")?,
            },
            api,
        })
    }

    /// Volatile in-process configuration, used by tests and local runs.
    pub fn in_memory() -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                rust_log: "event_catalog=debug".to_string(),
                log_format: LogFormat::Text,
            },
            redis: RedisConfig {
                url: String::new(),
            },
            storage: StorageConfig {
                backend: StoreBackend::Memory,
                events_table: "events".to_string(),
                categories_table: "categories".to_string(),
                auto_create_tables: true,
                bucket_name: "event-bucket".to_string(),
            },
            queue: QueueConfig {
                name: "event-queue".to_string(),
                message_format: MessageFormat::Text,
            },
            api: ApiConfig {
                default_list_limit: 10,
                max_list_limit: 100,
            },
        }
    }
}

fn var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("{} has an invalid value '{}'", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsers_reject_unknown_values() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("dynamo".parse::<StoreBackend>().is_err());
        assert!("xml".parse::<MessageFormat>().is_err());
    }

    #[test]
    fn in_memory_config_has_sane_limits() {
        let config = Config::in_memory();
        assert!(config.api.default_list_limit <= config.api.max_list_limit);
        assert_eq!(config.storage.backend, StoreBackend::Memory);
    }
}
