use async_trait::async_trait;
use redis::{AsyncCommands, RedisError, Script};
use std::collections::HashSet;
use std::marker::PhantomData;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Item, ListFilter, Record, RecordStore, StoreError};
use crate::redis_client::RedisClient;

/// Set holding the names of every provisioned table.
pub const TABLES_KEY: &str = "catalog:tables";

const SCAN_BATCH: usize = 100;

// KEYS: tables set, record hash, id index
// ARGV: table, mode (upsert|insert), id, field/value pairs...
const WRITE_SCRIPT: &str = r#"
if redis.call('SISMEMBER', KEYS[1], ARGV[1]) == 0 then
  return redis.error_reply('NOTABLE ' .. ARGV[1])
end
if ARGV[2] == 'insert' and redis.call('EXISTS', KEYS[2]) == 1 then
  return redis.error_reply('CONFLICT ' .. ARGV[3])
end
redis.call('DEL', KEYS[2])
redis.call('HSET', KEYS[2], unpack(ARGV, 4))
redis.call('SADD', KEYS[3], ARGV[3])
return 1
"#;

/// One table of records kept as Redis hashes under `<table>:<id>`, with
/// the ids indexed in the set `<table>:ids`.
pub struct RedisTable<R> {
    redis: RedisClient,
    table: String,
    write: Script,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RedisTable<R> {
    pub fn new(redis: RedisClient, table: impl Into<String>) -> Self {
        Self {
            redis,
            table: table.into(),
            write: Script::new(WRITE_SCRIPT),
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn record_key(&self, id: &str) -> String {
        format!("{}:{}", self.table, id)
    }

    fn index_key(&self) -> String {
        format!("{}:ids", self.table)
    }

    fn classify(&self, err: RedisError, id: Option<Uuid>) -> StoreError {
        classify(&self.table, err, id)
    }

    async fn write(&self, record: &R, mode: &str) -> Result<(), StoreError> {
        let id = record.id();
        let id_text = id.to_string();
        let item = record.encode();

        let mut invocation = self.write.key(TABLES_KEY);
        invocation
            .key(self.record_key(&id_text))
            .key(self.index_key())
            .arg(&self.table)
            .arg(mode)
            .arg(&id_text);
        for (field, value) in &item {
            invocation.arg(field).arg(value);
        }

        let mut conn = self.redis.conn.clone();
        let _: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| self.classify(e, Some(id)))?;

        debug!(table = %self.table, id = %id, mode, "Record written");
        Ok(())
    }
}

/// Maps a Redis failure onto the gateway error kinds. Script errors carry
/// their kind as the reply code.
fn classify(table: &str, err: RedisError, id: Option<Uuid>) -> StoreError {
    match (err.code(), id) {
        (Some("NOTABLE"), _) => {
            return StoreError::TableMissing {
                table: table.to_string(),
            }
        }
        (Some("CONFLICT"), Some(id)) => return StoreError::Conflict { id },
        _ => {}
    }

    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Backend(format!("table '{}': {}", table, err))
    }
}

/// Drops ids already returned by an earlier SSCAN page.
fn unseen_ids(ids: Vec<String>, seen: &mut HashSet<String>) -> Vec<String> {
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Decodes the items that pass `filter` into `records` until it holds
/// `limit` entries. Empty items are index entries whose record is gone.
/// Returns true once the limit is reached.
fn collect_matches<R: Record>(
    items: Vec<Item>,
    filter: Option<&ListFilter>,
    limit: usize,
    records: &mut Vec<R>,
) -> Result<bool, StoreError> {
    for item in items {
        if records.len() >= limit {
            return Ok(true);
        }
        if item.is_empty() || !filter.map_or(true, |f| f.matches(&item)) {
            continue;
        }
        records.push(R::decode(&item)?);
    }
    Ok(records.len() >= limit)
}

#[async_trait]
impl<R: Record> RecordStore<R> for RedisTable<R> {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.conn.clone();
        let added: i64 = conn
            .sadd(TABLES_KEY, &self.table)
            .await
            .map_err(|e| self.classify(e, None))?;
        if added > 0 {
            info!("Table '{}' created", self.table);
        } else {
            info!("Table '{}' already exists", self.table);
        }
        Ok(())
    }

    async fn put(&self, record: &R) -> Result<(), StoreError> {
        self.write(record, "upsert").await
    }

    async fn insert(&self, record: &R) -> Result<(), StoreError> {
        self.write(record, "insert").await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<R, StoreError> {
        let mut conn = self.redis.conn.clone();
        let (registered, item): (bool, Item) = redis::pipe()
            .sismember(TABLES_KEY, &self.table)
            .hgetall(self.record_key(&id.to_string()))
            .query_async(&mut conn)
            .await
            .map_err(|e| self.classify(e, None))?;

        if !registered {
            return Err(StoreError::TableMissing {
                table: self.table.clone(),
            });
        }
        if item.is_empty() {
            return Err(StoreError::NotFound);
        }
        R::decode(&item)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let id_text = id.to_string();
        let mut conn = self.redis.conn.clone();
        let (registered, removed, _): (bool, i64, i64) = redis::pipe()
            .atomic()
            .sismember(TABLES_KEY, &self.table)
            .del(self.record_key(&id_text))
            .srem(self.index_key(), &id_text)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.classify(e, None))?;

        if !registered {
            return Err(StoreError::TableMissing {
                table: self.table.clone(),
            });
        }
        debug!(table = %self.table, id = %id, removed, "Record deleted");
        Ok(())
    }

    async fn list(&self, filter: Option<&ListFilter>, limit: usize) -> Result<Vec<R>, StoreError> {
        let mut conn = self.redis.conn.clone();
        let registered: bool = conn
            .sismember(TABLES_KEY, &self.table)
            .await
            .map_err(|e| self.classify(e, None))?;
        if !registered {
            return Err(StoreError::TableMissing {
                table: self.table.clone(),
            });
        }

        let mut records = Vec::new();
        if limit == 0 {
            return Ok(records);
        }

        // SSCAN may hand back an id more than once
        let mut seen = HashSet::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, ids): (u64, Vec<String>) = redis::cmd("SSCAN")
                .arg(self.index_key())
                .arg(cursor)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| self.classify(e, None))?;

            let fresh = unseen_ids(ids, &mut seen);
            if !fresh.is_empty() {
                let mut pipe = redis::pipe();
                for id in &fresh {
                    pipe.hgetall(self.record_key(id));
                }
                let items: Vec<Item> = pipe
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| self.classify(e, None))?;

                if collect_matches(items, filter, limit, &mut records)? {
                    return Ok(records);
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEventRequest, Event};
    use chrono::{Duration, Utc};
    use redis::ErrorKind;
    use std::io;

    fn event_item(category_id: Uuid, name: &str) -> Item {
        CreateEventRequest {
            name: name.into(),
            description: "Rock al aire libre".into(),
            category_id,
            location: "Parque Central".into(),
            date: Some(Utc::now() + Duration::days(30)),
            capacity: 5000,
            price: 75.0,
            image_url: String::new(),
        }
        .into_event(Utc::now())
        .unwrap()
        .encode()
    }

    #[test]
    fn script_error_codes_become_table_missing_and_conflict() {
        let err = redis::make_extension_error("NOTABLE".into(), Some("events".into()));
        assert!(matches!(
            classify("events", err, None),
            StoreError::TableMissing { ref table } if table == "events"
        ));

        let id = Uuid::new_v4();
        let err = redis::make_extension_error("CONFLICT".into(), Some(id.to_string()));
        assert!(matches!(
            classify("events", err, Some(id)),
            StoreError::Conflict { id: got } if got == id
        ));
    }

    #[test]
    fn io_failures_become_connection_errors() {
        for kind in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::TimedOut,
        ] {
            let err = RedisError::from(io::Error::new(kind, "socket closed"));
            match classify("events", err, None) {
                StoreError::Connection(details) => assert!(!details.is_empty()),
                other => panic!("expected a connection error for {:?}, got {:?}", kind, other),
            }
        }
    }

    #[test]
    fn other_failures_are_generic_and_name_the_table() {
        let err = RedisError::from((ErrorKind::TypeError, "unexpected reply"));
        match classify("categories", err, None) {
            StoreError::Backend(details) => assert!(details.contains("categories")),
            other => panic!("expected a backend error, got {:?}", other),
        }

        // a CONFLICT reply without a record id is not a conflict
        let err = redis::make_extension_error("CONFLICT".into(), None);
        assert!(matches!(classify("events", err, None), StoreError::Backend(_)));
    }

    #[test]
    fn repeated_scan_ids_are_dropped() {
        let mut seen = HashSet::new();
        let first = unseen_ids(vec!["a".into(), "b".into()], &mut seen);
        let second = unseen_ids(vec!["b".into(), "c".into(), "c".into()], &mut seen);
        assert_eq!(first, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(second, vec!["c".to_string()]);
    }

    #[test]
    fn matches_skip_stale_entries_and_honour_the_filter() {
        let music = Uuid::new_v4();
        let items = vec![
            event_item(music, "Concierto 1"),
            Item::new(),
            event_item(Uuid::new_v4(), "Obra"),
            event_item(music, "Concierto 2"),
        ];
        let filter = ListFilter::eq("category_id", music.to_string());

        let mut records: Vec<Event> = Vec::new();
        let full = collect_matches(items, Some(&filter), 10, &mut records).unwrap();
        assert!(!full);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|e| e.category_id == music));
    }

    #[test]
    fn matches_stop_at_the_limit_across_pages() {
        let music = Uuid::new_v4();
        let mut records: Vec<Event> = Vec::new();

        let page = vec![event_item(music, "A"), event_item(music, "B")];
        assert!(!collect_matches(page, None, 3, &mut records).unwrap());

        let page = vec![event_item(music, "C"), event_item(music, "D")];
        assert!(collect_matches(page, None, 3, &mut records).unwrap());
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn corrupt_item_fails_the_listing() {
        let mut item = event_item(Uuid::new_v4(), "Hamlet");
        item.insert("price".into(), "gratis".into());
        let mut records: Vec<Event> = Vec::new();
        assert!(matches!(
            collect_matches(vec![item], None, 5, &mut records),
            Err(StoreError::Corrupt { field: "price", .. })
        ));
    }
}
