//! Redis-backed data source for the SONiC databases
//!
//! Holds one `ConnectionManager` per database. COUNTERS_DB rows are keyed by
//! SAI object id, so COUNTERS/RATES reads are translated through
//! `COUNTERS_PORT_NAME_MAP` and returned keyed by port name.

use crate::config::DatabaseConfig;
use crate::db::{DataSource, DbId, Selector, key_matches};
use crate::error::{Result, ShowError};
use crate::tables::{COUNTERS_PORT_NAME_MAP, COUNTERS_TABLE_NAME, RATES_TABLE_NAME};
use crate::value::TableData;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Redis adapter serving [`Selector`] reads
#[derive(Clone)]
pub struct RedisDataSource {
    host: String,
    port: u16,
    connections: HashMap<DbId, ConnectionManager>,
}

impl std::fmt::Debug for RedisDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDataSource")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("databases", &self.connections.len())
            .finish()
    }
}

impl RedisDataSource {
    /// Connects to every database named in `config`.
    #[instrument(skip_all, fields(host = %config.redis_host, port = config.redis_port))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut connections = HashMap::new();
        for db in DbId::all() {
            let number = config.db_number(db);
            let url = format!("redis://{}:{}/{}", config.redis_host, config.redis_port, number);
            let client = redis::Client::open(url.as_str()).map_err(|e| {
                ShowError::database("connect", format!("Failed to create Redis client: {}", e))
            })?;
            let manager = ConnectionManager::new(client).await.map_err(|e| {
                ShowError::database(
                    "connect",
                    format!("Failed to connect to {}: {}", db.name(), e),
                )
            })?;
            connections.insert(db, manager);
        }
        debug!("Connected to all Redis databases");
        Ok(Self {
            host: config.redis_host.clone(),
            port: config.redis_port,
            connections,
        })
    }

    fn conn(&self, db: DbId) -> Result<ConnectionManager> {
        self.connections
            .get(&db)
            .cloned()
            .ok_or_else(|| ShowError::database(db.name(), "Not connected to Redis"))
    }

    async fn hgetall(conn: &mut ConnectionManager, key: &str) -> Result<TableData> {
        let fields: HashMap<String, String> = conn
            .hgetall(key)
            .await
            .map_err(|e| ShowError::database("HGETALL", format!("{}: {}", key, e)))?;
        Ok(fields
            .into_iter()
            .map(|(f, v)| (f, Value::String(v)))
            .collect::<Map<_, _>>())
    }

    async fn read(&self, selector: &Selector, out: &mut TableData) -> Result<()> {
        if selector.db == DbId::CountersDb
            && (selector.table == COUNTERS_TABLE_NAME || selector.table == RATES_TABLE_NAME)
        {
            return self.read_port_counters(selector, out).await;
        }

        let mut conn = self.conn(selector.db)?;
        let sep = selector.db.separator();
        let prefix = format!("{}{}", selector.table, sep);
        let pattern = selector.joined_key().unwrap_or_else(|| "*".to_string());

        if !selector.is_multi_row() {
            out.extend(Self::hgetall(&mut conn, &format!("{}{}", prefix, pattern)).await?);
            return Ok(());
        }

        let keys: Vec<String> = conn
            .keys(format!("{}{}", prefix, pattern))
            .await
            .map_err(|e| ShowError::database("KEYS", format!("{}: {}", selector, e)))?;
        for full in keys {
            let Some(key) = full.strip_prefix(&prefix) else {
                continue;
            };
            let row = Self::hgetall(&mut conn, &full).await?;
            out.insert(key.to_string(), Value::Object(row));
        }
        Ok(())
    }

    async fn read_port_counters(&self, selector: &Selector, out: &mut TableData) -> Result<()> {
        let mut conn = self.conn(DbId::CountersDb)?;
        let name_map: HashMap<String, String> = conn
            .hgetall(COUNTERS_PORT_NAME_MAP)
            .await
            .map_err(|e| {
                ShowError::database("HGETALL", format!("{}: {}", COUNTERS_PORT_NAME_MAP, e))
            })?;
        let pattern = selector.joined_key().unwrap_or_else(|| "*".to_string());

        for (name, oid) in name_map {
            if !key_matches(&pattern, &name) {
                continue;
            }
            let row = Self::hgetall(&mut conn, &format!("{}:{}", selector.table, oid)).await?;
            if selector.is_multi_row() {
                out.insert(name, Value::Object(row));
            } else {
                out.extend(row);
            }
        }
        Ok(())
    }

    /// Get host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get port
    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl DataSource for RedisDataSource {
    async fn fetch_fields(&self, selectors: &[Selector]) -> Result<TableData> {
        let mut out = TableData::new();
        for selector in selectors {
            self.read(selector, &mut out).await?;
        }
        Ok(out)
    }
}
