//! Backing-store access
//!
//! Flows read the SONiC databases through the [`DataSource`] trait using
//! ordered `[store, table, key...]` selectors. [`MemoryDataSource`] serves
//! tests and offline dumps; `RedisDataSource` talks to the live databases.

use crate::error::{Result, ShowError};
use crate::value::TableData;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Database identifiers used by the show flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbId {
    /// Configuration database (CONFIG_DB).
    ConfigDb,
    /// Application database (APPL_DB), the forwarding-plane mirror.
    ApplDb,
    /// State database (STATE_DB).
    StateDb,
    /// Counters and rates database (COUNTERS_DB).
    CountersDb,
}

impl DbId {
    /// Returns the database name as used in Redis/SONiC.
    pub fn name(&self) -> &'static str {
        match self {
            DbId::ConfigDb => "CONFIG_DB",
            DbId::ApplDb => "APPL_DB",
            DbId::StateDb => "STATE_DB",
            DbId::CountersDb => "COUNTERS_DB",
        }
    }

    /// Returns the default database ID number.
    pub fn id(&self) -> u32 {
        match self {
            DbId::ApplDb => 0,
            DbId::CountersDb => 2,
            DbId::ConfigDb => 4,
            DbId::StateDb => 6,
        }
    }

    /// Separator between table name and key in this database.
    pub fn separator(&self) -> char {
        match self {
            DbId::ConfigDb | DbId::StateDb => '|',
            DbId::ApplDb | DbId::CountersDb => ':',
        }
    }

    /// Parses a database name such as "CONFIG_DB".
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CONFIG_DB" => Some(DbId::ConfigDb),
            "APPL_DB" | "APP_DB" => Some(DbId::ApplDb),
            "STATE_DB" => Some(DbId::StateDb),
            "COUNTERS_DB" => Some(DbId::CountersDb),
            _ => None,
        }
    }

    /// All known databases.
    pub fn all() -> [DbId; 4] {
        [DbId::ConfigDb, DbId::ApplDb, DbId::StateDb, DbId::CountersDb]
    }
}

/// One read request: a table, optionally narrowed to a key or key pattern.
///
/// With no keys the whole table is returned as `key -> row`. A trailing key
/// ending in `*` is a wildcard with the same shape. Any other key list names
/// a single row and yields its fields directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub db: DbId,
    pub table: String,
    pub keys: Vec<String>,
}

impl Selector {
    /// Selects every row of `table`.
    pub fn table(db: DbId, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            keys: Vec::new(),
        }
    }

    /// Selects rows of `table` whose key matches `key` (exact or wildcard).
    pub fn key(db: DbId, table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            keys: vec![key.into()],
        }
    }

    /// Key suffix joined with the database separator, if any.
    pub fn joined_key(&self) -> Option<String> {
        if self.keys.is_empty() {
            None
        } else {
            Some(self.keys.join(&self.db.separator().to_string()))
        }
    }

    /// True when the selector returns a `key -> row` mapping.
    pub fn is_multi_row(&self) -> bool {
        self.keys.last().is_none_or(|k| k.ends_with('*'))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.db.name(), self.table)?;
        for key in &self.keys {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

/// Matches a Redis-style key pattern supporting a trailing `*`.
pub fn key_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

/// Read access to the named backing stores.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Reads every selector and merges the results into one mapping.
    async fn fetch_fields(&self, selectors: &[Selector]) -> Result<TableData>;
}

/// In-memory backing store
///
/// Rows are stored under their full Redis key (e.g. `PORT|Ethernet0`).
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    data: RwLock<HashMap<DbId, BTreeMap<String, TableData>>>,
    failing: RwLock<HashSet<(DbId, String)>>,
}

impl MemoryDataSource {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets fields on `table<sep>key`, creating the row if needed.
    pub fn hset(&self, db: DbId, table: &str, key: &str, fields: &[(&str, &str)]) {
        let full = format!("{}{}{}", table, db.separator(), key);
        let mut data = self.data.write();
        let row = data.entry(db).or_default().entry(full).or_default();
        for (field, value) in fields {
            row.insert(field.to_string(), Value::String(value.to_string()));
        }
    }

    /// Loads a SONiC-style dump: `{"PORT|Ethernet0": {"alias": "etp0"}}`.
    pub fn load_json(&self, db: DbId, dump: &str) -> Result<usize> {
        let parsed: Value = serde_json::from_str(dump)?;
        let Value::Object(rows) = parsed else {
            return Err(ShowError::Configuration(format!(
                "{} dump is not a JSON object",
                db.name()
            )));
        };
        let mut data = self.data.write();
        let tables = data.entry(db).or_default();
        let mut loaded = 0;
        for (key, fields) in rows {
            if let Value::Object(fields) = fields {
                tables.entry(key).or_default().extend(fields);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Removes every row of `db`.
    pub fn flush(&self, db: DbId) {
        self.data.write().remove(&db);
    }

    /// Makes reads of `table` in `db` fail until [`Self::heal`] is called.
    pub fn fail_table(&self, db: DbId, table: &str) {
        self.failing.write().insert((db, table.to_string()));
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        self.failing.write().clear();
    }

    fn read(&self, selector: &Selector, out: &mut TableData) -> Result<()> {
        if self
            .failing
            .read()
            .contains(&(selector.db, selector.table.clone()))
        {
            return Err(ShowError::database(
                selector.to_string(),
                "injected failure",
            ));
        }

        let data = self.data.read();
        let Some(rows) = data.get(&selector.db) else {
            return Ok(());
        };
        let prefix = format!("{}{}", selector.table, selector.db.separator());
        let pattern = selector.joined_key().unwrap_or_else(|| "*".to_string());

        if selector.is_multi_row() {
            for (full, fields) in rows.range(prefix.clone()..) {
                let Some(key) = full.strip_prefix(&prefix) else {
                    break;
                };
                if key_matches(&pattern, key) {
                    out.insert(key.to_string(), Value::Object(fields.clone()));
                }
            }
        } else if let Some(fields) = rows.get(&format!("{}{}", prefix, pattern)) {
            out.extend(fields.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn fetch_fields(&self, selectors: &[Selector]) -> Result<TableData> {
        let mut out = TableData::new();
        for selector in selectors {
            self.read(selector, &mut out)?;
        }
        debug!(selectors = selectors.len(), rows = out.len(), "memory fetch");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryDataSource {
        let db = MemoryDataSource::new();
        db.hset(DbId::ConfigDb, "PORT", "Ethernet0", &[("alias", "etp0")]);
        db.hset(DbId::ConfigDb, "PORT", "Ethernet4", &[("alias", "etp1")]);
        db.hset(DbId::ConfigDb, "PORTCHANNEL", "PortChannel1", &[("mtu", "9100")]);
        db.hset(DbId::ApplDb, "PORT_TABLE", "Ethernet0", &[("oper_status", "up")]);
        db
    }

    #[test]
    fn test_db_id_names() {
        assert_eq!(DbId::ConfigDb.name(), "CONFIG_DB");
        assert_eq!(DbId::ConfigDb.id(), 4);
        assert_eq!(DbId::CountersDb.id(), 2);
        assert_eq!(DbId::ApplDb.separator(), ':');
        assert_eq!(DbId::from_name("STATE_DB"), Some(DbId::StateDb));
        assert_eq!(DbId::from_name("FOO_DB"), None);
    }

    #[test]
    fn test_selector_display_and_shape() {
        let sel = Selector::key(DbId::CountersDb, "COUNTERS", "Ethernet*");
        assert_eq!(sel.to_string(), "COUNTERS_DB/COUNTERS/Ethernet*");
        assert!(sel.is_multi_row());
        assert!(Selector::table(DbId::ConfigDb, "PORT").is_multi_row());
        assert!(!Selector::key(DbId::ConfigDb, "PORT", "Ethernet0").is_multi_row());
    }

    #[test]
    fn test_key_matches() {
        assert!(key_matches("Ethernet*", "Ethernet40"));
        assert!(key_matches("*", "anything"));
        assert!(key_matches("Ethernet0", "Ethernet0"));
        assert!(!key_matches("Ethernet0", "Ethernet04"));
    }

    #[tokio::test]
    async fn test_fetch_whole_table_does_not_leak_prefix_neighbours() {
        let db = store();
        let out = db
            .fetch_fields(&[Selector::table(DbId::ConfigDb, "PORT")])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.contains_key("Ethernet0"));
        assert!(!out.contains_key("PortChannel1"));
    }

    #[tokio::test]
    async fn test_fetch_exact_key_is_flat() {
        let db = store();
        let out = db
            .fetch_fields(&[Selector::key(DbId::ApplDb, "PORT_TABLE", "Ethernet0")])
            .await
            .unwrap();
        assert_eq!(out.get("oper_status"), Some(&Value::String("up".into())));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_empty() {
        let db = store();
        let out = db
            .fetch_fields(&[Selector::key(DbId::StateDb, "PORT_TABLE", "Ethernet0")])
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let db = store();
        db.fail_table(DbId::ConfigDb, "PORT");
        let err = db
            .fetch_fields(&[Selector::table(DbId::ConfigDb, "PORT")])
            .await
            .unwrap_err();
        assert!(matches!(err, ShowError::Database { .. }));
        db.heal();
        assert!(db
            .fetch_fields(&[Selector::table(DbId::ConfigDb, "PORT")])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_load_json_dump() {
        let db = MemoryDataSource::new();
        let n = db
            .load_json(
                DbId::ConfigDb,
                r#"{"PORT|Ethernet0": {"alias": "etp0", "speed": 100000}, "junk": 3}"#,
            )
            .unwrap();
        assert_eq!(n, 1);
        let out = db
            .fetch_fields(&[Selector::table(DbId::ConfigDb, "PORT")])
            .await
            .unwrap();
        assert_eq!(out["Ethernet0"]["speed"], Value::from(100000));
        assert!(db.load_json(DbId::ConfigDb, "[1,2]").is_err());
    }
}
