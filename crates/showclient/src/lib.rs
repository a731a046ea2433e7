//! SONiC interface show client
//!
//! Answers read-only `show interface ...` queries from the switch databases
//! (CONFIG_DB, APPL_DB, STATE_DB, COUNTERS_DB) and the platform port_config
//! files, returning JSON payloads:
//!
//! - `interface alias`: name/alias pairs
//! - `interface counters`: per-port counters, optionally differenced over a period
//! - `interface errors`: port operational error history
//! - `interface fec status`: admin and operational FEC
//! - `interface switchport config|status`: switchport mode and VLAN membership

pub mod alias;
pub mod config;
pub mod context;
pub mod counters;
pub mod db;
pub mod error;
pub mod fec;
pub mod host;
pub mod natsort;
pub mod port_config;
pub mod port_errors;
pub mod ports;
pub mod redis_adapter;
pub mod router;
pub mod switchport;
pub mod tables;
pub mod value;

pub use alias::{ALIAS_SCHEMA_VERSION, AliasView, InterfaceAlias, get_interface_alias};
pub use config::{DEFAULT_CONFIG_PATH, ShowClientConfig};
pub use context::ShowContext;
pub use counters::{CounterSnapshot, CountersRequest, InterfaceCounters, get_interface_counters};
pub use db::{DataSource, DbId, MemoryDataSource, Selector};
pub use error::*;
pub use fec::{FecStatus, get_interface_fec_status};
pub use host::{HostFs, LocalHostFs, MemoryHostFs};
pub use natsort::natsort;
pub use port_config::NameAliasMap;
pub use port_errors::{PortErrorRecord, get_interface_errors};
pub use redis_adapter::RedisDataSource;
pub use router::{OptionMap, ShowPath, ShowRouter};
pub use switchport::{SwitchportConfig, SwitchportStatus, get_switchport_config, get_switchport_status};
