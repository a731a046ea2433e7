//! Port operational errors (`show interface errors`)

use crate::alias;
use crate::context::ShowContext;
use crate::db::{DbId, Selector};
use crate::error::Result;
use crate::tables::STATE_PORT_OPERR_TABLE_NAME;
use crate::value::{TableData, flat_str};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// (count field, timestamp field) for every reported error kind, in output order.
pub const PORT_ERROR_KINDS: [(&str, &str); 14] = [
    ("oper_error_status", "oper_error_status_time"),
    ("mac_local_fault_count", "mac_local_fault_time"),
    ("mac_remote_fault_count", "mac_remote_fault_time"),
    ("fec_sync_loss_count", "fec_sync_loss_time"),
    ("fec_alignment_loss_count", "fec_alignment_loss_time"),
    ("high_ser_error_count", "high_ser_error_time"),
    ("high_ber_error_count", "high_ber_error_time"),
    ("data_unit_crc_error_count", "data_unit_crc_error_time"),
    ("data_unit_misalignment_error_count", "data_unit_misalignment_error_time"),
    ("signal_local_error_count", "signal_local_error_time"),
    ("crc_rate_count", "crc_rate_time"),
    ("data_unit_size_count", "data_unit_size_time"),
    ("code_group_error_count", "code_group_error_time"),
    ("no_rx_reachability_count", "no_rx_reachability_time"),
];

const DEFAULT_COUNT: &str = "0";
const DEFAULT_TIMESTAMP: &str = "Never";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortErrorRecord {
    #[serde(rename = "Port Errors")]
    pub port_error: String,
    #[serde(rename = "Count")]
    pub count: String,
    #[serde(rename = "Last timestamp(UTC)")]
    pub last_timestamp: String,
}

/// `mac_local_fault_count` -> `mac local fault`
pub fn error_label(count_field: &str) -> String {
    count_field.replace('_', " ").replace(" count", "")
}

fn records_from(row: &TableData) -> Vec<PortErrorRecord> {
    PORT_ERROR_KINDS
        .iter()
        .map(|(count_field, time_field)| PortErrorRecord {
            port_error: error_label(count_field),
            count: flat_str(row, count_field, DEFAULT_COUNT),
            last_timestamp: flat_str(row, time_field, DEFAULT_TIMESTAMP),
        })
        .collect()
}

/// Error history for one port; a missing or unreadable row reads as no errors.
#[instrument(skip(ctx))]
pub async fn get_interface_errors(ctx: &ShowContext, interface: &str) -> Result<Vec<PortErrorRecord>> {
    let aliases = alias::name_map_best_effort(ctx).await;
    let name = if aliases.contains_name(interface) {
        interface
    } else {
        aliases.name_of(interface).unwrap_or(interface)
    };

    let selector = Selector::key(DbId::StateDb, STATE_PORT_OPERR_TABLE_NAME, name);
    let row = match ctx.db().fetch_fields(std::slice::from_ref(&selector)).await {
        Ok(row) => row,
        Err(e) => {
            warn!(query = %selector, error = %e, "port error table unavailable");
            TableData::new()
        }
    };
    debug!(interface = name, fields = row.len(), "port error row read");

    Ok(records_from(&row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShowClientConfig;
    use crate::db::MemoryDataSource;
    use crate::host::MemoryHostFs;
    use std::sync::Arc;

    fn ctx(db: MemoryDataSource) -> ShowContext {
        ShowContext::new(
            Arc::new(db),
            Arc::new(MemoryHostFs::new()),
            ShowClientConfig::default(),
        )
    }

    #[test]
    fn test_error_label() {
        assert_eq!(error_label("oper_error_status"), "oper error status");
        assert_eq!(error_label("mac_local_fault_count"), "mac local fault");
        assert_eq!(error_label("no_rx_reachability_count"), "no rx reachability");
    }

    #[tokio::test]
    async fn test_errors_default_when_row_missing() {
        let records = get_interface_errors(&ctx(MemoryDataSource::new()), "Ethernet0")
            .await
            .unwrap();
        assert_eq!(records.len(), 14);
        assert!(records.iter().all(|r| r.count == "0" && r.last_timestamp == "Never"));
        assert_eq!(records[0].port_error, "oper error status");
        assert_eq!(records[13].port_error, "no rx reachability");
    }

    #[tokio::test]
    async fn test_errors_read_from_state_db() {
        let db = MemoryDataSource::new();
        db.hset(
            DbId::StateDb,
            "PORT_OPERR_TABLE",
            "Ethernet0",
            &[
                ("mac_local_fault_count", "3"),
                ("mac_local_fault_time", "2025-01-01 00:00:00"),
                ("crc_rate_count", "1"),
            ],
        );
        let records = get_interface_errors(&ctx(db), "Ethernet0").await.unwrap();

        assert_eq!(records[1].count, "3");
        assert_eq!(records[1].last_timestamp, "2025-01-01 00:00:00");
        assert_eq!(records[10].port_error, "crc rate");
        assert_eq!(records[10].count, "1");
        assert_eq!(records[10].last_timestamp, "Never");
    }

    #[tokio::test]
    async fn test_errors_tolerate_fetch_failure() {
        let db = MemoryDataSource::new();
        db.fail_table(DbId::StateDb, "PORT_OPERR_TABLE");
        let records = get_interface_errors(&ctx(db), "Ethernet0").await.unwrap();
        assert_eq!(records.len(), 14);
    }

    #[test]
    fn test_record_field_names() {
        let record = PortErrorRecord {
            port_error: "crc rate".into(),
            count: "0".into(),
            last_timestamp: "Never".into(),
        };
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(
            text,
            r#"{"Port Errors":"crc rate","Count":"0","Last timestamp(UTC)":"Never"}"#
        );
    }
}
