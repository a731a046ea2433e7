//! FEC status (`show interface fec status`)

use crate::context::ShowContext;
use crate::db::{DbId, Selector};
use crate::error::Result;
use crate::ports::front_panel_ports;
use crate::tables::{APP_PORT_TABLE_NAME, MISSING_VALUE, STATE_PORT_TABLE_NAME, fields};
use crate::value::{TableData, field_str};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FecStatus {
    #[serde(rename = "Interface")]
    pub interface: String,
    #[serde(rename = "FEC Oper")]
    pub oper: String,
    #[serde(rename = "FEC Admin")]
    pub admin: String,
}

impl FecStatus {
    /// Oper FEC is only meaningful while the port is operationally up.
    fn from_tables(port: &str, appl: &TableData, state: &TableData) -> Self {
        let admin = field_str(appl, port, fields::FEC, MISSING_VALUE);
        let oper_status = field_str(appl, port, fields::OPER_STATUS, MISSING_VALUE);
        let oper = if oper_status == "up" {
            field_str(state, port, fields::FEC, MISSING_VALUE)
        } else {
            MISSING_VALUE.to_string()
        };
        Self {
            interface: port.to_string(),
            oper,
            admin,
        }
    }
}

async fn fetch_table(ctx: &ShowContext, db: DbId, table: &str) -> Result<TableData> {
    let selector = Selector::table(db, table);
    ctx.db()
        .fetch_fields(std::slice::from_ref(&selector))
        .await
        .inspect_err(|e| error!(query = %selector, error = %e, "Failed to get FEC status"))
}

#[instrument(skip(ctx))]
pub async fn get_interface_fec_status(
    ctx: &ShowContext,
    interface: Option<&str>,
) -> Result<Vec<FecStatus>> {
    let ports = front_panel_ports(ctx, interface).await?;
    let (appl, state) = tokio::try_join!(
        fetch_table(ctx, DbId::ApplDb, APP_PORT_TABLE_NAME),
        fetch_table(ctx, DbId::StateDb, STATE_PORT_TABLE_NAME),
    )?;

    Ok(ports
        .iter()
        .map(|port| FecStatus::from_tables(port, &appl, &state))
        .collect())
}
