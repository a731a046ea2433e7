//! Front-panel port universe shared by the per-port show flows.

use crate::context::ShowContext;
use crate::db::{DbId, Selector};
use crate::error::{Result, ShowError};
use crate::natsort::natsort;
use crate::tables::CFG_PORT_TABLE_NAME;
use tracing::error;

/// CONFIG_DB PORT keys, naturally sorted, optionally narrowed to one port.
///
/// A requested port that is not configured yields `InterfaceNotFound`.
pub async fn front_panel_ports(ctx: &ShowContext, interface: Option<&str>) -> Result<Vec<String>> {
    let selector = Selector::table(DbId::ConfigDb, CFG_PORT_TABLE_NAME);
    let ports = ctx
        .db()
        .fetch_fields(std::slice::from_ref(&selector))
        .await
        .inspect_err(|e| error!(error = %e, "Failed to get front panel ports"))?;

    if let Some(iface) = interface {
        if !ports.contains_key(iface) {
            return Err(ShowError::InterfaceNotFound(iface.to_string()));
        }
        return Ok(vec![iface.to_string()]);
    }

    let mut names: Vec<String> = ports.keys().cloned().collect();
    natsort(&mut names);
    Ok(names)
}
