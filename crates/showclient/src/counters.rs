//! Interface counters (`show interface counters`)
//!
//! A snapshot joins three tables: raw SAI port statistics and computed rates
//! from COUNTERS_DB, and port state/speed from APPL_DB. With a sampling period
//! two snapshots are taken `period` seconds apart and the raw counters are
//! differenced; rates, utilisation and state always come from the newer one.

use crate::alias;
use crate::context::ShowContext;
use crate::db::{DbId, Selector};
use crate::error::{Result, ShowError};
use crate::natsort::natural_cmp;
use crate::port_config::NameAliasMap;
use crate::tables::{
    APP_PORT_TABLE_NAME, COUNTERS_TABLE_NAME, ETHERNET_WILDCARD, MISSING_VALUE, RATES_TABLE_NAME,
    counters as c, fields,
};
use crate::value::{TableData, field_str, row, sum_fields};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

const KB: f64 = 1e3;
const MB: f64 = 1e6;

/// Operational summary shown in the `State` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Admin up, oper up
    Up,
    /// Admin up, oper down
    Down,
    /// Admin down, or no usable port entry
    Disabled,
}

impl LinkState {
    /// Convert state to its column value
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Up => "U",
            LinkState::Down => "D",
            LinkState::Disabled => "X",
        }
    }

    /// Derives the state from an APPL_DB PORT_TABLE row.
    pub fn from_port_row(port_table: &TableData, iface: &str) -> Self {
        if row(port_table, iface).is_none() {
            return LinkState::Disabled;
        }
        let admin = field_str(port_table, iface, fields::ADMIN_STATUS, "");
        let oper = field_str(port_table, iface, fields::OPER_STATUS, "");
        match (admin.as_str(), oper.as_str()) {
            ("up", "up") => LinkState::Up,
            ("up", "down") => LinkState::Down,
            _ => LinkState::Disabled,
        }
    }
}

/// Counters for one interface; every field is display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterfaceCounters {
    pub state: String,
    pub rx_ok: String,
    pub rx_bps: String,
    pub rx_util: String,
    pub rx_err: String,
    pub rx_drp: String,
    pub rx_ovr: String,
    pub tx_ok: String,
    pub tx_bps: String,
    pub tx_util: String,
    pub tx_err: String,
    pub tx_drp: String,
    pub tx_ovr: String,
}

impl InterfaceCounters {
    /// Baseline used when an interface appears only in the newer snapshot.
    pub fn zero() -> Self {
        let zero = || "0".to_string();
        Self {
            state: String::new(),
            rx_ok: zero(),
            rx_bps: String::new(),
            rx_util: String::new(),
            rx_err: zero(),
            rx_drp: zero(),
            rx_ovr: zero(),
            tx_ok: zero(),
            tx_bps: String::new(),
            tx_util: String::new(),
            tx_err: zero(),
            tx_drp: zero(),
            tx_ovr: zero(),
        }
    }

    /// `self - old` for raw counters; display fields are taken from `self`.
    pub fn diff(&self, old: &InterfaceCounters) -> Self {
        Self {
            state: self.state.clone(),
            rx_ok: diff_counter(&old.rx_ok, &self.rx_ok),
            rx_bps: self.rx_bps.clone(),
            rx_util: self.rx_util.clone(),
            rx_err: diff_counter(&old.rx_err, &self.rx_err),
            rx_drp: diff_counter(&old.rx_drp, &self.rx_drp),
            rx_ovr: diff_counter(&old.rx_ovr, &self.rx_ovr),
            tx_ok: diff_counter(&old.tx_ok, &self.tx_ok),
            tx_bps: self.tx_bps.clone(),
            tx_util: self.tx_util.clone(),
            tx_err: diff_counter(&old.tx_err, &self.tx_err),
            tx_drp: diff_counter(&old.tx_drp, &self.tx_drp),
            tx_ovr: diff_counter(&old.tx_ovr, &self.tx_ovr),
        }
    }
}

/// Per-interface counters at one instant, kept in natural name order.
///
/// Serializes as a JSON object keyed by interface name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    entries: Vec<(String, InterfaceCounters)>,
}

impl CounterSnapshot {
    pub fn new(mut entries: Vec<(String, InterfaceCounters)>) -> Self {
        entries.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        Self { entries }
    }

    pub fn get(&self, iface: &str) -> Option<&InterfaceCounters> {
        self.entries
            .iter()
            .find(|(name, _)| name == iface)
            .map(|(_, counters)| counters)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceCounters)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CounterSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, counters) in &self.entries {
            map.serialize_entry(name, counters)?;
        }
        map.end()
    }
}

/// Formats a bytes-per-second rate as B/s, KB/s or MB/s.
pub fn calculate_byte_rate(rate: &str) -> String {
    if rate == MISSING_VALUE {
        return MISSING_VALUE.to_string();
    }
    let Ok(bps) = rate.trim().parse::<f64>() else {
        return MISSING_VALUE.to_string();
    };
    let formatted = if bps > 10.0 * MB {
        format!("{:.2} MB", bps / MB)
    } else if bps > 10.0 * KB {
        format!("{:.2} KB", bps / KB)
    } else {
        format!("{:.2} B", bps)
    };
    formatted + "/s"
}

/// Link utilisation of a byte rate on a port of `speed` Mbps.
pub fn calculate_util(rate: &str, speed: &str) -> String {
    if rate == MISSING_VALUE || speed == MISSING_VALUE {
        return MISSING_VALUE.to_string();
    }
    let (Ok(bps), Ok(mbps)) = (rate.trim().parse::<f64>(), speed.trim().parse::<f64>()) else {
        return MISSING_VALUE.to_string();
    };
    if mbps <= 0.0 {
        return MISSING_VALUE.to_string();
    }
    let util = bps / (mbps * MB / 8.0) * 100.0;
    format!("{:.2}%", util)
}

/// `new - old`, or the sentinel if either side is not a number.
pub fn diff_counter(old: &str, new: &str) -> String {
    if old == MISSING_VALUE || new == MISSING_VALUE {
        return MISSING_VALUE.to_string();
    }
    match (old.trim().parse::<i64>(), new.trim().parse::<i64>()) {
        (Ok(o), Ok(n)) => n.saturating_sub(o).to_string(),
        _ => MISSING_VALUE.to_string(),
    }
}

/// Differences two snapshots over the interfaces of `new`.
pub fn diff_snapshots(old: &CounterSnapshot, new: &CounterSnapshot) -> CounterSnapshot {
    let baseline = InterfaceCounters::zero();
    CounterSnapshot::new(
        new.iter()
            .map(|(name, counters)| {
                let before = old.get(name).unwrap_or(&baseline);
                (name.to_string(), counters.diff(before))
            })
            .collect(),
    )
}

fn counters_for(
    iface: &str,
    port_counters: &TableData,
    port_rates: &TableData,
    port_table: &TableData,
) -> InterfaceCounters {
    let na = MISSING_VALUE;
    let speed = field_str(port_table, iface, fields::SPEED, na);
    let rx_bps = field_str(port_rates, iface, c::RX_BPS, na);
    let tx_bps = field_str(port_rates, iface, c::TX_BPS, na);

    InterfaceCounters {
        state: LinkState::from_port_row(port_table, iface).as_str().to_string(),
        rx_ok: sum_fields(port_counters, iface, na, &[c::IN_UCAST_PKTS, c::IN_NON_UCAST_PKTS]),
        rx_bps: calculate_byte_rate(&rx_bps),
        rx_util: calculate_util(&rx_bps, &speed),
        rx_err: field_str(port_counters, iface, c::IN_ERRORS, na),
        rx_drp: field_str(port_counters, iface, c::IN_DISCARDS, na),
        rx_ovr: field_str(port_counters, iface, c::RX_OVERSIZE_PKTS, na),
        tx_ok: sum_fields(port_counters, iface, na, &[c::OUT_UCAST_PKTS, c::OUT_NON_UCAST_PKTS]),
        tx_bps: calculate_byte_rate(&tx_bps),
        tx_util: calculate_util(&tx_bps, &speed),
        tx_err: field_str(port_counters, iface, c::OUT_ERRORS, na),
        tx_drp: field_str(port_counters, iface, c::OUT_DISCARDS, na),
        tx_ovr: field_str(port_counters, iface, c::TX_OVERSIZE_PKTS, na),
    }
}

async fn fetch_required(ctx: &ShowContext, selector: Selector) -> Result<TableData> {
    ctx.db()
        .fetch_fields(std::slice::from_ref(&selector))
        .await
        .inspect_err(|e| error!(query = %selector, error = %e, "Unable to pull counter data"))
}

/// Interfaces of `filter` present in `known`, accepting aliases.
fn select_interfaces(filter: &[String], known: &TableData, aliases: &NameAliasMap) -> Vec<String> {
    if filter.is_empty() {
        return known.keys().cloned().collect();
    }
    filter
        .iter()
        .filter_map(|iface| {
            if known.contains_key(iface) {
                return Some(iface.clone());
            }
            aliases
                .name_of(iface)
                .filter(|name| known.contains_key(*name))
                .map(str::to_string)
        })
        .collect()
}

/// Reads one snapshot for `filter` (all interfaces when empty).
#[instrument(skip(ctx, aliases))]
pub async fn take_snapshot(
    ctx: &ShowContext,
    filter: &[String],
    aliases: &NameAliasMap,
) -> Result<CounterSnapshot> {
    let (raw_counters, raw_rates, raw_ports) = tokio::try_join!(
        fetch_required(
            ctx,
            Selector::key(DbId::CountersDb, COUNTERS_TABLE_NAME, ETHERNET_WILDCARD)
        ),
        fetch_required(
            ctx,
            Selector::key(DbId::CountersDb, RATES_TABLE_NAME, ETHERNET_WILDCARD)
        ),
        fetch_required(ctx, Selector::table(DbId::ApplDb, APP_PORT_TABLE_NAME)),
    )?;

    let port_counters = alias::remap_alias_keys(raw_counters, aliases);
    let port_rates = alias::remap_alias_keys(raw_rates, aliases);
    let port_table = alias::remap_alias_keys(raw_ports, aliases);

    let snapshot = CounterSnapshot::new(
        select_interfaces(filter, &port_counters, aliases)
            .into_iter()
            .map(|iface| {
                let counters = counters_for(&iface, &port_counters, &port_rates, &port_table);
                (iface, counters)
            })
            .collect(),
    );
    info!(interfaces = snapshot.len(), "counter snapshot taken");
    Ok(snapshot)
}

/// Parameters of a counters query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountersRequest {
    /// Names or aliases to report; empty means every interface.
    pub interfaces: Vec<String>,
    /// Sampling period in seconds; `Some` selects diff mode.
    pub period: Option<u64>,
}

/// `show interface counters [interfaces] [period]`
#[instrument(skip(ctx, cancel))]
pub async fn get_interface_counters(
    ctx: &ShowContext,
    request: &CountersRequest,
    cancel: &CancellationToken,
) -> Result<CounterSnapshot> {
    let max = ctx.config().show.max_period_secs;
    if let Some(period) = request.period
        && period > max
    {
        return Err(ShowError::PeriodTooLarge { period, max });
    }

    let aliases = alias::name_map_best_effort(ctx).await;
    let old = take_snapshot(ctx, &request.interfaces, &aliases).await?;

    let Some(period) = request.period else {
        return Ok(old);
    };

    info!(period, "waiting between counter snapshots");
    tokio::select! {
        _ = cancel.cancelled() => {
            warn!("counters request cancelled before second snapshot");
            return Err(ShowError::Cancelled);
        }
        _ = tokio::time::sleep(Duration::from_secs(period)) => {}
    }

    let new = take_snapshot(ctx, &request.interfaces, &aliases).await?;
    Ok(diff_snapshots(&old, &new))
}
