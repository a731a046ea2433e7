//! Table and field name constants.
//!
//! These match the schema definitions in swss-common.

/// CONFIG_DB table for port configuration.
pub const CFG_PORT_TABLE_NAME: &str = "PORT";

/// CONFIG_DB table holding platform and hwsku.
pub const CFG_DEVICE_METADATA_TABLE_NAME: &str = "DEVICE_METADATA";

/// Key of the local device in DEVICE_METADATA.
pub const DEVICE_METADATA_LOCALHOST: &str = "localhost";

/// CONFIG_DB table for VLAN membership.
pub const CFG_VLAN_MEMBER_TABLE_NAME: &str = "VLAN_MEMBER";

/// APPL_DB table for port state published by portmgrd/portsyncd.
pub const APP_PORT_TABLE_NAME: &str = "PORT_TABLE";

/// STATE_DB table for port state.
pub const STATE_PORT_TABLE_NAME: &str = "PORT_TABLE";

/// STATE_DB table for port operational errors.
pub const STATE_PORT_OPERR_TABLE_NAME: &str = "PORT_OPERR_TABLE";

/// COUNTERS_DB table of raw port statistics.
pub const COUNTERS_TABLE_NAME: &str = "COUNTERS";

/// COUNTERS_DB table of computed port rates.
pub const RATES_TABLE_NAME: &str = "RATES";

/// COUNTERS_DB map from port name to SAI object id.
pub const COUNTERS_PORT_NAME_MAP: &str = "COUNTERS_PORT_NAME_MAP";

/// Key pattern selecting every front-panel port.
pub const ETHERNET_WILDCARD: &str = "Ethernet*";

/// Placeholder for values that cannot be read or computed.
pub const MISSING_VALUE: &str = "N/A";

/// Field names used in port tables.
pub mod fields {
    /// Inline alias attribute.
    pub const ALIAS: &str = "alias";

    /// Port speed in Mbps.
    pub const SPEED: &str = "speed";

    /// Port admin status (up/down).
    pub const ADMIN_STATUS: &str = "admin_status";

    /// Port oper status (up/down).
    pub const OPER_STATUS: &str = "oper_status";

    /// Forward error correction mode.
    pub const FEC: &str = "fec";

    /// Switchport mode (access/trunk/routed).
    pub const MODE: &str = "mode";

    /// VLAN membership tagging mode.
    pub const TAGGING_MODE: &str = "tagging_mode";

    /// DEVICE_METADATA platform string.
    pub const PLATFORM: &str = "platform";

    /// DEVICE_METADATA hardware SKU string.
    pub const HWSKU: &str = "hwsku";
}

/// Field names in the COUNTERS and RATES tables.
pub mod counters {
    pub const IN_UCAST_PKTS: &str = "SAI_PORT_STAT_IF_IN_UCAST_PKTS";
    pub const IN_NON_UCAST_PKTS: &str = "SAI_PORT_STAT_IF_IN_NON_UCAST_PKTS";
    pub const IN_ERRORS: &str = "SAI_PORT_STAT_IF_IN_ERRORS";
    pub const IN_DISCARDS: &str = "SAI_PORT_STAT_IF_IN_DISCARDS";
    pub const RX_OVERSIZE_PKTS: &str = "SAI_PORT_STAT_ETHER_RX_OVERSIZE_PKTS";
    pub const OUT_UCAST_PKTS: &str = "SAI_PORT_STAT_IF_OUT_UCAST_PKTS";
    pub const OUT_NON_UCAST_PKTS: &str = "SAI_PORT_STAT_IF_OUT_NON_UCAST_PKTS";
    pub const OUT_ERRORS: &str = "SAI_PORT_STAT_IF_OUT_ERRORS";
    pub const OUT_DISCARDS: &str = "SAI_PORT_STAT_IF_OUT_DISCARDS";
    pub const TX_OVERSIZE_PKTS: &str = "SAI_PORT_STAT_ETHER_TX_OVERSIZE_PKTS";
    pub const RX_BPS: &str = "RX_BPS";
    pub const TX_BPS: &str = "TX_BPS";
}
