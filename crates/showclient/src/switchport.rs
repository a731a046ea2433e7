//! Switchport mode and VLAN membership (`show interface switchport ...`)

use crate::context::ShowContext;
use crate::db::{DbId, Selector};
use crate::error::Result;
use crate::ports::front_panel_ports;
use crate::tables::{CFG_PORT_TABLE_NAME, CFG_VLAN_MEMBER_TABLE_NAME, fields};
use crate::value::{TableData, field_str};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, instrument};

const VLAN_PREFIX: &str = "Vlan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchportMode {
    Access,
    Trunk,
    Routed,
}

impl SwitchportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchportMode::Access => "access",
            SwitchportMode::Trunk => "trunk",
            SwitchportMode::Routed => "routed",
        }
    }
}

/// VLAN memberships of one port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortVlans {
    pub tagged: BTreeSet<u16>,
    pub untagged: BTreeSet<u16>,
}

impl PortVlans {
    pub fn is_empty(&self) -> bool {
        self.tagged.is_empty() && self.untagged.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchportConfig {
    #[serde(rename = "Interface")]
    pub interface: String,
    #[serde(rename = "Mode")]
    pub mode: String,
    #[serde(rename = "Tagged")]
    pub tagged: String,
    #[serde(rename = "Untagged")]
    pub untagged: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchportStatus {
    #[serde(rename = "Interface")]
    pub interface: String,
    #[serde(rename = "Mode")]
    pub mode: String,
}

/// Groups `Vlan<id>|<port>` member rows by port.
pub fn vlan_memberships(members: &TableData) -> HashMap<String, PortVlans> {
    let sep = DbId::ConfigDb.separator();
    let mut by_port: HashMap<String, PortVlans> = HashMap::new();
    for key in members.keys() {
        let Some((vlan, port)) = key.split_once(sep) else {
            continue;
        };
        let Some(vid) = vlan
            .strip_prefix(VLAN_PREFIX)
            .and_then(|id| id.parse::<u16>().ok())
        else {
            debug!(key = %key, "skipping malformed VLAN member key");
            continue;
        };
        let entry = by_port.entry(port.to_string()).or_default();
        if field_str(members, key, fields::TAGGING_MODE, "") == "untagged" {
            entry.untagged.insert(vid);
        } else {
            entry.tagged.insert(vid);
        }
    }
    by_port
}

fn port_mode(ports: &TableData, port: &str, vlans: Option<&PortVlans>) -> String {
    let configured = field_str(ports, port, fields::MODE, "");
    if !configured.is_empty() {
        return configured;
    }
    match vlans {
        Some(v) if !v.is_empty() => SwitchportMode::Trunk.as_str().to_string(),
        _ => SwitchportMode::Routed.as_str().to_string(),
    }
}

fn join_ids(ids: &BTreeSet<u16>) -> String {
    ids.iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

struct SwitchportView {
    names: Vec<String>,
    ports: TableData,
    vlans: HashMap<String, PortVlans>,
}

async fn load(ctx: &ShowContext, interface: Option<&str>) -> Result<SwitchportView> {
    let names = front_panel_ports(ctx, interface).await?;
    let port_sel = Selector::table(DbId::ConfigDb, CFG_PORT_TABLE_NAME);
    let member_sel = Selector::table(DbId::ConfigDb, CFG_VLAN_MEMBER_TABLE_NAME);

    let (ports, members) = tokio::try_join!(
        ctx.db().fetch_fields(std::slice::from_ref(&port_sel)),
        ctx.db().fetch_fields(std::slice::from_ref(&member_sel)),
    )
    .inspect_err(|e| error!(error = %e, "Failed to read switchport configuration"))?;

    Ok(SwitchportView {
        names,
        ports,
        vlans: vlan_memberships(&members),
    })
}

#[instrument(skip(ctx))]
pub async fn get_switchport_config(
    ctx: &ShowContext,
    interface: Option<&str>,
) -> Result<Vec<SwitchportConfig>> {
    let view = load(ctx, interface).await?;
    Ok(view
        .names
        .iter()
        .map(|port| {
            let vlans = view.vlans.get(port);
            SwitchportConfig {
                interface: port.clone(),
                mode: port_mode(&view.ports, port, vlans),
                tagged: vlans.map(|v| join_ids(&v.tagged)).unwrap_or_default(),
                untagged: vlans.map(|v| join_ids(&v.untagged)).unwrap_or_default(),
            }
        })
        .collect())
}

#[instrument(skip(ctx))]
pub async fn get_switchport_status(
    ctx: &ShowContext,
    interface: Option<&str>,
) -> Result<Vec<SwitchportStatus>> {
    let view = load(ctx, interface).await?;
    Ok(view
        .names
        .iter()
        .map(|port| SwitchportStatus {
            interface: port.clone(),
            mode: port_mode(&view.ports, port, view.vlans.get(port)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShowClientConfig;
    use crate::db::MemoryDataSource;
    use crate::error::ShowError;
    use crate::host::MemoryHostFs;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn setup() -> ShowContext {
        let db = MemoryDataSource::new();
        for i in 0..8 {
            db.hset(DbId::ConfigDb, "PORT", &format!("Ethernet{}", i), &[("speed", "100000")]);
        }
        for i in 0..6 {
            db.hset(
                DbId::ConfigDb,
                "VLAN_MEMBER",
                &format!("Vlan1000|Ethernet{}", i),
                &[("tagging_mode", "untagged")],
            );
        }
        ShowContext::new(
            Arc::new(db),
            Arc::new(MemoryHostFs::new()),
            ShowClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_switchport_config() {
        let config = get_switchport_config(&setup(), None).await.unwrap();
        assert_eq!(config.len(), 8);
        assert_eq!(
            config[0],
            SwitchportConfig {
                interface: "Ethernet0".into(),
                mode: "trunk".into(),
                tagged: "".into(),
                untagged: "1000".into(),
            }
        );
        assert_eq!(
            config[6],
            SwitchportConfig {
                interface: "Ethernet6".into(),
                mode: "routed".into(),
                tagged: "".into(),
                untagged: "".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_switchport_status_single() {
        let status = get_switchport_status(&setup(), Some("Ethernet0")).await.unwrap();
        let text = serde_json::to_string(&status).unwrap();
        assert_eq!(text, r#"[{"Interface":"Ethernet0","Mode":"trunk"}]"#);

        let err = get_switchport_status(&setup(), Some("Ethernet99")).await.unwrap_err();
        assert!(matches!(err, ShowError::InterfaceNotFound(_)));
    }

    #[test]
    fn test_vlan_memberships_split_by_tagging() {
        let members = serde_json::json!({
            "Vlan200|Ethernet0": {"tagging_mode": "tagged"},
            "Vlan100|Ethernet0": {"tagging_mode": "tagged"},
            "Vlan300|Ethernet0": {"tagging_mode": "untagged"},
            "Vlan20|Ethernet4": {},
            "bogus": {},
        });
        let map = vlan_memberships(members.as_object().unwrap());
        let eth0 = &map["Ethernet0"];
        assert_eq!(join_ids(&eth0.tagged), "100,200");
        assert_eq!(join_ids(&eth0.untagged), "300");
        assert_eq!(join_ids(&map["Ethernet4"].tagged), "20");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_configured_mode_wins() {
        let ports = serde_json::json!({"Ethernet0": {"mode": "access"}});
        let ports = ports.as_object().unwrap();
        assert_eq!(port_mode(ports, "Ethernet0", None), "access");
        assert_eq!(port_mode(ports, "Ethernet4", None), "routed");
    }
}
