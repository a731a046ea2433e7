//! Interface alias resolution (`show interface alias`)
//!
//! The canonical interface name is the only join key; the alias is for
//! display. Aliases come from, in increasing precedence on collision:
//!
//! 1. `<etc_dir>/port_config.{ini,json}`
//! 2. `<device_dir>/<platform>/<hwsku>/` and `<device_dir>/<platform>/` files
//! 3. per-ASIC files globbed under `<device_dir>/<platform>/<hwsku>/`
//!
//! An `alias` attribute on any CONFIG_DB PORT entry preempts all of them.

use crate::context::ShowContext;
use crate::db::{DbId, Selector};
use crate::error::{Result, ShowError};
use crate::natsort::natsort;
use crate::port_config::{self, NameAliasMap, PortConfigFormat};
use crate::tables::{
    CFG_DEVICE_METADATA_TABLE_NAME, CFG_PORT_TABLE_NAME, DEVICE_METADATA_LOCALHOST,
    ETHERNET_WILDCARD, RATES_TABLE_NAME, fields,
};
use crate::value::{TableData, TolerantValue, flat_str, has_field};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, error, info, instrument, warn};

/// Version of the alias response shape (list of `{Name, Alias}` records).
pub const ALIAS_SCHEMA_VERSION: u32 = 1;

/// One `show interface alias` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterfaceAlias {
    pub name: String,
    pub alias: String,
}

impl InterfaceAlias {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// Platform and hardware SKU from DEVICE_METADATA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformIdentity {
    pub platform: String,
    pub hwsku: String,
}

impl PlatformIdentity {
    /// Reads `DEVICE_METADATA|localhost`; `None` unless both fields are set.
    pub async fn discover(ctx: &ShowContext) -> Option<Self> {
        let selector = Selector::key(
            DbId::ConfigDb,
            CFG_DEVICE_METADATA_TABLE_NAME,
            DEVICE_METADATA_LOCALHOST,
        );
        let metadata = match ctx.db().fetch_fields(&[selector]).await {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "DEVICE_METADATA not readable");
                return None;
            }
        };
        let platform = flat_str(&metadata, fields::PLATFORM, "");
        let hwsku = flat_str(&metadata, fields::HWSKU, "");
        (!platform.is_empty() && !hwsku.is_empty()).then_some(Self { platform, hwsku })
    }
}

/// Where port configuration may be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortConfigSource {
    /// A single candidate path.
    File(String),
    /// A glob; every match is read in listing order.
    Glob(String),
}

/// Ordered port config sources, lowest precedence first.
pub fn port_config_sources(
    etc_dir: &str,
    device_dir: &str,
    identity: Option<&PlatformIdentity>,
) -> Vec<PortConfigSource> {
    let etc = etc_dir.trim_end_matches('/');
    let mut sources = vec![
        PortConfigSource::File(format!("{}/port_config.ini", etc)),
        PortConfigSource::File(format!("{}/port_config.json", etc)),
    ];

    let Some(id) = identity else {
        return sources;
    };
    let plat_dir = format!("{}/{}", device_dir.trim_end_matches('/'), id.platform);
    let sku_dir = format!("{}/{}", plat_dir, id.hwsku);

    for dir in [&sku_dir, &plat_dir] {
        sources.push(PortConfigSource::File(format!("{}/port_config.ini", dir)));
        sources.push(PortConfigSource::File(format!("{}/port_config.json", dir)));
    }
    for pattern in [
        "port_config*.ini",
        "port_config*.json",
        "*/port_config*.ini",
        "*/port_config*.json",
    ] {
        sources.push(PortConfigSource::Glob(format!("{}/{}", sku_dir, pattern)));
    }
    sources
}

/// Reads and merges every port config file reachable from the sources.
#[instrument(skip(ctx))]
pub async fn load_file_aliases(ctx: &ShowContext) -> NameAliasMap {
    let identity = PlatformIdentity::discover(ctx).await;
    let paths = &ctx.config().paths;
    let sources = port_config_sources(&paths.etc_dir, &paths.device_dir, identity.as_ref());

    let mut parsed = Vec::new();
    let mut files_tried = 0usize;
    for source in &sources {
        let files = match source {
            PortConfigSource::File(path) => vec![path.clone()],
            PortConfigSource::Glob(pattern) => ctx.host().list_files(pattern).await,
        };
        for file in files {
            files_tried += 1;
            if let Some(bytes) = ctx.host().read_file(&file).await {
                parsed.push(port_config::parse(PortConfigFormat::from_path(&file), &bytes));
            }
        }
    }

    let files_loaded = parsed.len();
    let merged = NameAliasMap::merged(parsed);
    debug!(
        entries = merged.len(),
        files_tried, files_loaded, "port_config aliases loaded"
    );
    merged
}

/// Re-keys rows stored under an alias to the canonical name.
pub fn remap_alias_keys(table: TableData, aliases: &NameAliasMap) -> TableData {
    if aliases.is_empty() {
        return table;
    }
    table
        .into_iter()
        .map(|(key, row)| {
            if aliases.contains_name(&key) {
                return (key, row);
            }
            match aliases.name_of(&key) {
                Some(name) => (name.to_string(), row),
                None => (key, row),
            }
        })
        .collect()
}

/// Name/alias pairs carried inline by PORT entries, if any entry has one.
fn inline_aliases(ports: &TableData) -> Option<NameAliasMap> {
    if !ports.values().any(|row| has_field(row, fields::ALIAS)) {
        return None;
    }
    let mut map = NameAliasMap::new();
    for (name, row) in ports {
        if let Some(alias) = row.get(fields::ALIAS).and_then(TolerantValue::as_string) {
            map.insert(name.as_str(), alias);
        }
    }
    Some(map)
}

/// Resolved interface universe for one request
#[derive(Debug, Clone)]
pub struct AliasView {
    ports: TableData,
    aliases: NameAliasMap,
    inline: bool,
}

impl AliasView {
    /// Builds the view from a PORT table and the file-derived map.
    ///
    /// `file_aliases` is ignored when any entry carries an inline alias.
    pub fn build(ports: TableData, file_aliases: NameAliasMap) -> Self {
        match inline_aliases(&ports) {
            Some(aliases) => Self {
                ports,
                aliases,
                inline: true,
            },
            None => Self {
                ports: remap_alias_keys(ports, &file_aliases),
                aliases: file_aliases,
                inline: false,
            },
        }
    }

    /// True when PORT entries carried the aliases.
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// The name/alias map in effect.
    pub fn aliases(&self) -> &NameAliasMap {
        &self.aliases
    }

    /// PORT keys plus names only known from port config files.
    pub fn universe(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.ports.keys().map(String::as_str).collect();
        if !self.inline {
            names.extend(self.aliases.names());
        }
        names.into_iter().map(str::to_string).collect()
    }

    /// Resolves a name or alias to the canonical name.
    pub fn select(&self, interface: &str) -> Result<String> {
        if self.ports.contains_key(interface) {
            return Ok(interface.to_string());
        }
        if let Some(name) = self.aliases.name_of(interface) {
            if self.ports.contains_key(name) || self.aliases.contains_name(name) {
                return Ok(name.to_string());
            }
            return Err(ShowError::InterfaceNotFound(interface.to_string()));
        }
        if self.aliases.contains_name(interface) {
            return Ok(interface.to_string());
        }
        Err(ShowError::InterfaceNotFound(interface.to_string()))
    }

    /// Display alias for a canonical name; the name itself when unknown.
    pub fn alias_for(&self, name: &str) -> String {
        if let Some(row) = self.ports.get(name)
            && let Some(alias) = row.get(fields::ALIAS).and_then(TolerantValue::as_string)
        {
            return alias;
        }
        match self.aliases.alias_of(name) {
            Some(alias) if !alias.is_empty() => alias.to_string(),
            _ => name.to_string(),
        }
    }
}

async fn fetch_ports(ctx: &ShowContext) -> Result<TableData> {
    let selector = Selector::table(DbId::ConfigDb, CFG_PORT_TABLE_NAME);
    ctx.db().fetch_fields(&[selector]).await.map_err(|e| {
        error!(error = %e, "Failed to get ports from CONFIG_DB");
        e
    })
}

/// Builds the alias view, reading files only when PORT has no inline aliases.
pub async fn resolve(ctx: &ShowContext) -> Result<AliasView> {
    let ports = fetch_ports(ctx).await?;

    // Warm-up read; its outcome does not matter.
    let warmup = Selector::key(DbId::CountersDb, RATES_TABLE_NAME, ETHERNET_WILDCARD);
    if let Err(e) = ctx.db().fetch_fields(&[warmup]).await {
        debug!(error = %e, "warm-up read failed");
    }

    let file_aliases = if inline_aliases(&ports).is_some() {
        NameAliasMap::new()
    } else {
        load_file_aliases(ctx).await
    };
    let view = AliasView::build(ports, file_aliases);
    info!(
        ports = view.ports.len(),
        inline = view.inline,
        mapped = view.aliases.len(),
        "resolved interface aliases"
    );
    Ok(view)
}

/// Name/alias map for flows that only need to re-key rows.
///
/// PORT read failures degrade to an empty map.
pub async fn name_map_best_effort(ctx: &ShowContext) -> NameAliasMap {
    match resolve(ctx).await {
        Ok(view) => view.aliases,
        Err(e) => {
            warn!(error = %e, "alias map unavailable, using names as-is");
            NameAliasMap::new()
        }
    }
}

/// `show interface alias [interface]`
#[instrument(skip(ctx))]
pub async fn get_interface_alias(
    ctx: &ShowContext,
    interface: Option<&str>,
) -> Result<Vec<InterfaceAlias>> {
    let view = resolve(ctx).await?;

    let names = match interface {
        Some(selector) => vec![view.select(selector)?],
        None => {
            let mut names = view.universe();
            natsort(&mut names);
            names
        }
    };

    Ok(names
        .into_iter()
        .map(|name| {
            let alias = view.alias_for(&name);
            InterfaceAlias { name, alias }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ports(v: serde_json::Value) -> TableData {
        v.as_object().cloned().unwrap()
    }

    fn file_map(pairs: &[(&str, &str)]) -> NameAliasMap {
        let mut m = NameAliasMap::new();
        for (n, a) in pairs {
            m.insert(*n, *a);
        }
        m
    }

    #[test]
    fn test_sources_without_identity() {
        let sources = port_config_sources("/etc/sonic/", "/usr/share/sonic/device", None);
        assert_eq!(
            sources,
            vec![
                PortConfigSource::File("/etc/sonic/port_config.ini".into()),
                PortConfigSource::File("/etc/sonic/port_config.json".into()),
            ]
        );
    }

    #[test]
    fn test_sources_with_identity_end_with_globs() {
        let id = PlatformIdentity {
            platform: "x86_64-acme".into(),
            hwsku: "AcmeSku".into(),
        };
        let sources = port_config_sources("/etc/sonic", "/usr/share/sonic/device", Some(&id));
        assert_eq!(sources.len(), 10);
        assert_eq!(
            sources[2],
            PortConfigSource::File(
                "/usr/share/sonic/device/x86_64-acme/AcmeSku/port_config.ini".into()
            )
        );
        assert_eq!(
            sources[4],
            PortConfigSource::File("/usr/share/sonic/device/x86_64-acme/port_config.ini".into())
        );
        assert_eq!(
            sources[9],
            PortConfigSource::Glob(
                "/usr/share/sonic/device/x86_64-acme/AcmeSku/*/port_config*.json".into()
            )
        );
    }

    #[test]
    fn test_inline_alias_is_authoritative() {
        let view = AliasView::build(
            ports(json!({"Ethernet0": {"alias": "etp0"}, "Ethernet4": {"speed": "1"}})),
            file_map(&[("Ethernet4", "fp1"), ("Ethernet-IB0", "Inband0")]),
        );
        assert!(view.is_inline());
        assert_eq!(view.universe(), vec!["Ethernet0", "Ethernet4"]);
        assert_eq!(view.alias_for("Ethernet0"), "etp0");
        assert_eq!(view.alias_for("Ethernet4"), "Ethernet4");
        assert_eq!(view.select("etp0").unwrap(), "Ethernet0");
    }

    #[test]
    fn test_alias_keyed_ports_are_remapped() {
        let view = AliasView::build(
            ports(json!({"etp0": {"admin_status": "up"}, "etp10": {"admin_status": "up"}})),
            file_map(&[("Ethernet0", "etp0"), ("Ethernet40", "etp10")]),
        );
        assert_eq!(view.universe(), vec!["Ethernet0", "Ethernet40"]);
        assert_eq!(view.alias_for("Ethernet40"), "etp10");
    }

    #[test]
    fn test_select_paths() {
        let view = AliasView::build(
            ports(json!({"Ethernet0": {}})),
            file_map(&[("Ethernet0", "etp0"), ("Ethernet-IB0", "Inband0")]),
        );
        assert_eq!(view.select("Ethernet0").unwrap(), "Ethernet0");
        assert_eq!(view.select("etp0").unwrap(), "Ethernet0");
        assert_eq!(view.select("Inband0").unwrap(), "Ethernet-IB0");
        assert_eq!(view.select("Ethernet-IB0").unwrap(), "Ethernet-IB0");
        assert!(matches!(
            view.select("Ethernet999"),
            Err(ShowError::InterfaceNotFound(_))
        ));
    }

    #[test]
    fn test_alias_defaults_to_name() {
        let view = AliasView::build(
            ports(json!({"Ethernet999": {"admin_status": "up"}})),
            NameAliasMap::new(),
        );
        assert_eq!(view.alias_for("Ethernet999"), "Ethernet999");
    }

    #[test]
    fn test_remap_leaves_names_alone() {
        let aliases = file_map(&[("Ethernet0", "Ethernet4"), ("Ethernet4", "etp1")]);
        let table = ports(json!({"Ethernet4": {"x": "1"}, "etp1": {"x": "2"}}));
        let remapped = remap_alias_keys(table, &aliases);
        assert_eq!(remapped["Ethernet4"]["x"], "2");
        assert_eq!(remapped.len(), 1);
    }
}
