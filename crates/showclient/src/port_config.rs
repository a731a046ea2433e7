//! Port configuration file parsing
//!
//! Platforms describe physical port identity in `port_config.ini` (a
//! whitespace-separated table) or `port_config.json` (a CONFIG_DB style
//! `PORT` object). Both reduce to a bidirectional name/alias map. Parsing is
//! best-effort: malformed input yields an empty map, never an error.
//!
//! Tabular format, with header:
//! ```text
//! name        lanes    alias   index
//! Ethernet0   1,2,3,4  etp0    0
//! ```
//! Without a recognisable header the legacy layout is assumed: name in
//! column 0, alias in column 2.

use crate::tables::{CFG_PORT_TABLE_NAME, fields};
use crate::value::TolerantValue;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Legacy tabular layout: name column.
const LEGACY_NAME_COLUMN: usize = 0;
/// Legacy tabular layout: alias column.
const LEGACY_ALIAS_COLUMN: usize = 2;
/// Rows shorter than this are ignored while looking for the header.
const MIN_HEADER_COLUMNS: usize = 3;

/// Bidirectional interface name/alias mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameAliasMap {
    name_to_alias: HashMap<String, String>,
    alias_to_name: HashMap<String, String>,
}

impl NameAliasMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one pair. Empty names or aliases are dropped.
    pub fn insert(&mut self, name: impl Into<String>, alias: impl Into<String>) {
        let (name, alias) = (name.into(), alias.into());
        if name.is_empty() || alias.is_empty() {
            return;
        }
        self.alias_to_name.insert(alias.clone(), name.clone());
        self.name_to_alias.insert(name, alias);
    }

    /// Alias recorded for `name`.
    pub fn alias_of(&self, name: &str) -> Option<&str> {
        self.name_to_alias.get(name).map(String::as_str)
    }

    /// Name recorded for `alias`.
    pub fn name_of(&self, alias: &str) -> Option<&str> {
        self.alias_to_name.get(alias).map(String::as_str)
    }

    /// True when `name` appears as a name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.name_to_alias.contains_key(name)
    }

    /// All names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name_to_alias.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_alias.is_empty()
    }

    pub fn len(&self) -> usize {
        self.name_to_alias.len()
    }

    /// Overlays `other` on `self`; `other` wins every key collision.
    pub fn merge(&mut self, other: NameAliasMap) {
        self.name_to_alias.extend(other.name_to_alias);
        self.alias_to_name.extend(other.alias_to_name);
    }

    /// Folds sources in precedence order, lowest first.
    pub fn merged<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = NameAliasMap>,
    {
        sources.into_iter().fold(Self::new(), |mut acc, src| {
            acc.merge(src);
            acc
        })
    }
}

/// On-disk port configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortConfigFormat {
    /// Whitespace-separated columns (`port_config.ini`)
    Tabular,
    /// JSON with a `PORT` object (`port_config.json`)
    Structured,
}

impl PortConfigFormat {
    /// Chooses the format from the file extension.
    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".json") {
            PortConfigFormat::Structured
        } else {
            PortConfigFormat::Tabular
        }
    }
}

/// Parses file contents in the given format.
pub fn parse(format: PortConfigFormat, bytes: &[u8]) -> NameAliasMap {
    match format {
        PortConfigFormat::Tabular => parse_tabular(bytes),
        PortConfigFormat::Structured => parse_structured(bytes),
    }
}

fn data_lines(text: &str) -> impl Iterator<Item = Vec<&str>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.split_whitespace().collect())
}

/// Locates (name, alias) columns in a header row.
fn header_columns(cols: &[&str]) -> Option<(usize, usize)> {
    let mut name_idx = None;
    let mut alias_idx = None;
    for (i, col) in cols.iter().enumerate() {
        match col.to_ascii_lowercase().as_str() {
            "name" => name_idx = Some(i),
            "alias" => alias_idx = Some(i),
            _ => {}
        }
    }
    name_idx.zip(alias_idx)
}

/// Parses the whitespace-separated `port_config.ini` format.
pub fn parse_tabular(bytes: &[u8]) -> NameAliasMap {
    let text = String::from_utf8_lossy(bytes);
    let mut map = NameAliasMap::new();
    let mut layout: Option<(usize, usize)> = None;

    for cols in data_lines(&text) {
        let (name_idx, alias_idx) = match layout {
            Some(l) => l,
            None => {
                if cols.len() < MIN_HEADER_COLUMNS {
                    continue;
                }
                if let Some(l) = header_columns(&cols) {
                    layout = Some(l);
                    continue;
                }
                let legacy = (LEGACY_NAME_COLUMN, LEGACY_ALIAS_COLUMN);
                layout = Some(legacy);
                legacy
            }
        };
        if let (Some(name), Some(alias)) = (cols.get(name_idx), cols.get(alias_idx)) {
            map.insert(*name, *alias);
        }
    }

    if layout.is_none() {
        debug!("port_config table has no usable rows");
    }
    map
}

/// Parses the JSON `port_config.json` format; only `PORT.*.alias` is used.
pub fn parse_structured(bytes: &[u8]) -> NameAliasMap {
    let mut map = NameAliasMap::new();
    let parsed: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "port_config json not parseable");
            return map;
        }
    };
    let Some(ports) = parsed.get(CFG_PORT_TABLE_NAME).and_then(Value::as_object) else {
        return map;
    };
    for (name, attrs) in ports {
        if let Some(alias) = attrs.get(fields::ALIAS).and_then(TolerantValue::as_string) {
            map.insert(name.as_str(), alias);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabular_with_header() {
        let ini = "name       lanes    alias\n\
                   Ethernet0  1        etp0\n\
                   Ethernet-IB0 5      Inband0\n";
        let map = parse_tabular(ini.as_bytes());
        assert_eq!(map.len(), 2);
        assert_eq!(map.alias_of("Ethernet0"), Some("etp0"));
        assert_eq!(map.name_of("Inband0"), Some("Ethernet-IB0"));
    }

    #[test]
    fn test_tabular_reordered_header_matches_legacy() {
        let headed = "# generated\nindex alias lanes NAME\n0 etp0 1 Ethernet0\n1 etp1 2 Ethernet4\n";
        let legacy = "Ethernet0 1 etp0 0\nEthernet4 2 etp1 1\n";
        assert_eq!(parse_tabular(headed.as_bytes()), parse_tabular(legacy.as_bytes()));
    }

    #[test]
    fn test_tabular_legacy_first_row_is_data() {
        let map = parse_tabular(b"Ethernet2 9 etp2\n");
        assert_eq!(map.alias_of("Ethernet2"), Some("etp2"));
    }

    #[test]
    fn test_tabular_comment_header_falls_back_to_legacy() {
        let ini = "# name lanes alias index\nEthernet0 0,1 etp0 0\n\n# trailing\nEthernet4 2,3 etp1 1\n";
        let map = parse_tabular(ini.as_bytes());
        assert_eq!(map.alias_of("Ethernet0"), Some("etp0"));
        assert_eq!(map.alias_of("Ethernet4"), Some("etp1"));
    }

    #[test]
    fn test_tabular_layout_fixed_after_first_row() {
        // A later row that looks like a header is just a short/odd data row.
        let ini = "Ethernet0 1 etp0\nalias lanes name\n";
        let map = parse_tabular(ini.as_bytes());
        assert_eq!(map.alias_of("Ethernet0"), Some("etp0"));
        assert_eq!(map.alias_of("alias"), Some("name"));
    }

    #[test]
    fn test_tabular_short_rows_skipped() {
        let ini = "name alias lanes\nEthernet0\nEthernet4 etp1 3\n";
        let map = parse_tabular(ini.as_bytes());
        assert_eq!(map.len(), 1);
        assert_eq!(map.alias_of("Ethernet4"), Some("etp1"));
    }

    #[test]
    fn test_tabular_garbage_is_empty() {
        assert!(parse_tabular(b"").is_empty());
        assert!(parse_tabular(b"# only comments\n\n").is_empty());
        assert!(parse_tabular(&[0xff, 0xfe, 0x00]).is_empty());
    }

    #[test]
    fn test_structured() {
        let json = r#"{"PORT": {"Ethernet0": {"alias": "etp0", "lanes": "1"},
                                "Ethernet4": {"lanes": "2"},
                                "Ethernet-IB0": {"alias": "Inband0"}}}"#;
        let map = parse_structured(json.as_bytes());
        assert_eq!(map.len(), 2);
        assert_eq!(map.alias_of("Ethernet0"), Some("etp0"));
        assert!(!map.contains_name("Ethernet4"));
    }

    #[test]
    fn test_structured_malformed_is_empty() {
        assert!(parse_structured(b"{not json").is_empty());
        assert!(parse_structured(br#"{"VLAN": {}}"#).is_empty());
        assert!(parse_structured(br#"{"PORT": []}"#).is_empty());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(PortConfigFormat::from_path("/x/port_config.JSON"), PortConfigFormat::Structured);
        assert_eq!(PortConfigFormat::from_path("/x/port_config.ini"), PortConfigFormat::Tabular);
    }

    #[test]
    fn test_merge_later_source_wins() {
        let mut low = NameAliasMap::new();
        low.insert("Ethernet0", "etp0");
        low.insert("Ethernet4", "etp1");
        let mut high = NameAliasMap::new();
        high.insert("Ethernet0", "fp0");

        let merged = NameAliasMap::merged([low, high]);
        assert_eq!(merged.alias_of("Ethernet0"), Some("fp0"));
        assert_eq!(merged.alias_of("Ethernet4"), Some("etp1"));
        assert_eq!(merged.name_of("fp0"), Some("Ethernet0"));
    }

    #[test]
    fn test_alias_collision_keeps_both_names() {
        let mut ini = NameAliasMap::new();
        ini.insert("Ethernet0", "etp0");
        let mut json = NameAliasMap::new();
        json.insert("Ethernet-IB0", "etp0");

        let merged = NameAliasMap::merged([ini, json]);
        assert_eq!(merged.alias_of("Ethernet0"), Some("etp0"));
        assert_eq!(merged.alias_of("Ethernet-IB0"), Some("etp0"));
        assert_eq!(merged.name_of("etp0"), Some("Ethernet-IB0"));
    }
}
