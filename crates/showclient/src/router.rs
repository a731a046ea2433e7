//! Query router
//!
//! Maps a decoded show path plus its option bag onto one of the interface
//! flows and serializes the result to a JSON payload.

use crate::alias::get_interface_alias;
use crate::context::ShowContext;
use crate::counters::{CountersRequest, get_interface_counters};
use crate::error::{Result, ShowError};
use crate::fec::get_interface_fec_status;
use crate::port_errors::get_interface_errors;
use crate::switchport::{get_switchport_config, get_switchport_status};
use std::collections::BTreeMap;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const OPT_INTERFACE: &str = "interface";
pub const OPT_INTERFACES: &str = "interfaces";
pub const OPT_PERIOD: &str = "period";

/// Show commands served by this router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowPath {
    InterfaceAlias,
    InterfaceCounters,
    InterfaceErrors,
    InterfaceFecStatus,
    InterfaceSwitchportConfig,
    InterfaceSwitchportStatus,
}

impl ShowPath {
    pub fn all() -> [ShowPath; 6] {
        [
            ShowPath::InterfaceAlias,
            ShowPath::InterfaceCounters,
            ShowPath::InterfaceErrors,
            ShowPath::InterfaceFecStatus,
            ShowPath::InterfaceSwitchportConfig,
            ShowPath::InterfaceSwitchportStatus,
        ]
    }

    pub fn components(&self) -> &'static [&'static str] {
        match self {
            ShowPath::InterfaceAlias => &["interface", "alias"],
            ShowPath::InterfaceCounters => &["interface", "counters"],
            ShowPath::InterfaceErrors => &["interface", "errors"],
            ShowPath::InterfaceFecStatus => &["interface", "fec", "status"],
            ShowPath::InterfaceSwitchportConfig => &["interface", "switchport", "config"],
            ShowPath::InterfaceSwitchportStatus => &["interface", "switchport", "status"],
        }
    }

    /// Matches path components, ignoring empty segments and case.
    pub fn parse<S: AsRef<str>>(components: &[S]) -> Result<Self> {
        let wanted: Vec<String> = components
            .iter()
            .map(|c| c.as_ref().trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        Self::all()
            .into_iter()
            .find(|path| path.components().iter().eq(wanted.iter()))
            .ok_or_else(|| ShowError::UnknownPath(wanted.join("/")))
    }
}

impl fmt::Display for ShowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components().join(" "))
    }
}

/// Request options; a key may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    values: BTreeMap<String, Vec<String>>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Parses `key=value`; a bare `key` is stored with an empty value.
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = key.trim();
        if key.is_empty() {
            return Err(ShowError::invalid_option(pair, "missing option name"));
        }
        self.insert(key, value.trim());
        Ok(())
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::new();
        for pair in pairs {
            options.insert_pair(pair.as_ref())?;
        }
        Ok(options)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Single interface selector; empty values count as absent.
    pub fn interface(&self) -> Option<&str> {
        self.get(OPT_INTERFACE).filter(|v| !v.is_empty())
    }

    /// Interface list from comma-separated or repeated values.
    pub fn interfaces(&self) -> Vec<String> {
        self.values
            .get(OPT_INTERFACES)
            .into_iter()
            .flatten()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn period(&self) -> Result<Option<u64>> {
        match self.get(OPT_PERIOD) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
                ShowError::invalid_option(OPT_PERIOD, format!("expected seconds, got '{}'", raw))
            }),
        }
    }
}

/// Dispatches show requests against one context.
#[derive(Debug, Clone)]
pub struct ShowRouter {
    ctx: ShowContext,
}

impl ShowRouter {
    pub fn new(ctx: ShowContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ShowContext {
        &self.ctx
    }

    /// Handles a request with no external cancellation.
    pub async fn handle<S: AsRef<str>>(&self, path: &[S], options: &OptionMap) -> Result<Vec<u8>> {
        self.handle_with_cancel(path, options, &CancellationToken::new())
            .await
    }

    /// Handles a request, honoring `cancel` and the configured deadline.
    pub async fn handle_with_cancel<S: AsRef<str>>(
        &self,
        path: &[S],
        options: &OptionMap,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let path = ShowPath::parse(path)?;
        info!(path = %path, "show request");

        let token = cancel.child_token();
        let result = match self.ctx.config().query_timeout() {
            Some(limit) => {
                match tokio::time::timeout(limit, self.dispatch(path, options, &token)).await {
                    Ok(result) => result,
                    Err(_) => {
                        token.cancel();
                        warn!(path = %path, seconds = limit.as_secs(), "show request timed out");
                        Err(ShowError::Timeout(limit.as_secs()))
                    }
                }
            }
            None => self.dispatch(path, options, &token).await,
        };

        if let Err(e) = &result {
            warn!(path = %path, code = e.status_code(), error = %e, "show request failed");
        }
        result
    }

    async fn dispatch(
        &self,
        path: ShowPath,
        options: &OptionMap,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let ctx = &self.ctx;
        let payload = match path {
            ShowPath::InterfaceAlias => {
                serde_json::to_vec(&get_interface_alias(ctx, options.interface()).await?)?
            }
            ShowPath::InterfaceCounters => {
                let mut interfaces = options.interfaces();
                if let Some(single) = options.interface() {
                    interfaces.push(single.to_string());
                }
                let request = CountersRequest {
                    interfaces,
                    period: options.period()?,
                };
                serde_json::to_vec(&get_interface_counters(ctx, &request, cancel).await?)?
            }
            ShowPath::InterfaceErrors => {
                let interface = options.interface().ok_or_else(|| {
                    ShowError::invalid_option(OPT_INTERFACE, "no interface name passed in")
                })?;
                serde_json::to_vec(&get_interface_errors(ctx, interface).await?)?
            }
            ShowPath::InterfaceFecStatus => {
                serde_json::to_vec(&get_interface_fec_status(ctx, options.interface()).await?)?
            }
            ShowPath::InterfaceSwitchportConfig => {
                serde_json::to_vec(&get_switchport_config(ctx, options.interface()).await?)?
            }
            ShowPath::InterfaceSwitchportStatus => {
                serde_json::to_vec(&get_switchport_status(ctx, options.interface()).await?)?
            }
        };
        debug!(path = %path, bytes = payload.len(), "show response encoded");
        Ok(payload)
    }
}
