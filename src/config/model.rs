use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Timeout of a single probe unless `HTTP_TIMEOUT` says otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Graph name used when the plugin is not installed under a suffixed name.
pub const BASE_GRAPH_NAME: &str = "timing";

/// Logical target name to URI. Sorted so every output is deterministic.
pub type Targets = BTreeMap<String, String>;

/// How each probe is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOptions {
    /// Sent as the User-Agent header of every probe.
    pub user_agent: String,

    /// Upper bound on the duration of a whole probe, body included.
    pub timeout: Duration,

    /// Sleep a random [0, 2s) before each probe so repeated runs do not hit
    /// the same servers in lockstep.
    pub random_delay_enabled: bool,

    /// Nameservers to query instead of the system resolver.
    pub dns_hosts: Vec<IpAddr>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
            random_delay_enabled: false,
            dns_hosts: vec![],
        }
    }
}

pub fn default_user_agent() -> String {
    format!("http-timing/{}", env!("CARGO_PKG_VERSION"))
}

/// The whole plugin configuration, built once by [`super::app_config`] and
/// passed down explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub targets: Targets,
    pub options: ProbeOptions,

    /// Emit the data right after the config (munin dirtyconfig capability).
    pub config_and_ping: bool,

    /// Set when the plugin runs as a munin wildcard symlink (`http-timing_foo`).
    pub graph_suffix: Option<String>,
}

impl Config {
    /// `timing`, or `timing_<suffix>` for wildcard installs.
    pub fn graph_name(&self) -> String {
        match &self.graph_suffix {
            Some(suffix) => format!("{BASE_GRAPH_NAME}_{suffix}"),
            None => BASE_GRAPH_NAME.to_string(),
        }
    }

    /// Takes the suffix from the part of the executable name after its last
    /// underscore. A name without underscore, or ending with one, has none.
    pub fn set_suffix_from_arg0(&mut self, arg0: &str) {
        let base = Path::new(arg0)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        self.graph_suffix = base
            .rsplit_once('_')
            .map(|(_, suffix)| suffix)
            .filter(|suffix| !suffix.is_empty())
            .map(str::to_string);
    }
}

/// Content of the optional YAML file pointed to by `CONFIG_FILE`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TargetsFile {
    #[serde(default)]
    pub targets: Targets,
}
