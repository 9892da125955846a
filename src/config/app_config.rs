use std::env;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use url::Url;

use super::model::{Config, ProbeOptions, Targets, TargetsFile};
use crate::error::Error;

const TARGET_PREFIX: &str = "TARGET_";

/// Load the plugin configuration from the process environment.
/// Targets come from `TARGET_<NAME>` variables, optionally completed by the
/// YAML file named by `CONFIG_FILE`. Environment targets win on name clashes.
pub fn load_config() -> Result<Config, Error> {
    let vars = env::vars_os().filter_map(|(key, value)| {
        Some((key.into_string().ok()?, value.into_string().ok()?))
    });
    let mut config = config_from_vars(vars);

    if let Some(path) = env::var_os("CONFIG_FILE") {
        let file_targets = load_targets_file(Path::new(&path))?;
        for (name, uri) in file_targets {
            if !is_valid_uri(&uri) {
                log::warn!("Invalid URI for {name} in {}: {uri}", Path::new(&path).display());
                continue;
            }
            config.targets.entry(name).or_insert(uri);
        }
    }

    log::debug!("Loaded {} target(s)", config.targets.len());
    Ok(config)
}

/// Builds a [`Config`] from `(key, value)` pairs shaped like `env::vars()`.
pub fn config_from_vars<I>(vars: I) -> Config
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut config = Config::default();
    let mut options = ProbeOptions::default();

    for (key, value) in vars {
        match key.as_str() {
            "RANDOM_DELAY" => options.random_delay_enabled = value == "1",
            "USER_AGENT" if !value.is_empty() => options.user_agent = value,
            "HTTP_TIMEOUT" => options.timeout = parse_timeout(&value),
            "DNS_HOSTS" => options.dns_hosts = parse_dns_hosts(&value),
            // https://munin.readthedocs.io/en/latest/plugin/protocol-dirtyconfig.html
            "MUNIN_CAP_DIRTYCONFIG" => config.config_and_ping = value == "1",
            _ => {
                if let Some((name, uri)) = parse_target(&key, value) {
                    config.targets.insert(name, uri);
                }
            }
        }
    }

    config.options = options;
    config
}

/// `TARGET_EXAMPLE=https://example.com/` registers `example`.
fn parse_target(key: &str, uri: String) -> Option<(String, String)> {
    let name = key.strip_prefix(TARGET_PREFIX)?.to_lowercase();
    if name.is_empty() || uri.is_empty() {
        return None;
    }
    if !is_valid_uri(&uri) {
        log::warn!("Invalid URI: {key}={uri}");
        return None;
    }
    Some((name, uri))
}

fn is_valid_uri(uri: &str) -> bool {
    Url::parse(uri).map(|url| url.has_host()).unwrap_or(false)
}

fn parse_timeout(value: &str) -> Duration {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            log::warn!("Invalid HTTP_TIMEOUT {value:?}, using the default");
            ProbeOptions::default().timeout
        }
    }
}

fn parse_dns_hosts(value: &str) -> Vec<IpAddr> {
    value
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .filter_map(|host| match host.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                log::warn!("Ignoring invalid DNS host {host:?}");
                None
            }
        })
        .collect()
}

pub fn load_targets_file(path: &Path) -> Result<Targets, Error> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file: TargetsFile =
        serde_yaml::from_str(&content).map_err(|source| Error::ConfigFileParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.targets)
}
