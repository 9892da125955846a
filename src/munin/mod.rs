//! Munin multigraph protocol: `config` and data output.
//!
//! See <https://guide.munin-monitoring.org/en/latest/plugin/multigraphing.html>.

pub mod config_formatter;
pub mod ping_formatter;

use crate::config::model::Config;
use crate::error::Error;
use crate::scheduler;

pub use config_formatter::format_config;
pub use ping_formatter::format_multigraph;

/// Per-target fields, in graph order. Data lines are emitted in this order too.
pub const GRAPH_ORDER: [&str; 5] = ["resolving", "connecting", "sending", "waiting", "receiving"];

/// Emitted instead of a value when a probe did not succeed.
pub const UNKNOWN: &str = "U";

/// Probes every target and renders the data output.
pub async fn do_ping(config: &Config) -> Result<String, Error> {
    let queue = scheduler::run_all(&config.targets, &config.options)?;
    let batch = queue.drain().await;
    Ok(format_multigraph(&batch, &config.graph_name()))
}

/// Renders the graph definitions.
pub fn do_config(config: &Config) -> Result<String, Error> {
    if config.targets.is_empty() {
        return Err(Error::NoTargets);
    }
    Ok(format_config(&config.targets, &config.graph_name()))
}
