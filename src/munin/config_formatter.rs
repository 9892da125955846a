use std::fmt::Write;

use super::GRAPH_ORDER;
use crate::config::model::Targets;

/// Renders the graph definitions: the summary graph with one total series
/// per target, then one stacked phase graph per target.
pub fn format_config(targets: &Targets, graph_name: &str) -> String {
    let mut buf = String::new();

    format_main_graph(&mut buf, targets, graph_name);
    for (name, uri) in targets {
        format_uri_graph(&mut buf, name, uri, graph_name);
    }

    buf
}

// One serie per URI showing total time on the main graph
fn format_main_graph(buf: &mut String, targets: &Targets, graph_name: &str) {
    let _ = writeln!(buf, "multigraph {graph_name}");
    buf.push_str("graph_title Total time\n");
    buf.push_str("graph_category network\n");
    buf.push_str("graph_args --base 1000 -l 0\n");
    buf.push_str("graph_scale no\n");
    buf.push_str("graph_info This graph shows the duration of the different parts of an HTTP request in milliseconds.\n");
    buf.push_str("graph_vlabel Time (ms)\n");
    let _ = writeln!(buf, "graph_order {}", GRAPH_ORDER.join(" "));

    for (name, uri) in targets {
        let _ = writeln!(buf, "{name}_total.label {uri}");
    }

    buf.push('\n');
}

// One serie per timing category per URI
fn format_uri_graph(buf: &mut String, name: &str, uri: &str, graph_name: &str) {
    let _ = writeln!(buf, "multigraph {graph_name}.{name}");
    let _ = writeln!(buf, "graph_title Timings for {uri}");
    buf.push_str("graph_vlabel Time (ms)\n");

    for (i, field) in GRAPH_ORDER.iter().enumerate() {
        let _ = writeln!(buf, "{field}.label {}", label(field));
        let draw = if i == 0 { "AREA" } else { "STACK" };
        let _ = writeln!(buf, "{field}.draw {draw}");
        let _ = writeln!(buf, "{field}.info {}", info(field));
    }

    buf.push('\n');
}

fn label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn info(field: &str) -> &'static str {
    match field {
        "resolving" => "Time spent resolving the domain name.",
        "connecting" => "Time spent initiating the TCP connection.",
        "sending" => "Time spent sending the HTTP request.",
        "waiting" => "Time spent waiting for the first byte of the HTTP response.",
        "receiving" => "Time spent receiving the response body.",
        _ => "",
    }
}
