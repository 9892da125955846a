use std::fmt::Write;
use std::time::Duration;

use super::{GRAPH_ORDER, UNKNOWN};
use crate::http_probe::prelude::*;

/// Renders a finished batch as munin multigraph data: one section per target
/// then one summary section with the totals. Targets are sorted by name, so
/// the output only depends on the batch content.
pub fn format_multigraph(batch: &[PhaseTimer], graph_name: &str) -> String {
    let mut snapshots: Vec<TimingSnapshot> = batch.iter().map(PhaseTimer::snapshot).collect();
    format_snapshots(&mut snapshots, graph_name)
}

pub fn format_snapshots(snapshots: &mut [TimingSnapshot], graph_name: &str) -> String {
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));

    let mut buf = String::new();
    for snapshot in snapshots.iter() {
        format_timings(&mut buf, snapshot, graph_name);
    }

    let _ = writeln!(buf, "multigraph {graph_name}");
    for snapshot in snapshots.iter() {
        let _ = writeln!(
            buf,
            "{}_total.value {}",
            snapshot.name,
            value(snapshot, snapshot.durations.total)
        );
    }
    buf.push('\n');

    buf
}

// Field order must match GRAPH_ORDER, which the config output declares.
fn format_timings(buf: &mut String, snapshot: &TimingSnapshot, graph_name: &str) {
    let _ = writeln!(buf, "multigraph {graph_name}.{}", snapshot.name);

    let d = &snapshot.durations;
    let phases = [d.resolving, d.connecting, d.sending, d.waiting, d.receiving];
    for (field, duration) in GRAPH_ORDER.iter().zip(phases) {
        let _ = writeln!(buf, "{field}.value {}", value(snapshot, duration));
    }

    buf.push('\n');
}

fn value(snapshot: &TimingSnapshot, duration: Duration) -> String {
    if snapshot.is_ok() {
        to_millisecond(duration).to_string()
    } else {
        UNKNOWN.to_string()
    }
}

/// Truncates, never rounds.
pub fn to_millisecond(duration: Duration) -> u128 {
    duration.as_millis()
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::http_probe::timer::PhaseDurations;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn ok(name: &str, base: u64) -> TimingSnapshot {
        TimingSnapshot {
            name: name.to_string(),
            uri: format!("https://{name}.example.com/"),
            durations: PhaseDurations {
                resolving: ms(base),
                connecting: ms(base + 1),
                sending: ms(base + 2),
                waiting: ms(base + 3),
                receiving: ms(base + 4),
                total: ms(5 * base + 10),
            },
            status_code: 200,
            error: None,
            body_size: 42,
        }
    }

    fn failed(name: &str) -> TimingSnapshot {
        TimingSnapshot {
            name: name.to_string(),
            uri: format!("https://{name}.example.com/"),
            error: Some("unable to connect".to_string()),
            ..TimingSnapshot::default()
        }
    }

    #[test]
    fn test_to_millisecond_truncates() {
        assert_eq!(to_millisecond(Duration::from_micros(1999)), 1);
        assert_eq!(to_millisecond(Duration::from_micros(999)), 0);
        assert_eq!(to_millisecond(Duration::from_secs(2)), 2000);
    }

    #[test]
    fn test_format_multigraph() {
        let mut snapshots = vec![ok("zeta", 10), failed("down"), ok("alpha", 1)];
        let out = format_snapshots(&mut snapshots, "timing");

        let expected = "\
multigraph timing.alpha
resolving.value 1
connecting.value 2
sending.value 3
waiting.value 4
receiving.value 5

multigraph timing.down
resolving.value U
connecting.value U
sending.value U
waiting.value U
receiving.value U

multigraph timing.zeta
resolving.value 10
connecting.value 11
sending.value 12
waiting.value 13
receiving.value 14

multigraph timing
alpha_total.value 15
down_total.value U
zeta_total.value 60

";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_http_errors_are_unknown() {
        let mut not_found = ok("missing", 3);
        not_found.status_code = 404;
        let mut redirect = ok("moved", 3);
        redirect.status_code = 301;

        let out = format_snapshots(&mut [not_found, redirect], "timing_web");
        assert!(out.starts_with("multigraph timing_web.missing\nresolving.value U\n"));
        assert!(out.contains("multigraph timing_web.moved\nresolving.value 3\n"));
        assert!(out.contains("missing_total.value U\n"));
        assert!(out.contains("moved_total.value 25\n"));
    }

    #[test]
    fn test_failed_target_has_no_numeric_line() {
        let mut snapshots = vec![failed("only")];
        let out = format_snapshots(&mut snapshots, "timing");

        let values: Vec<&str> = out.lines().filter(|line| line.contains(".value ")).collect();
        assert_eq!(values.len(), 6);
        assert!(values.iter().all(|line| line.ends_with(" U")));
    }

    #[test]
    fn test_output_independent_of_arrival_order() {
        let first = format_snapshots(&mut [ok("b", 1), failed("c"), ok("a", 2)], "timing");
        let second = format_snapshots(&mut [failed("c"), ok("a", 2), ok("b", 1)], "timing");
        let third = format_snapshots(&mut [ok("a", 2), ok("b", 1), failed("c")], "timing");
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_sorting_is_bytewise() {
        let out = format_snapshots(&mut [ok("b", 1), ok("B", 1), ok("a_2", 1), ok("a", 1)], "timing");
        let order: Vec<&str> = out
            .lines()
            .filter_map(|line| line.strip_prefix("multigraph timing."))
            .collect();
        assert_eq!(order, vec!["B", "a", "a_2", "b"]);
    }

    #[test]
    fn test_format_multigraph_from_timers() {
        let timer = PhaseTimer::new();
        timer.start("live", "http://live/");
        timer.finish(200);

        let out = format_multigraph(&[timer], "timing");
        assert!(out.starts_with("multigraph timing.live\n"));
        assert!(out.contains("\nmultigraph timing\nlive_total.value "));
        assert!(!out.contains(" U\n"));
    }
}
