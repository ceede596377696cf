//! `/proc/net/dev` parser.

use super::{component, error_sample, parse_counter};
use crate::model::{families, MetricFamily, MetricSample};
use crate::probe::ProbeResult;

/// Number of counter columns in a well-formed line.
const COUNTER_COLUMNS: usize = 16;

/// Column index and family for every exported counter.
const COLUMNS: [(usize, MetricFamily); 8] = [
    (0, families::IFACE_RX_BYTES),
    (8, families::IFACE_TX_BYTES),
    (1, families::IFACE_RX_PACKETS),
    (9, families::IFACE_TX_PACKETS),
    (2, families::IFACE_RX_ERRORS),
    (10, families::IFACE_TX_ERRORS),
    (3, families::IFACE_RX_DROPS),
    (11, families::IFACE_TX_DROPS),
];

/// Returns true if `name` starts with one of the allowed prefixes.
pub fn is_allowed(name: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| name.starts_with(p.as_str()))
}

/// Parses one interface line into its name and counters.
fn parse_line(line: &str) -> Option<(&str, Vec<f64>)> {
    let mut columns = line.split(':');
    let (Some(name), Some(stats), None) = (columns.next(), columns.next(), columns.next()) else {
        return None;
    };

    let counters: Vec<f64> = stats
        .split_whitespace()
        .map(parse_counter)
        .collect::<Option<_>>()?;
    if counters.len() < COUNTER_COLUMNS {
        return None;
    }
    Some((name.trim(), counters))
}

/// Converts the interface table into samples for allowed interfaces.
pub fn parse(result: &ProbeResult, prefixes: &[String]) -> Vec<MetricSample> {
    let Some(output) = result.output() else {
        return error_sample(component::NETWORK, result).into_iter().collect();
    };

    let mut samples = Vec::new();
    // The first two lines are column headers.
    for line in output.lines().skip(2) {
        let Some((name, counters)) = parse_line(line) else {
            if !line.trim().is_empty() {
                tracing::debug!(line, "Skipping malformed interface line");
            }
            continue;
        };
        if !is_allowed(name, prefixes) {
            continue;
        }
        for (column, family) in COLUMNS {
            samples.push(family.sample([("interface", name)], counters[column]));
        }
    }
    samples
}
