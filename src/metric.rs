//! the table of raw statistics we care about in a simulator report
//!
//! every raw name is mapped to a canonical name, the canonical names are the
//! keys used by [`crate::report::StatReport`] and by the csv output.

use std::collections::HashMap;

use enum_as_inner::EnumAsInner;
use once_cell::sync::Lazy;
use serde::Serialize;

/// the namespace of the statistics produced by the memory simulator itself,
/// everything else goes to the system stats
pub const SIMULATOR_NAMESPACE: &str = "ramulator";

/// how a raw statistic should be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumAsInner)]
pub enum RawMetric {
    /// a single value, `name value`
    Scalar(&'static str),
    /// a family of values, `prefix<i>_<j>_... value`
    Indexed(&'static str),
}

impl RawMetric {
    pub fn canonical(&self) -> &'static str {
        match *self {
            RawMetric::Scalar(name) | RawMetric::Indexed(name) => name,
        }
    }
}

/// a derived metric value, per-core metrics like `ipc` are sequences
#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl MetricValue {
    /// the value used in a csv cell, sequences are summed
    pub fn total(&self) -> f64 {
        match self {
            MetricValue::Scalar(v) => *v,
            MetricValue::Sequence(values) => values.iter().sum(),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Scalar(v)
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(v: Vec<f64>) -> Self {
        MetricValue::Sequence(v)
    }
}

const SCALAR_METRICS: &[(&str, &str)] = &[
    ("ramulator.incoming_requests_per_channel", "incoming_requests"),
    ("ramulator.read_requests", "read_requests"),
    ("ramulator.write_requests", "write_requests"),
    ("ramulator.maximum_bandwidth", "maximum_bandwidth"),
    (
        "ramulator.maximum_internal_bandwidth",
        "maximum_internal_bandwidth",
    ),
    ("ramulator.maximum_link_bandwidth", "maximum_link_bandwidth"),
    ("ramulator.read_bandwidth", "read_bandwidth"),
    ("ramulator.write_bandwidth", "write_bandwidth"),
    ("ramulator.row_hits", "row_hits"),
    ("ramulator.row_misses", "row_misses"),
    ("ramulator.row_conflicts", "row_conflicts"),
    ("ramulator.read_row_hits", "read_row_hits"),
    ("ramulator.read_row_misses", "read_row_misses"),
    ("ramulator.read_row_conflicts", "read_row_conflicts"),
    ("ramulator.write_row_hits", "write_row_hits"),
    ("ramulator.write_row_misses", "write_row_misses"),
    ("ramulator.write_row_conflicts", "write_row_conflicts"),
    ("ramulator.read_latency_avg", "read_latency_avg"),
    ("ramulator.queueing_latency_avg", "queueing_latency_avg"),
    (
        "ramulator.request_packet_latency_avg",
        "request_packet_latency_avg",
    ),
    (
        "ramulator.response_packet_latency_avg",
        "response_packet_latency_avg",
    ),
    ("ramulator.read_latency_ns_avg", "read_latency_ns_avg"),
    ("ramulator.queueing_latency_ns_avg", "queueing_latency_ns_avg"),
    (
        "ramulator.request_packet_latency_ns_avg",
        "request_packet_latency_ns_avg",
    ),
    (
        "ramulator.response_packet_latency_ns_avg",
        "response_packet_latency_ns_avg",
    ),
    ("ramulator.ramulator_active_cycles", "DRAM_active_cycles"),
    // full-system statistics, kept apart from the memory stats
    ("sim_insts", "sim_insts"),
    ("system.mem_ctrls.bw_total::total", "memory_bandwidth"),
    ("system.mem_ctrls.bw_read::total", "read_bandwidth"),
    ("system.mem_ctrls.bw_write::total", "write_bandwidth"),
    ("system.cpu.ipc", "ipc"),
    ("system.cpu.cpi", "cpi"),
];

/// prefixes of per-core/per-bank statistics, the rest of the raw name is the index
pub const INDEXED_METRICS: &[(&str, &str)] = &[
    ("ramulator.record_cycs_core_", "cpu_cycles"),
    ("ramulator.record_insts_core_", "cpu_insts"),
    ("ramulator.serving_requests_", "total_serving_requests"),
    ("ramulator.active_cycles_", "total_active_cycles"),
];

static METRIC_TABLE: Lazy<HashMap<&'static str, RawMetric>> = Lazy::new(|| {
    SCALAR_METRICS
        .iter()
        .map(|&(raw, name)| (raw, RawMetric::Scalar(name)))
        .chain(
            INDEXED_METRICS
                .iter()
                .map(|&(raw, name)| (raw, RawMetric::Indexed(name))),
        )
        .collect()
});

/// look up a raw name that must match exactly
pub fn lookup(raw_name: &str) -> Option<RawMetric> {
    METRIC_TABLE.get(raw_name).copied()
}

/// match a raw name against the indexed prefixes,
/// return the canonical name and the unparsed index suffix
pub fn match_indexed(raw_name: &str) -> Option<(&'static str, &str)> {
    INDEXED_METRICS.iter().find_map(|&(prefix, name)| {
        raw_name
            .strip_prefix(prefix)
            .map(|suffix| (name, suffix))
    })
}

/// whether the raw name belongs to the memory simulator
pub fn in_simulator_namespace(raw_name: &str) -> bool {
    raw_name.split('.').next() == Some(SIMULATOR_NAMESPACE)
}
