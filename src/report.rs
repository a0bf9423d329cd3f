//! parse a simulator statistics report and derive the second level metrics
//!
//! a report has one statistic per line: `<dotted.name> <value> [# comment]`.
//! unknown statistics are ignored, and every derived metric is best-effort:
//! when one of its inputs is missing the derived metric is simply absent.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::metric::{self, MetricValue, RawMetric};

/// `(index, value)` pairs in file order, e.g. `([channel, rank, bank], serving_requests)`
pub type IndexedEntries = Vec<(Vec<usize>, f64)>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatReport {
    /// memory simulator statistics
    pub scalar_stats: BTreeMap<String, f64>,
    /// statistics outside the simulator namespace, not used for derivation
    pub system_stats: BTreeMap<String, f64>,
    /// canonical name => dimension (index length - 1) => entries
    pub indexed_stats: BTreeMap<String, BTreeMap<usize, IndexedEntries>>,
    pub derived_stats: BTreeMap<String, MetricValue>,
    /// single-threaded reports of each core's program, used for weighted speedup
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ref_reports: Vec<StatReport>,
}

impl StatReport {
    /// load a report without reference reports,
    /// a missing file gives an empty report
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::load_inner::<&Path>(path.as_ref(), None)
    }

    /// load a report and the single-threaded reports of each of its cores
    pub fn load_with_references<P: AsRef<Path>>(path: impl AsRef<Path>, ref_paths: &[P]) -> Self {
        Self::load_inner(path.as_ref(), Some(ref_paths))
    }

    fn load_inner<P: AsRef<Path>>(path: &Path, ref_paths: Option<&[P]>) -> Self {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(?path, "cannot open stats file, use empty stats: {}", e);
                return Self::default();
            }
        };
        let references = ref_paths.map(|paths| {
            paths
                .iter()
                .map(|ref_path| ref_path.as_ref())
                .filter_map(|ref_path: &Path| match File::open(ref_path) {
                    Ok(ref_file) => Some(Self::parse(BufReader::new(ref_file), None)),
                    Err(e) => {
                        warn!(
                            ?ref_path,
                            "skip reference stats file, the reference count will not match the core count: {}",
                            e
                        );
                        None
                    }
                })
                .collect()
        });
        debug!(?path, "parsing stats");
        Self::parse(BufReader::new(file), references)
    }

    /// parse a whole report, then derive the second level metrics.
    ///
    /// `references` are the single-threaded reports of the programs running on each core,
    /// weighted speedup is only derived when they are given.
    ///
    /// # Panics
    /// when the references are given for a multi-core report
    /// but their number differs from the number of cores
    pub fn parse<R: BufRead>(reader: R, references: Option<Vec<StatReport>>) -> Self {
        let mut report = Self::default();
        for line in reader.lines() {
            match line {
                Ok(line) => report.parse_line(&line),
                Err(e) => {
                    warn!("stop reading stats: {}", e);
                    break;
                }
            }
        }
        if report.scalar_stats.is_empty() && report.indexed_stats.is_empty() {
            report.ref_reports = references.unwrap_or_default();
            return report;
        }
        report.derive(references.as_deref());
        report.ref_reports = references.unwrap_or_default();
        report
    }

    /// parse a report held in memory
    pub fn from_text(text: &str) -> Self {
        Self::parse(text.as_bytes(), None)
    }

    fn parse_line(&mut self, line: &str) {
        let mut tokens = line.split_whitespace();
        let (name, value) = match (tokens.next(), tokens.next()) {
            (Some(name), Some(value)) => (name, value),
            _ => return,
        };
        // comments and distributions are not statistics
        if name.starts_with('#') || name.contains('-') {
            return;
        }
        let value: f64 = match value.parse() {
            Ok(value) => value,
            Err(_) => {
                debug!(name, value, "ignore unparsable stat value");
                return;
            }
        };

        match metric::lookup(name) {
            Some(RawMetric::Scalar(canonical)) => {
                let stats = if metric::in_simulator_namespace(name) {
                    &mut self.scalar_stats
                } else {
                    &mut self.system_stats
                };
                stats.insert(canonical.to_string(), value);
            }
            _ => {
                if let Some((canonical, suffix)) = metric::match_indexed(name) {
                    self.push_indexed(canonical, suffix, value);
                }
            }
        }
    }

    fn push_indexed(&mut self, canonical: &str, suffix: &str, value: f64) {
        let index: Result<Vec<usize>, _> = suffix.split('_').map(str::parse::<usize>).collect();
        let index = match index {
            Ok(index) if !index.is_empty() => index,
            _ => {
                debug!(canonical, suffix, "ignore stat with malformed index");
                return;
            }
        };
        self.indexed_stats
            .entry(canonical.to_string())
            .or_default()
            .entry(index.len() - 1)
            .or_default()
            .push((index, value));
    }

    fn derive(&mut self, references: Option<&[StatReport]>) {
        if let Some(max_cycles) = self.max_cpu_cycles() {
            self.insert_derived("max_cpu_cycles", max_cycles);
        }
        if let Some(ipc) = self.per_core_ipc() {
            self.insert_derived("ipc", ipc);
        }
        if let Some(references) = references {
            if let Some(speedup) = self.weighted_speedup(references) {
                self.insert_derived("weighted_speedup", speedup);
            }
        }

        for (count, rate) in [
            ("row_hits", "row_hit_rate"),
            ("row_misses", "row_miss_rate"),
            ("row_conflicts", "row_conflict_rate"),
        ] {
            if let Some(v) = ratio(self.stat(count), self.stat("incoming_requests")) {
                self.insert_derived(rate, v);
            }
        }

        self.derive_blp();
        self.derive_dram_latency("");
        self.derive_dram_latency("_ns");
        self.derive_bandwidth();

        let core0_insts = self
            .indexed("cpu_insts", 0)
            .and_then(|entries| entries.first())
            .map(|(_, insts)| *insts);
        if let Some(mpki) = ratio(self.stat("incoming_requests").map(|r| r * 1000.), core0_insts) {
            self.insert_derived("MPKI", mpki);
        }
    }

    fn max_cpu_cycles(&self) -> Option<f64> {
        self.indexed("cpu_cycles", 0)?
            .iter()
            .map(|(_, cycles)| *cycles)
            .reduce(f64::max)
    }

    fn per_core_ipc(&self) -> Option<Vec<f64>> {
        let insts = self.indexed("cpu_insts", 0)?;
        let cycles = self.indexed("cpu_cycles", 0)?;
        if insts.len() != cycles.len() {
            warn!(
                insts = insts.len(),
                cycles = cycles.len(),
                "per-core instruction and cycle counts differ, skip ipc"
            );
            return None;
        }
        let ipc: Option<Vec<f64>> = insts
            .iter()
            .zip(cycles)
            .map(|((_, i), (_, c))| ratio(Some(*i), Some(*c)))
            .collect();
        if ipc.is_none() {
            warn!("a core has zero cycles, skip ipc");
        }
        ipc
    }

    fn weighted_speedup(&self, references: &[StatReport]) -> Option<f64> {
        let ipc = self.ipc()?;
        if ipc.len() <= 1 {
            return None;
        }
        let ref_ipcs: Option<Vec<f64>> = references
            .iter()
            .map(|r| r.ipc().and_then(|ipc| ipc.first().copied()))
            .collect();
        let ref_ipcs = match ref_ipcs {
            Some(ref_ipcs) => ref_ipcs,
            None => {
                warn!("a reference report has no ipc, skip weighted_speedup");
                return None;
            }
        };
        assert_eq!(
            ref_ipcs.len(),
            ipc.len(),
            "the number of reference reports must equal the number of cores"
        );
        let speedup: Option<f64> = ipc
            .iter()
            .zip(&ref_ipcs)
            .map(|(ipc, r)| ratio(Some(*ipc), Some(*r)))
            .sum();
        if speedup.is_none() {
            warn!("a reference report has zero ipc, skip weighted_speedup");
        }
        speedup
    }

    /// bank level parallelism: outstanding requests per bank per cycle
    fn derive_blp(&mut self) {
        let banks = self
            .indexed_stats
            .get("total_serving_requests")
            .and_then(|dims| dims.iter().next_back())
            .map(|(_, entries)| entries);
        let banks = match banks {
            Some(banks) if !banks.is_empty() => banks,
            _ => {
                debug!("ignore missing stat total_serving_requests");
                return;
            }
        };
        let bank_num = banks.len() as f64;
        let serving: f64 = banks.iter().map(|(_, v)| v).sum();

        let max_cycles = self.scalar_value("max_cpu_cycles");
        if let Some(blp) = ratio(Some(serving), max_cycles.map(|c| c * bank_num)) {
            self.insert_derived("BLP", blp);
        }
        match self.scalar_stats.get("DRAM_active_cycles").copied() {
            Some(active) => {
                if let Some(blp) = ratio(Some(serving), Some(active)) {
                    self.insert_derived("effective_BLP", blp);
                }
            }
            None => warn!("stat DRAM_active_cycles doesn't exist, skip effective_BLP"),
        }
    }

    /// DRAM latency = read latency - queueing - request packet - response packet,
    /// `unit` is `""` for cycles or `"_ns"` for nanoseconds
    fn derive_dram_latency(&mut self, unit: &str) {
        let read = self.stat(&format!("read_latency{unit}_avg"));
        let queueing = self.stat(&format!("queueing_latency{unit}_avg"));
        let (read, queueing) = match (read, queueing) {
            (Some(read), Some(queueing)) => (read, queueing),
            _ => return,
        };
        let mut latency = read - queueing;
        for packet in ["request", "response"] {
            let name = format!("{packet}_packet_latency{unit}_avg");
            match self.scalar_stats.get(&name) {
                Some(v) => latency -= *v,
                // older reports have no packet latency
                None => self.insert_derived(&name, 0.),
            }
        }
        self.insert_derived(&format!("DRAM_latency{unit}_avg"), latency);
    }

    fn derive_bandwidth(&mut self) {
        let bandwidth = match (self.stat("write_bandwidth"), self.stat("read_bandwidth")) {
            (Some(w), Some(r)) => w + r,
            _ => return,
        };
        self.insert_derived("bandwidth", bandwidth);
        let maximum = self
            .scalar_stats
            .get("maximum_internal_bandwidth")
            .or_else(|| self.scalar_stats.get("maximum_bandwidth"))
            .copied();
        if let Some(utilization) = ratio(Some(bandwidth), maximum) {
            self.insert_derived("bandwidth_utilization", utilization);
        }
    }

    /// a raw simulator statistic, logs when it is missing
    fn stat(&self, name: &str) -> Option<f64> {
        let v = self.scalar_stats.get(name).copied();
        if v.is_none() {
            debug!(stat = name, "ignore missing stat");
        }
        v
    }

    pub fn indexed(&self, name: &str, dim: usize) -> Option<&IndexedEntries> {
        self.indexed_stats.get(name)?.get(&dim)
    }

    pub fn insert_derived(&mut self, name: &str, value: impl Into<MetricValue>) {
        self.derived_stats.insert(name.to_string(), value.into());
    }

    /// look up a metric, derived metrics first, then raw simulator statistics
    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.derived_stats
            .get(name)
            .cloned()
            .or_else(|| self.scalar_stats.get(name).map(|v| MetricValue::Scalar(*v)))
    }

    /// look up a metric that must be a scalar
    pub fn scalar_value(&self, name: &str) -> Option<f64> {
        match self.derived_stats.get(name) {
            Some(MetricValue::Scalar(v)) => Some(*v),
            Some(MetricValue::Sequence(_)) => None,
            None => self.scalar_stats.get(name).copied(),
        }
    }

    pub fn ipc(&self) -> Option<&[f64]> {
        self.derived_stats
            .get("ipc")
            .and_then(MetricValue::as_sequence)
            .map(Vec::as_slice)
    }

    pub fn mpki(&self) -> Option<f64> {
        self.scalar_value("MPKI")
    }

    pub fn is_empty(&self) -> bool {
        self.scalar_stats.is_empty()
            && self.system_stats.is_empty()
            && self.indexed_stats.is_empty()
            && self.derived_stats.is_empty()
    }
}

/// `num / den`, absent when either is missing or the denominator is zero
fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    match (num, den) {
        (Some(num), Some(den)) if den != 0. => Some(num / den),
        (Some(_), Some(_)) => {
            warn!("zero denominator, skip derived stat");
            None
        }
        _ => None,
    }
}
