//! statistics of one workload over a list of DRAM configurations

use std::{cmp::Ordering, collections::BTreeMap, io::Write, path::PathBuf};

use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    error::{Result, StatsError},
    metric::MetricValue,
    report::StatReport,
};

/// where to find the reports of one workload
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// reports are at `<workload_dir>/<workload>/<configuration>.stats`
    pub workload_dir: PathBuf,
    pub workload: String,
    pub configurations: Vec<String>,
    /// the configuration every other one is normalized to
    pub reference: String,
    /// the single-threaded workload of each core, only for multi-program workloads
    pub single_threaded_workloads: Option<Vec<String>>,
}

impl WorkloadConfig {
    pub fn stats_path(&self, workload: &str, configuration: &str) -> PathBuf {
        self.workload_dir
            .join(workload)
            .join(format!("{configuration}.stats"))
    }
}

#[derive(Debug)]
pub struct WorkloadStats {
    pub workload: String,
    pub configurations: Vec<String>,
    pub reference: String,
    pub single_threaded_workloads: Option<Vec<String>>,
    pub reports: BTreeMap<String, StatReport>,
}

impl WorkloadStats {
    /// load the report of every configuration, missing reports are empty
    pub fn load(config: &WorkloadConfig) -> Result<Self> {
        if !config.configurations.contains(&config.reference) {
            return Err(StatsError::ReferenceNotInList {
                reference: config.reference.clone(),
                configurations: config.configurations.clone(),
            });
        }
        info!(
            workload = %config.workload,
            "{} as reference DRAM standard", config.reference
        );
        let ref_paths = config.single_threaded_workloads.as_ref().map(|programs| {
            programs
                .iter()
                .map(|program| config.stats_path(program, &config.reference))
                .collect_vec()
        });
        let reports = config
            .configurations
            .iter()
            .map(|configuration| {
                let path = config.stats_path(&config.workload, configuration);
                let report = match &ref_paths {
                    Some(ref_paths) => StatReport::load_with_references(&path, ref_paths),
                    None => StatReport::load(&path),
                };
                (configuration.clone(), report)
            })
            .collect();
        Ok(Self::from_reports(
            &config.workload,
            config.configurations.clone(),
            &config.reference,
            config.single_threaded_workloads.clone(),
            reports,
        ))
    }

    /// build from reports that are already parsed,
    /// the reference must be one of `configurations`
    pub fn from_reports(
        workload: &str,
        configurations: Vec<String>,
        reference: &str,
        single_threaded_workloads: Option<Vec<String>>,
        mut reports: BTreeMap<String, StatReport>,
    ) -> Self {
        for configuration in &configurations {
            reports.entry(configuration.clone()).or_default();
        }
        Self {
            workload: workload.to_string(),
            configurations,
            reference: reference.to_string(),
            single_threaded_workloads,
            reports,
        }
    }

    pub fn is_multi_program(&self) -> bool {
        self.single_threaded_workloads.is_some()
    }

    pub fn reference_report(&self) -> &StatReport {
        &self.reports[&self.reference]
    }

    fn unavailable(&self, configuration: &str, metric: &str) -> StatsError {
        StatsError::MetricUnavailable {
            workload: self.workload.clone(),
            configuration: configuration.to_string(),
            metric: metric.to_string(),
        }
    }

    /// add `normalized_<metric>` to every configuration,
    /// sequences are divided by the first value of the reference
    pub fn normalize(&mut self, metric: &str) -> Result<()> {
        let divisor = match self.reference_report().get(metric) {
            Some(MetricValue::Scalar(v)) => v,
            Some(MetricValue::Sequence(values)) if !values.is_empty() => values[0],
            _ => return Err(self.unavailable(&self.reference, metric)),
        };
        let normalized_name = format!("normalized_{metric}");
        for (configuration, report) in self.reports.iter_mut() {
            let normalized: MetricValue = match report.get(metric) {
                Some(MetricValue::Scalar(v)) => (v / divisor).into(),
                Some(MetricValue::Sequence(values)) => {
                    values.iter().map(|v| v / divisor).collect_vec().into()
                }
                None => {
                    warn!(
                        workload = %self.workload,
                        configuration = %configuration,
                        "cannot normalize missing {}", metric
                    );
                    continue;
                }
            };
            report.insert_derived(&normalized_name, normalized);
        }
        Ok(())
    }

    /// reference MPKI, summed over the single-threaded references for multi-program workloads
    pub fn reference_mpki(&self) -> Option<f64> {
        let reference = self.reference_report();
        if let Some(programs) = &self.single_threaded_workloads {
            if reference.ref_reports.is_empty() || reference.ref_reports.len() != programs.len() {
                return None;
            }
            reference
                .ref_reports
                .iter()
                .map(StatReport::mpki)
                .sum::<Option<f64>>()
        } else {
            reference.mpki()
        }
    }

    /// workloads with a heavier memory load sort first
    pub fn sort_key(&self) -> Option<f64> {
        self.reference_mpki()
    }

    /// `MPKI_<mpki>_ipc_<ipc>` or `MPKI_<mpki>_weighted-speedup_<speedup>`
    pub fn feature(&self) -> Result<String> {
        let reference = self.reference_report();
        let mpki = self
            .reference_mpki()
            .ok_or_else(|| self.unavailable(&self.reference, "MPKI"))?;
        if self.is_multi_program() {
            let speedup = reference
                .scalar_value("weighted_speedup")
                .ok_or_else(|| self.unavailable(&self.reference, "weighted_speedup"))?;
            Ok(format!("MPKI_{mpki:.4}_weighted-speedup_{speedup:.4}"))
        } else {
            let ipc: f64 = reference
                .ipc()
                .ok_or_else(|| self.unavailable(&self.reference, "ipc"))?
                .iter()
                .sum();
            Ok(format!("MPKI_{mpki:.4}_ipc_{ipc:.4}"))
        }
    }

    /// one value per configuration in list order, sequences are summed
    fn row(&self, metric: &str) -> Result<Vec<f64>> {
        self.configurations
            .iter()
            .map(|configuration| {
                self.reports[configuration]
                    .get(metric)
                    .map(|v| v.total())
                    .ok_or_else(|| self.unavailable(configuration, metric))
            })
            .collect()
    }

    /// write a header row and one row per metric, one column per configuration.
    /// nothing is written when any metric is unavailable.
    pub fn append_wide<W: Write>(&self, metrics: &[&str], sink: W) -> Result<()> {
        let feature = self.feature()?;
        let rows: Vec<(&str, Vec<f64>)> = metrics
            .iter()
            .map(|&metric| self.row(metric).map(|values| (metric, values)))
            .collect::<Result<_>>()?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(sink);
        let header = format!("{}_{}", self.workload, feature);
        writer.write_record(
            std::iter::once(header.as_str()).chain(self.configurations.iter().map(String::as_str)),
        )?;
        for (metric, values) in rows {
            writer.write_record(
                std::iter::once(metric.to_string()).chain(values.iter().map(|v| format!("{v:.4}"))),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// write one row per (metric, configuration), in a long format for data frames.
    /// nothing is written when any metric is unavailable.
    pub fn append_tidy<W: Write>(&self, metrics: &[&str], sink: W) -> Result<()> {
        let feature = self.feature()?;
        let ref_mpki = self
            .reference_mpki()
            .ok_or_else(|| self.unavailable(&self.reference, "MPKI"))?;
        let workload_and_feature = format!("{}_{}", self.workload, feature);
        let rows: Vec<(&str, Vec<f64>)> = metrics
            .iter()
            .map(|&metric| self.row(metric).map(|values| (metric, values)))
            .collect::<Result<_>>()?;

        let mut writer = csv::WriterBuilder::new().from_writer(sink);
        let ref_mpki = format!("{ref_mpki:.4}");
        for (metric, values) in rows {
            for (configuration, value) in self.configurations.iter().zip(values) {
                let value = format!("{value:.4}");
                let record: [&str; 7] = [
                    metric,
                    &value,
                    configuration,
                    &self.workload,
                    &feature,
                    &workload_and_feature,
                    &ref_mpki,
                ];
                writer.write_record(record)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// heavier memory load first, workloads without MPKI last
pub fn sort_by_load(workloads: &mut [WorkloadStats]) {
    workloads.sort_by(|a, b| match (a.sort_key(), b.sort_key()) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
