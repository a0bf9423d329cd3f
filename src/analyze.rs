//! aggregate the reports of many workloads into csv files

use std::path::{Path, PathBuf};

use eyre::{bail, Result};
use tracing::{error, info, warn};

use crate::{
    output::OutputSet,
    settings::AnalysisSettings,
    workload::{sort_by_load, WorkloadConfig, WorkloadStats},
};

/// the first row of every long format file
pub const TIDY_HEADER: &str =
    "statistics,value,DRAM,workload,workload_feature,workload_and_feature,ref_MPKI\n";

/// the metrics written to one csv file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricGroup {
    pub name: &'static str,
    pub metrics: &'static [&'static str],
}

const SINGLE_THREADED_GROUPS: &[MetricGroup] = &[
    MetricGroup {
        name: "ipc",
        metrics: &["ipc"],
    },
    MetricGroup {
        name: "normalized_ipc",
        metrics: &["normalized_ipc"],
    },
];

const MULTI_PROGRAM_GROUPS: &[MetricGroup] = &[
    MetricGroup {
        name: "weighted_speedup",
        metrics: &["weighted_speedup"],
    },
    MetricGroup {
        name: "normalized_weighted_speedup",
        metrics: &["normalized_weighted_speedup"],
    },
];

const COMMON_GROUPS: &[MetricGroup] = &[
    MetricGroup {
        name: "locality",
        metrics: &["row_hit_rate", "row_miss_rate", "row_conflict_rate"],
    },
    MetricGroup {
        name: "bandwidth_utilization",
        metrics: &["bandwidth_utilization"],
    },
    MetricGroup {
        name: "average_latency_ns",
        metrics: &[
            "request_packet_latency_ns_avg",
            "queueing_latency_ns_avg",
            "DRAM_latency_ns_avg",
            "response_packet_latency_ns_avg",
        ],
    },
];

const MPKI_GROUP: MetricGroup = MetricGroup {
    name: "MPKI",
    metrics: &["MPKI"],
};

/// the csv files written for single-threaded or multi-program workloads
pub fn metric_groups(multi_program: bool) -> Vec<MetricGroup> {
    let performance = if multi_program {
        MULTI_PROGRAM_GROUPS
    } else {
        SINGLE_THREADED_GROUPS
    };
    std::iter::once(MPKI_GROUP)
        .chain(performance.iter().copied())
        .chain(COMMON_GROUPS.iter().copied())
        .collect()
}

/// the metric every configuration is normalized by
pub fn performance_metric(multi_program: bool) -> &'static str {
    if multi_program {
        "weighted_speedup"
    } else {
        "ipc"
    }
}

/// load, normalize and sort all workloads, heavier memory load first
pub fn load_workloads(settings: &AnalysisSettings) -> Result<Vec<WorkloadStats>> {
    let single_threaded_lists: Vec<Option<Vec<String>>> =
        match &settings.single_threaded_workload_lists {
            Some(lists) => {
                if lists.len() != settings.workloads.len() {
                    bail!(
                        "got {} single-threaded workload lists for {} workloads",
                        lists.len(),
                        settings.workloads.len()
                    );
                }
                lists.iter().cloned().map(Some).collect()
            }
            None => vec![None; settings.workloads.len()],
        };
    let metric = performance_metric(settings.single_threaded_workload_lists.is_some());

    let mut workloads = settings
        .workloads
        .iter()
        .zip(single_threaded_lists)
        .map(|(workload, single_threaded_workloads)| -> Result<WorkloadStats> {
            let config = WorkloadConfig {
                workload_dir: settings.workload_dir.clone(),
                workload: workload.clone(),
                configurations: settings.dram_list.clone(),
                reference: settings.ref_dram.clone(),
                single_threaded_workloads,
            };
            let mut stats = WorkloadStats::load(&config)?;
            if let Err(e) = stats.normalize(metric) {
                warn!("{}", e);
            }
            Ok(stats)
        })
        .collect::<Result<Vec<_>>>()?;
    sort_by_load(&mut workloads);
    Ok(workloads)
}

/// `<dir>_R_dataframe`, where the long format files go
pub fn tidy_dir(output_dir: &Path) -> PathBuf {
    let mut dir = output_dir.as_os_str().to_owned();
    dir.push("_R_dataframe");
    dir.into()
}

/// write every workload into the wide and the long format files,
/// returns the number of (workload, group) pairs that could not be written
pub fn write_outputs(
    workloads: &[WorkloadStats],
    multi_program: bool,
    wide: &mut OutputSet,
    tidy: &mut OutputSet,
) -> Result<usize> {
    let groups = metric_groups(multi_program);
    let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
    tidy.write_to_all(&names, TIDY_HEADER)?;

    let mut failed = 0;
    for w in workloads {
        for group in &groups {
            if let Err(e) = w.append_wide(group.metrics, wide.get(group.name)?) {
                error!(group = group.name, "skip wide output: {}", e);
                failed += 1;
            }
            if let Err(e) = w.append_tidy(group.metrics, tidy.get(group.name)?) {
                error!(group = group.name, "skip long output: {}", e);
                failed += 1;
            }
        }
    }
    wide.flush()?;
    tidy.flush()?;
    Ok(failed)
}

pub fn run(settings: &AnalysisSettings) -> Result<()> {
    let multi_program = settings.single_threaded_workload_lists.is_some();
    let workloads = load_workloads(settings)?;
    info!(
        "loaded {} workloads over {:?}",
        workloads.len(),
        settings.dram_list
    );
    let mut wide = OutputSet::new(&settings.output_dir)?;
    let mut tidy = OutputSet::new(tidy_dir(&settings.output_dir))?;
    let failed = write_outputs(&workloads, multi_program, &mut wide, &mut tidy)?;
    if failed > 0 {
        warn!("{} outputs were skipped because of missing statistics", failed);
    }
    info!(
        "csv files are in {:?} and {:?}",
        wide.output_dir(),
        tidy.output_dir()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn groups() {
        let names: Vec<_> = metric_groups(false).iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "MPKI",
                "ipc",
                "normalized_ipc",
                "locality",
                "bandwidth_utilization",
                "average_latency_ns"
            ]
        );
        let multi = metric_groups(true);
        assert_eq!(multi[1].name, "weighted_speedup");
        assert_eq!(multi[2].metrics, &["normalized_weighted_speedup"]);
    }

    #[test]
    fn dataframe_dir() {
        assert_eq!(
            tidy_dir(Path::new("results/spec")),
            PathBuf::from("results/spec_R_dataframe")
        );
    }
}
