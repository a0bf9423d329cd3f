use std::{fs, path::Path};

use dram_stats::{
    analyze::{self, tidy_dir, TIDY_HEADER},
    settings::{AnalysisSettings, Settings},
    StatReport, StatsError, WorkloadConfig, WorkloadStats,
};
use eyre::Result;

fn write_report(dir: &Path, workload: &str, dram: &str, content: &str) -> Result<()> {
    let dir = dir.join(workload);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{dram}.stats")), content)?;
    Ok(())
}

/// a report of one or more cores, `cores` are `(instructions, cycles)`
fn report(cores: &[(f64, f64)], incoming: f64, row_hits: f64, bandwidth: (f64, f64)) -> String {
    let mut text = String::from("# generated\n");
    for (i, (insts, cycles)) in cores.iter().enumerate() {
        text += &format!("ramulator.record_insts_core_{i}   {insts}   # insts\n");
        text += &format!("ramulator.record_cycs_core_{i}    {cycles}  # cycles\n");
    }
    text += &format!(
        "ramulator.incoming_requests_per_channel {incoming}
ramulator.row_hits {row_hits}
ramulator.row_misses 0
ramulator.row_conflicts 0
ramulator.read_bandwidth {}
ramulator.write_bandwidth {}
ramulator.maximum_internal_bandwidth 300
ramulator.read_latency_ns_avg 50
ramulator.queueing_latency_ns_avg 10
ramulator.request_packet_latency_ns_avg 1
ramulator.response_packet_latency_ns_avg 2
",
        bandwidth.0, bandwidth.1
    );
    text
}

#[test]
fn derived_values_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_report(
        dir.path(),
        "mcf",
        "DDR3",
        &report(&[(1000., 500.)], 500., 300., (100., 50.)),
    )?;
    let report = StatReport::load(dir.path().join("mcf/DDR3.stats"));
    assert_eq!(report.scalar_value("bandwidth_utilization"), Some(0.5));
    assert_eq!(report.scalar_value("row_hit_rate"), Some(0.6));
    assert_eq!(report.ipc(), Some(&[2.0][..]));
    assert_eq!(report.scalar_value("DRAM_latency_ns_avg"), Some(37.));
    Ok(())
}

#[test]
fn single_threaded_analysis() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let stats = dir.path().join("stats");
    write_report(&stats, "light", "DDR3", &report(&[(10000., 5000.)], 10., 5., (100., 50.)))?;
    write_report(&stats, "light", "DDR4", &report(&[(10000., 4000.)], 10., 5., (100., 50.)))?;
    write_report(&stats, "heavy", "DDR3", &report(&[(1000., 1000.)], 100., 50., (100., 50.)))?;
    write_report(&stats, "heavy", "DDR4", &report(&[(1000., 500.)], 100., 25., (150., 0.)))?;

    let settings = AnalysisSettings {
        workload_dir: stats,
        workloads: vec!["light".into(), "heavy".into()],
        dram_list: vec!["DDR3".into(), "DDR4".into()],
        ref_dram: "DDR3".into(),
        single_threaded_workload_lists: None,
        output_dir: dir.path().join("out/spec"),
    };
    analyze::run(&settings)?;

    let ipc = fs::read_to_string(dir.path().join("out/spec/ipc.csv"))?;
    // heavier memory load first
    assert_eq!(
        ipc,
        "heavy_MPKI_100.0000_ipc_1.0000,DDR3,DDR4\n\
         ipc,1.0000,2.0000\n\
         light_MPKI_1.0000_ipc_2.0000,DDR3,DDR4\n\
         ipc,2.0000,2.5000\n"
    );
    let normalized = fs::read_to_string(dir.path().join("out/spec/normalized_ipc.csv"))?;
    assert!(normalized.contains("normalized_ipc,1.0000,2.0000\n"));
    assert!(normalized.contains("normalized_ipc,1.0000,1.2500\n"));

    let locality = fs::read_to_string(dir.path().join("out/spec/locality.csv"))?;
    assert!(locality.contains("row_hit_rate,0.5000,0.2500\n"));

    let tidy = fs::read_to_string(tidy_dir(&settings.output_dir).join("MPKI.csv"))?;
    let lines: Vec<_> = tidy.lines().collect();
    assert_eq!(lines[0], TIDY_HEADER.trim_end());
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[1],
        "MPKI,100.0000,DDR3,heavy,MPKI_100.0000_ipc_1.0000,heavy_MPKI_100.0000_ipc_1.0000,100.0000"
    );
    assert!(!dir.path().join("out/spec/weighted_speedup.csv").exists());
    Ok(())
}

#[test]
fn multi_program_analysis() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let stats = dir.path().join("stats");
    // single-threaded references, ipc 1.0 and 0.5
    write_report(&stats, "mcf", "DDR3", &report(&[(1000., 1000.)], 20., 10., (10., 10.)))?;
    write_report(&stats, "milc", "DDR3", &report(&[(1000., 2000.)], 30., 10., (10., 10.)))?;
    // ipc [0.5, 0.25] on DDR3 and [1.0, 0.5] on DDR4
    write_report(
        &stats,
        "mix0",
        "DDR3",
        &report(&[(1000., 2000.), (1000., 4000.)], 100., 50., (10., 10.)),
    )?;
    write_report(
        &stats,
        "mix0",
        "DDR4",
        &report(&[(1000., 1000.), (1000., 2000.)], 100., 50., (10., 10.)),
    )?;

    let config = WorkloadConfig {
        workload_dir: stats.clone(),
        workload: "mix0".into(),
        configurations: vec!["DDR3".into(), "DDR4".into()],
        reference: "DDR3".into(),
        single_threaded_workloads: Some(vec!["mcf".into(), "milc".into()]),
    };
    let mut w = WorkloadStats::load(&config)?;
    assert_eq!(w.reference_report().scalar_value("weighted_speedup"), Some(1.0));
    assert_eq!(w.reports["DDR4"].scalar_value("weighted_speedup"), Some(2.0));
    // 20 + 30 MPKI of the references
    assert_eq!(w.sort_key(), Some(50.));

    w.normalize("weighted_speedup")?;
    let mut out = vec![];
    w.append_wide(&["weighted_speedup", "normalized_weighted_speedup"], &mut out)?;
    assert_eq!(
        String::from_utf8(out)?,
        "mix0_MPKI_50.0000_weighted-speedup_1.0000,DDR3,DDR4\n\
         weighted_speedup,1.0000,2.0000\n\
         normalized_weighted_speedup,1.0000,2.0000\n"
    );
    Ok(())
}

#[test]
fn missing_reports_degrade_gracefully() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let stats = dir.path().join("stats");
    write_report(&stats, "mcf", "DDR3", &report(&[(1000., 1000.)], 20., 10., (10., 10.)))?;
    let config = WorkloadConfig {
        workload_dir: stats,
        workload: "mcf".into(),
        configurations: vec!["DDR3".into(), "HBM".into()],
        reference: "DDR3".into(),
        single_threaded_workloads: None,
    };
    let mut w = WorkloadStats::load(&config)?;
    assert!(w.reports["HBM"].is_empty());
    w.normalize("ipc")?;
    let mut out = vec![];
    let err = w.append_wide(&["ipc"], &mut out).unwrap_err();
    assert!(matches!(err, StatsError::MetricUnavailable { ref configuration, .. } if configuration == "HBM"));
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn settings_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("spec.toml");
    fs::write(
        &config,
        r#"
[analysis]
workload_dir = "stats"
workloads = ["mcf"]
dram_list = ["DDR3", "DDR4", "HBM"]
ref_dram = "DDR3"
output_dir = "results/spec"
"#,
    )?;
    let settings = Settings::new(&[config])?;
    let analysis = settings.analysis()?;
    assert_eq!(analysis.dram_list.len(), 3);
    assert!(analysis.single_threaded_workload_lists.is_none());
    assert!(settings.simulation.is_none());
    Ok(())
}
