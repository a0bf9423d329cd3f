//! launch the memory simulator for every (workload, DRAM) pair

use std::{
    fs,
    path::PathBuf,
    process::{Command, Stdio},
    time::Instant,
};

use eyre::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, span, Level};

use crate::{result::save_result_list, settings::SimulationSettings};

/// one simulator run, writes its report to `output`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimJob {
    pub workload: String,
    pub dram: String,
    pub config: PathBuf,
    pub traces: Vec<PathBuf>,
    pub output: PathBuf,
}

impl SimJob {
    /// `<simulator> <config> --mode=<mode> --stats <output> <traces>...`
    pub fn command(&self, settings: &SimulationSettings) -> Command {
        let mut cmd = Command::new(&settings.simulator);
        cmd.arg(&self.config)
            .arg(format!("--mode={}", settings.mode))
            .arg("--stats")
            .arg(&self.output)
            .args(&self.traces);
        cmd
    }

    fn run(&self, settings: &SimulationSettings) -> Result<()> {
        let span = span!(Level::INFO, "sim", workload = %self.workload, dram = %self.dram);
        let _entered = span.enter();
        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent)?;
        }
        let start = Instant::now();
        let status = self
            .command(settings)
            .stdout(Stdio::null())
            .status()
            .wrap_err(format!("fail to launch {:?}", settings.simulator))?;
        if !status.success() {
            bail!("simulator exited with {}", status);
        }
        info!(
            "finished in {:.2}s, stats in {:?}",
            start.elapsed().as_secs_f64(),
            self.output
        );
        Ok(())
    }
}

/// every single-threaded and multi-program workload on every DRAM
pub fn jobs(settings: &SimulationSettings) -> Vec<SimJob> {
    let trace = |program: &str| settings.trace_dir.join(format!("{program}.trace"));
    let workloads = settings
        .single_threaded
        .iter()
        .map(|program| (program.clone(), vec![trace(program)]))
        .chain(settings.multi_program.iter().map(|multi| {
            (
                multi.name.clone(),
                multi.programs.iter().map(|p| trace(p)).collect(),
            )
        }));
    workloads
        .flat_map(|(workload, traces)| {
            settings.dram_list.iter().map(move |dram| SimJob {
                workload: workload.clone(),
                dram: dram.clone(),
                config: settings.config_dir.join(format!("{dram}-config.cfg")),
                traces: traces.clone(),
                output: settings
                    .output_dir
                    .join(&workload)
                    .join(format!("{dram}.stats")),
            })
        })
        .collect()
}

/// run all jobs, at most `parallel` simulators at the same time,
/// and save the lists of finished and failed runs
pub fn run(settings: &SimulationSettings) -> Result<(Vec<SimJob>, Vec<SimJob>)> {
    let jobs = jobs(settings);
    info!("{} simulations to run", jobs.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.parallel.max(1))
        .build()
        .wrap_err("fail to build the thread pool")?;
    let results: Vec<(SimJob, Result<()>)> = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                let result = job.run(settings);
                (job, result)
            })
            .collect()
    });

    let mut ok_list = vec![];
    let mut err_list = vec![];
    for (job, result) in results {
        match result {
            Ok(()) => ok_list.push(job),
            Err(e) => {
                error!(workload = %job.workload, dram = %job.dram, "{:?}", e);
                err_list.push(job);
            }
        }
    }
    save_result_list(&ok_list, &err_list, &settings.result_file)
        .wrap_err("fail to save result lists")?;
    info!("{} finished, {} failed", ok_list.len(), err_list.len());
    Ok((ok_list, err_list))
}
