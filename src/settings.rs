use std::path::{Path, PathBuf};

use config::Config;
use eyre::eyre;
use eyre::Context;
use eyre::Result;
use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct Settings {
    pub analysis: Option<AnalysisSettings>,
    pub simulation: Option<SimulationSettings>,
}

/// which reports to aggregate and where to write the csv files
#[derive(Deserialize, Debug, Clone)]
pub struct AnalysisSettings {
    pub workload_dir: PathBuf,
    pub workloads: Vec<String>,
    pub dram_list: Vec<String>,
    /// the DRAM that every other one is normalized to, also used to reorder workloads
    pub ref_dram: String,
    /// for multi-program workloads, the single-threaded workloads of each entry of `workloads`
    #[serde(default)]
    pub single_threaded_workload_lists: Option<Vec<Vec<String>>>,
    pub output_dir: PathBuf,
}

/// how to launch the memory simulator
#[derive(Deserialize, Debug, Clone)]
pub struct SimulationSettings {
    pub simulator: PathBuf,
    pub trace_dir: PathBuf,
    /// contains `<DRAM>-config.cfg`
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dram_list: Vec<String>,
    #[serde(default = "default_mode")]
    pub mode: String,
    /// simulator processes running at the same time
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default)]
    pub single_threaded: Vec<String>,
    #[serde(default)]
    pub multi_program: Vec<MultiProgram>,
    /// where the ok/err lists of the runs are saved
    #[serde(default = "default_result_file")]
    pub result_file: PathBuf,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MultiProgram {
    pub name: String,
    pub programs: Vec<String>,
}

fn default_mode() -> String {
    "cpu".to_string()
}

fn default_parallel() -> usize {
    1
}

fn default_result_file() -> PathBuf {
    "results/simulation".into()
}

impl Settings {
    /// merge the config files, later files override earlier ones
    pub fn new<P: AsRef<Path>>(configs: &[P]) -> Result<Self> {
        let mut builder = Config::builder();
        for config in configs {
            let name = config.as_ref().to_str().ok_or(eyre!("Invalid path"))?;
            builder = builder.add_source(config::File::with_name(name));
        }
        let settings = builder.build().wrap_err("cannot build Setting object")?;
        let ret = settings
            .try_deserialize()
            .wrap_err("failed to deserialize")?;
        Ok(ret)
    }

    pub fn analysis(&self) -> Result<&AnalysisSettings> {
        self.analysis
            .as_ref()
            .ok_or(eyre!("no [analysis] section in the config files"))
    }

    pub fn simulation(&self) -> Result<&SimulationSettings> {
        self.simulation
            .as_ref()
            .ok_or(eyre!("no [simulation] section in the config files"))
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn merge_config_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let base = dir.path().join("base.toml");
        let multi = dir.path().join("multi.toml");
        fs::write(
            &base,
            r#"
[analysis]
workload_dir = "stats"
workloads = ["mcf", "libquantum"]
dram_list = ["DDR3", "DDR4"]
ref_dram = "DDR3"
output_dir = "results/spec"

[simulation]
simulator = "./ramulator"
trace_dir = "cputraces"
config_dir = "configs"
output_dir = "stats"
dram_list = ["DDR3"]
single_threaded = ["mcf"]
"#,
        )?;
        fs::write(
            &multi,
            r#"
[analysis]
workloads = ["workload0"]
single_threaded_workload_lists = [["mcf", "milc"]]

[[simulation.multi_program]]
name = "workload0"
programs = ["mcf", "milc"]
"#,
        )?;
        let settings = Settings::new(&[&base, &multi])?;
        let analysis = settings.analysis()?;
        assert_eq!(analysis.workloads, vec!["workload0"]);
        assert_eq!(analysis.dram_list, vec!["DDR3", "DDR4"]);
        assert_eq!(
            analysis.single_threaded_workload_lists,
            Some(vec![vec!["mcf".to_string(), "milc".to_string()]])
        );
        let simulation = settings.simulation()?;
        assert_eq!(simulation.mode, "cpu");
        assert_eq!(simulation.parallel, 1);
        assert_eq!(simulation.single_threaded, vec!["mcf"]);
        assert_eq!(
            simulation.multi_program,
            vec![MultiProgram {
                name: "workload0".into(),
                programs: vec!["mcf".into(), "milc".into()]
            }]
        );
        Ok(())
    }

    #[test]
    fn missing_section() -> Result<()> {
        let settings = Settings::default();
        assert!(settings.analysis().is_err());
        assert!(settings.simulation().is_err());
        Ok(())
    }
}
