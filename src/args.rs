use std::path::PathBuf;

use clap::{Parser, ValueHint};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[clap(version, about = "run the DRAM simulator and analyze its statistics", long_about = None, trailing_var_arg = true)]
pub struct Args {
    /// Generate completion for the given shell
    #[clap(long = "generate", short = 'g', arg_enum)]
    pub generator: Option<Shell>,
    #[clap(long = "run-mode", short = 'r', arg_enum)]
    pub run_mode: Option<RunMode>,
    /// in `analyze` and `simulate` mode: the config files, default is "configs/default.toml".
    /// in `speedup` mode: the single-threaded then the multicore stats file.
    /// in `dump` mode: the stats file followed by its single-threaded reference stats files.
    #[clap(parse(from_os_str), value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ArgEnum)]
pub enum RunMode {
    /// aggregate the stats of all workloads into csv files
    Analyze,
    /// launch the simulator for all workloads
    Simulate,
    /// weighted speedup of a multicore run against one single-threaded run
    Speedup,
    /// print a parsed stats file as json
    Dump,
}
