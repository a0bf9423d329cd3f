use std::env::args_os;

use clap::Parser;
use dram_stats::{args::Args, run_main};
use eyre::Result;
fn main() -> Result<()> {
    let args = args_os();
    let args = Args::parse_from(args);
    run_main::main(args)
}

#[cfg(test)]
mod test_main {
    use clap::Parser;
    use dram_stats::args::{Args, RunMode};

    #[test]
    fn parse_args() {
        let args = Args::parse_from(vec![
            "dram_stats",
            "-r",
            "analyze",
            "configs/spec.toml",
            "configs/multi.toml",
        ]);
        assert_eq!(args.run_mode, Some(RunMode::Analyze));
        assert_eq!(args.files.len(), 2);
        assert!(args.generator.is_none());
    }

    #[test]
    fn default_mode() {
        let args = Args::parse_from(vec!["dram_stats"]);
        assert!(args.run_mode.is_none());
        assert!(args.files.is_empty());
    }
}
