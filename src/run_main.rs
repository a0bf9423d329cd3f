use std::io::{self, Write};
use std::path::PathBuf;

use super::{
    analyze,
    args::{Args, RunMode},
    report::StatReport,
    settings::Settings,
    simulate,
    speedup::weighted_speedup_against,
};
use crate::init_logger;
use clap::{Command, IntoApp};
use clap_complete::Generator;
use eyre::{bail, Context, Result};
use tracing::{debug, info};

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    clap_complete::generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn load_settings(mut config_files: Vec<PathBuf>) -> Result<Settings> {
    if config_files.is_empty() {
        config_files.push("configs/default.toml".into());
    }
    let settings = Settings::new(&config_files).wrap_err("fail to create Setting object")?;
    debug!("{:?}", settings);
    Ok(settings)
}

pub fn main(args: Args) -> Result<()> {
    init_logger();
    let start_time = std::time::Instant::now();
    if let Some(generator) = args.generator {
        let mut cmd = Args::command();
        eprintln!("Generating completion file for {:?}...", generator);
        print_completions(generator, &mut cmd);
        return Ok(());
    }
    info!("start with {:?}", args);

    let run_mode = args.run_mode.unwrap_or(RunMode::Analyze);
    match run_mode {
        RunMode::Analyze => {
            let settings = load_settings(args.files)?;
            analyze::run(settings.analysis()?)?;
        }
        RunMode::Simulate => {
            let settings = load_settings(args.files)?;
            let (ok_list, err_list) = simulate::run(settings.simulation()?)?;
            if !err_list.is_empty() {
                bail!(
                    "{} of {} simulations failed",
                    err_list.len(),
                    ok_list.len() + err_list.len()
                );
            }
        }
        RunMode::Speedup => {
            let (single, multi) = match args.files.as_slice() {
                [single, multi] => (single, multi),
                _ => bail!("speedup mode takes a single-threaded and a multicore stats file"),
            };
            let speedup =
                weighted_speedup_against(&StatReport::load(single), &StatReport::load(multi))?;
            println!("{speedup}");
        }
        RunMode::Dump => {
            let (stats, references) = match args.files.split_first() {
                Some(files) => files,
                None => bail!("dump mode takes a stats file"),
            };
            let report = if references.is_empty() {
                StatReport::load(stats)
            } else {
                StatReport::load_with_references(stats, references)
            };
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)
                .wrap_err("fail to serialize the report")?;
            writeln!(stdout)?;
        }
    }
    info!(
        "running time: {:?}'s",
        std::time::Instant::now()
            .duration_since(start_time)
            .as_secs_f64()
    );
    Ok(())
}
