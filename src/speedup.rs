use tracing::debug;

use crate::{
    error::{Result, StatsError},
    report::StatReport,
};

/// sum over the cores of the multicore report of `ipc / single_threaded_ipc`,
/// every core is compared with the same single-threaded run
pub fn weighted_speedup_against(single_threaded: &StatReport, multicore: &StatReport) -> Result<f64> {
    let single_ipc = single_threaded
        .ipc()
        .and_then(|ipc| ipc.first().copied())
        .filter(|ipc| *ipc != 0.)
        .ok_or(StatsError::MissingIpc("single-threaded"))?;
    let ipc = multicore
        .ipc()
        .ok_or(StatsError::MissingIpc("multicore"))?;
    debug!(cores = ipc.len(), single_ipc);
    Ok(ipc.iter().map(|ipc| ipc / single_ipc).sum())
}
