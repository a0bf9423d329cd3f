use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("metric `{metric}` is unavailable for configuration `{configuration}` of workload `{workload}`")]
    MetricUnavailable {
        workload: String,
        configuration: String,
        metric: String,
    },
    #[error("reference configuration `{reference}` is not in the configuration list {configurations:?}")]
    ReferenceNotInList {
        reference: String,
        configurations: Vec<String>,
    },
    #[error("the {0} report has no usable ipc")]
    MissingIpc(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;
