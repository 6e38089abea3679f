use thiserror::Error;
use tw_core::{JobId, TwError};

#[derive(Debug, Error)]
pub enum EmploymentError {
    #[error("employment configuration error: {0}")]
    Config(String),

    #[error("roster parse error: {0}")]
    Parse(String),

    #[error("job {0} registered twice")]
    DuplicateJob(JobId),

    #[error("job {job} window {start}..={end} does not fit a {ticks_per_day}-tick day")]
    JobWindow {
        job:           JobId,
        start:         u64,
        end:           u64,
        ticks_per_day: u64,
    },

    #[error(transparent)]
    Core(#[from] TwError),
}

pub type EmploymentResult<T> = Result<T, EmploymentError>;
