use thiserror::Error;
use tw_affordance::AffordanceError;
use tw_core::TwError;
use tw_employment::EmploymentError;
use tw_queue::QueueError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Affordance(#[from] AffordanceError),

    #[error(transparent)]
    Employment(#[from] EmploymentError),

    #[error(transparent)]
    Core(#[from] TwError),

    #[error("state document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
