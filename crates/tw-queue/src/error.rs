use thiserror::Error;
use tw_core::ObjectId;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue configuration error: {0}")]
    Config(String),

    #[error("queue state for {object} lists {agent} as both holder and waiter")]
    HolderAlsoWaiting {
        object: ObjectId,
        agent:  tw_core::AgentId,
    },
}

pub type QueueResult<T> = Result<T, QueueError>;
