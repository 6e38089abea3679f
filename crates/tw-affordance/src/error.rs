use thiserror::Error;
use tw_core::{AffordanceId, ObjectTypeId, TwError};

use crate::HookStage;

#[derive(Debug, Error)]
pub enum AffordanceError {
    #[error("manifest parse error: {0}")]
    Parse(String),

    #[error("invalid precondition {source_text:?}: {message}")]
    Precondition {
        source_text: String,
        message:     String,
    },

    #[error("duplicate affordance {0}")]
    Duplicate(AffordanceId),

    #[error("affordance {affordance} targets {object_type}, which no object has")]
    UnknownObjectType {
        affordance:  AffordanceId,
        object_type: ObjectTypeId,
    },

    #[error("affordance {affordance} names {stage:?} hook {name:?}, which is not registered")]
    UnregisteredHook {
        affordance: AffordanceId,
        stage:      HookStage,
        name:       String,
    },

    #[error("running action references unknown affordance {0}")]
    UnknownAffordance(AffordanceId),

    #[error(transparent)]
    Core(#[from] TwError),
}

pub type AffordanceResult<T> = Result<T, AffordanceError>;
