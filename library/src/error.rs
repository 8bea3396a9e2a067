use std::backtrace::Backtrace;

use thiserror::Error;
use uuid::Uuid;

use crate::detection::dispatcher::DebugContext;
use crate::model::record::BindingRecord;

/// Boxed underlying cause of an evaluation fault.
pub type FaultCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DetectionFault {
    /// The evaluation strategy faulted mid-pass. Carries the record that was
    /// in flight and the debug bundle the dispatcher resolved for it, so the
    /// failing binding can be located without re-running the pass.
    #[error("change detection aborted in detector `{detector}`: {cause}")]
    Evaluation {
        detector: String,
        record: Option<BindingRecord>,
        context: Option<DebugContext>,
        #[source]
        cause: FaultCause,
        trace: String,
    },
    /// A pass was requested on a detector whose runtime values are absent.
    #[error("attempted change detection on dehydrated detector `{detector}`")]
    Dehydrated { detector: String },
    #[error("unknown detector {id}")]
    Unknown { id: Uuid },
    #[error("malformed blueprint `{name}`: {reason}")]
    Blueprint { name: String, reason: String },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DetectionFault {
    pub(crate) fn evaluation(
        detector: String,
        record: Option<BindingRecord>,
        context: Option<DebugContext>,
        cause: FaultCause,
    ) -> Self {
        DetectionFault::Evaluation {
            detector,
            record,
            context,
            cause,
            trace: Backtrace::capture().to_string(),
        }
    }

    /// The record that was being evaluated when the fault was raised.
    pub fn record(&self) -> Option<&BindingRecord> {
        match self {
            DetectionFault::Evaluation { record, .. } => record.as_ref(),
            _ => None,
        }
    }

    /// The debug bundle reconstructed for the offending record.
    pub fn debug_context(&self) -> Option<&DebugContext> {
        match self {
            DetectionFault::Evaluation { context, .. } => context.as_ref(),
            _ => None,
        }
    }
}

/// Cause attached to a fault raised when a verification pass observes a
/// change that should already have been applied.
#[derive(Error, Debug)]
#[error("expression changed after it was checked: previous value `{previous}`, current value `{current}`")]
pub struct UnexpectedChange {
    pub previous: String,
    pub current: String,
}
