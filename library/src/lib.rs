pub mod detection;
pub mod error;
pub mod model;

pub use crate::detection::detector::Detector;
pub use crate::detection::dispatcher::{ChangeDispatcher, DebugContext};
pub use crate::detection::handle::DetectorHandle;
pub use crate::detection::mode::DetectionMode;
pub use crate::detection::strategy::{
    BoundContext, DirectiveValues, EvaluationExtras, EvaluationHalt, Locals, RecordEvaluator,
    RecordScope,
};
pub use crate::detection::tree::DetectorTree;
pub use crate::error::{DetectionFault, UnexpectedChange};
pub use crate::model::blueprint::DetectorBlueprint;
pub use crate::model::record::{BindingRecord, DirectiveDescriptor};
