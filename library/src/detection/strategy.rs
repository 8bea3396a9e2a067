//! The pluggable record-evaluation capability.
//!
//! Each detector owns one `RecordEvaluator`, normally produced by a codegen
//! stage, with one implementation per concrete view shape. The engine decides
//! *when* records are evaluated; the strategy decides *how*.

use std::any::Any;

use super::dispatcher::ChangeDispatcher;
use crate::error::UnexpectedChange;
use crate::model::record::{BindingRecord, DirectiveDescriptor};

/// Opaque component state installed by hydration.
pub type BoundContext = Box<dyn Any + Send>;
/// Opaque local-variable resolution payload.
pub type Locals = Box<dyn Any + Send>;
/// Opaque per-view evaluation helpers (pipes and friends).
pub type EvaluationExtras = Box<dyn Any + Send>;
/// Opaque directive instances handed to the strategy on hydration.
pub type DirectiveValues = Box<dyn Any + Send>;

/// Borrowed view of one detector handed to its evaluation strategy.
pub struct RecordScope<'a> {
    /// Debug name of the detector being evaluated.
    pub detector: &'a str,
    pub records: &'a [BindingRecord],
    pub directives: &'a [DirectiveDescriptor],
    pub context: &'a mut BoundContext,
    pub locals: Option<&'a mut Locals>,
    pub extras: Option<&'a mut EvaluationExtras>,
    pub dispatcher: &'a dyn ChangeDispatcher,
    /// Reset to `false` on every hydration; semantics belong to the strategy.
    pub already_checked: &'a mut bool,
}

/// Fault surfaced by an evaluation strategy, tagged with the index of the
/// record that was in flight so the engine can reconstruct debug context at
/// the wrap site.
#[derive(Debug)]
pub struct EvaluationHalt {
    pub record: Option<usize>,
    pub cause: Box<dyn std::error::Error + Send + Sync>,
}

impl EvaluationHalt {
    /// A fault not tied to any particular record.
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            record: None,
            cause: cause.into(),
        }
    }

    /// A fault raised while evaluating the record at `record`.
    pub fn at(record: usize, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            record: Some(record),
            cause: cause.into(),
        }
    }

    /// A verification pass observed a change at the record at `record`.
    pub fn unexpected_change(
        record: usize,
        previous: impl Into<String>,
        current: impl Into<String>,
    ) -> Self {
        Self::at(
            record,
            UnexpectedChange {
                previous: previous.into(),
                current: current.into(),
            },
        )
    }
}

/// Per-view record evaluation and directive lifecycle.
pub trait RecordEvaluator: Send {
    /// Walk the record table, compare each observed value against the last
    /// pass, and report changes through `scope.dispatcher`.
    ///
    /// When `throw_on_change` is true the pass is a verification pass: the
    /// strategy must not report anything to the dispatcher and must halt
    /// with an [`UnexpectedChange`] cause on the first detected change.
    fn evaluate_records(
        &mut self,
        scope: &mut RecordScope<'_>,
        throw_on_change: bool,
    ) -> Result<(), EvaluationHalt>;

    /// Install directive instances; called once per hydration.
    fn hydrate_directives(&mut self, _directives: DirectiveValues) {}

    /// Reverse `hydrate_directives`. `destroy_extras` signals that the
    /// evaluation extras are being torn down as well.
    fn dehydrate_directives(&mut self, _destroy_extras: bool) {}

    /// All changes have settled for this unit (self plus light subtree).
    /// Never invoked on verification passes.
    fn all_changes_settled(&mut self, _scope: &mut RecordScope<'_>) {}
}
