use std::any::Any;

use crate::model::record::BindingRecord;

/// Debug bundle reconstructed for fault reports: where in the element tree
/// the offending binding lives and what was bound there. All fields are
/// display-oriented; the dispatcher fills in what it knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugContext {
    pub element: Option<String>,
    pub component_element: Option<String>,
    pub directive: Option<String>,
    pub context: Option<String>,
    pub locals: Option<String>,
    pub injector: Option<String>,
}

/// Receives change notifications from evaluation strategies and answers
/// debug-context lookups when a fault needs to be enriched.
///
/// Shared between detectors via `Arc`; implementations that record state
/// use interior mutability.
pub trait ChangeDispatcher: Send + Sync {
    /// A binding's value changed during a normal pass.
    fn notify_on_binding(&self, record: &BindingRecord, value: &dyn Any);

    /// Resolve the debug bundle for an element/directive pair, if known.
    fn debug_context(&self, element_index: usize, directive_index: usize)
    -> Option<DebugContext>;
}
