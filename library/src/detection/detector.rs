use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use super::dispatcher::ChangeDispatcher;
use super::mode::DetectionMode;
use super::strategy::{
    BoundContext, DirectiveValues, EvaluationExtras, EvaluationHalt, Locals, RecordEvaluator,
    RecordScope,
};
use crate::error::DetectionFault;
use crate::model::blueprint::DetectorBlueprint;
use crate::model::record::{BindingRecord, DirectiveDescriptor};

/// One node of the detector tree: mode, hydration state, the immutable
/// record tables, and the strategy that evaluates them.
///
/// Tree shape outlives hydration: a detector is hydrated whenever its view
/// becomes active, dehydrated when the view is recycled, and discarded only
/// on permanent teardown.
pub struct Detector {
    id: Uuid,
    name: String,
    pub(crate) mode: DetectionMode,
    mode_on_hydrate: DetectionMode,
    pub(crate) parent: Option<Uuid>,
    pub(crate) light_children: Vec<Uuid>,
    pub(crate) shadow_children: Vec<Uuid>,
    records: Vec<BindingRecord>,
    directives: Vec<DirectiveDescriptor>,
    context: Option<BoundContext>,
    locals: Option<Locals>,
    extras: Option<EvaluationExtras>,
    already_checked: bool,
    dispatcher: Arc<dyn ChangeDispatcher>,
    strategy: Box<dyn RecordEvaluator>,
}

impl Detector {
    pub(crate) fn new(
        blueprint: DetectorBlueprint,
        dispatcher: Arc<dyn ChangeDispatcher>,
        strategy: Box<dyn RecordEvaluator>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: blueprint.name,
            mode: blueprint.mode_on_hydrate,
            mode_on_hydrate: blueprint.mode_on_hydrate,
            parent: None,
            light_children: Vec::new(),
            shadow_children: Vec::new(),
            records: blueprint.records,
            directives: blueprint.directives,
            context: None,
            locals: None,
            extras: None,
            already_checked: false,
            dispatcher,
            strategy,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn mode_on_hydrate(&self) -> DetectionMode {
        self.mode_on_hydrate
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub fn light_children(&self) -> &[Uuid] {
        &self.light_children
    }

    pub fn shadow_children(&self) -> &[Uuid] {
        &self.shadow_children
    }

    pub fn records(&self) -> &[BindingRecord] {
        &self.records
    }

    pub fn directives(&self) -> &[DirectiveDescriptor] {
        &self.directives
    }

    /// A detector is hydrated iff its bound context is present.
    pub fn hydrated(&self) -> bool {
        self.context.is_some()
    }

    /// Install runtime values and restore the hydration mode. The directive
    /// instances go straight to the strategy.
    pub fn hydrate(
        &mut self,
        context: BoundContext,
        locals: Option<Locals>,
        directives: DirectiveValues,
        extras: Option<EvaluationExtras>,
    ) {
        debug!("hydrating detector `{}`", self.name);
        self.mode = self.mode_on_hydrate;
        self.context = Some(context);
        self.locals = locals;
        self.extras = extras;
        self.strategy.hydrate_directives(directives);
        self.already_checked = false;
    }

    /// Clear runtime values, keeping the tree shape for reuse. Directive
    /// teardown runs first so the strategy still sees a hydrated view.
    pub fn dehydrate(&mut self) {
        debug!("dehydrating detector `{}`", self.name);
        self.strategy.dehydrate_directives(true);
        self.context = None;
        self.locals = None;
        self.extras = None;
    }

    /// Schedule this detector for exactly one more pass.
    pub fn mark_as_check_once(&mut self) {
        self.mode = DetectionMode::CheckOnce;
    }

    /// Evaluate the record table through the strategy. Re-checks hydration
    /// independently of the caller's mode check: a dehydrated but not
    /// detached detector must fault rather than evaluate.
    pub(crate) fn detect_changes_in_records(
        &mut self,
        throw_on_change: bool,
    ) -> Result<(), DetectionFault> {
        let Some(context) = self.context.as_mut() else {
            return Err(DetectionFault::Dehydrated {
                detector: self.name.clone(),
            });
        };
        let result = {
            let mut scope = RecordScope {
                detector: &self.name,
                records: &self.records,
                directives: &self.directives,
                context,
                locals: self.locals.as_mut(),
                extras: self.extras.as_mut(),
                dispatcher: self.dispatcher.as_ref(),
                already_checked: &mut self.already_checked,
            };
            self.strategy.evaluate_records(&mut scope, throw_on_change)
        };
        result.map_err(|halt| self.wrap_halt(halt))
    }

    /// Invoke the settle hook. Only reachable after records evaluated, so a
    /// missing context means the pass already faulted; nothing to do then.
    pub(crate) fn call_all_changes_settled(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        let mut scope = RecordScope {
            detector: &self.name,
            records: &self.records,
            directives: &self.directives,
            context,
            locals: self.locals.as_mut(),
            extras: self.extras.as_mut(),
            dispatcher: self.dispatcher.as_ref(),
            already_checked: &mut self.already_checked,
        };
        self.strategy.all_changes_settled(&mut scope);
    }

    /// Resolve the in-flight record and its debug bundle, then wrap the
    /// strategy fault so the raw cause never escapes unwrapped.
    fn wrap_halt(&self, halt: EvaluationHalt) -> DetectionFault {
        let record = halt.record.and_then(|index| self.records.get(index)).cloned();
        let context = record.as_ref().and_then(|record| {
            self.dispatcher
                .debug_context(record.element_index, record.directive_index)
        });
        DetectionFault::evaluation(self.name.clone(), record, context, halt.cause)
    }
}
