use std::sync::Arc;

use log::{debug, trace, warn};
use uuid::Uuid;

use super::detector::Detector;
use super::dispatcher::ChangeDispatcher;
use super::handle::DetectorHandle;
use super::mode::DetectionMode;
use super::strategy::{
    BoundContext, DirectiveValues, EvaluationExtras, Locals, RecordEvaluator,
};
use crate::error::DetectionFault;
use crate::model::blueprint::DetectorBlueprint;

/// Registry and driver for a forest of detectors.
///
/// All detectors live here; parent/child relations are stored as id pairs
/// and resolved by lookup. One external caller drives passes at a time,
/// which the exclusive borrow enforces.
pub struct DetectorTree {
    detectors: Vec<Detector>,
}

impl DetectorTree {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Register a detector built from a blueprint. The blueprint is
    /// validated here; a mismatched record/descriptor pairing is rejected.
    pub fn register(
        &mut self,
        blueprint: DetectorBlueprint,
        dispatcher: Arc<dyn ChangeDispatcher>,
        strategy: Box<dyn RecordEvaluator>,
    ) -> Result<Uuid, DetectionFault> {
        blueprint.validate()?;
        let detector = Detector::new(blueprint, dispatcher, strategy);
        let id = detector.id();
        debug!("registered detector `{}` ({id})", detector.name());
        self.detectors.push(detector);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Detector> {
        self.detectors.iter().find(|detector| detector.id() == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Detector> {
        self.detectors
            .iter_mut()
            .find(|detector| detector.id() == id)
    }

    fn require(&self, id: Uuid) -> Result<&Detector, DetectionFault> {
        self.get(id).ok_or(DetectionFault::Unknown { id })
    }

    fn require_mut(&mut self, id: Uuid) -> Result<&mut Detector, DetectionFault> {
        self.get_mut(id).ok_or(DetectionFault::Unknown { id })
    }

    /// External-facing reference to one detector.
    pub fn handle(&mut self, id: Uuid) -> Result<DetectorHandle<'_>, DetectionFault> {
        self.require(id)?;
        Ok(DetectorHandle::new(self, id))
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    // --- Tree composition ---

    /// Append `child` to `parent`'s light child list and point the child's
    /// parent back-reference at `parent`. Mode and hydration state of both
    /// detectors are untouched.
    pub fn add_child(&mut self, parent: Uuid, child: Uuid) -> Result<(), DetectionFault> {
        self.require(child)?;
        self.require_mut(parent)?.light_children.push(child);
        self.require_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `child` from `parent`'s light child list and clear its parent
    /// back-reference.
    pub fn remove_child(&mut self, parent: Uuid, child: Uuid) -> Result<(), DetectionFault> {
        let detector = self.require_mut(parent)?;
        if let Some(position) = detector.light_children.iter().position(|c| *c == child) {
            detector.light_children.remove(position);
        } else {
            warn!("detector {child} is not a light child of {parent}");
        }
        self.clear_parent(parent, child);
        Ok(())
    }

    /// Append `child` to `parent`'s shadow child list; shadow children are
    /// visited after the parent's settle hook rather than before it.
    pub fn add_shadow_child(&mut self, parent: Uuid, child: Uuid) -> Result<(), DetectionFault> {
        self.require(child)?;
        self.require_mut(parent)?.shadow_children.push(child);
        self.require_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `child` from `parent`'s shadow child list and clear its parent
    /// back-reference.
    pub fn remove_shadow_child(&mut self, parent: Uuid, child: Uuid) -> Result<(), DetectionFault> {
        let detector = self.require_mut(parent)?;
        if let Some(position) = detector.shadow_children.iter().position(|c| *c == child) {
            detector.shadow_children.remove(position);
        } else {
            warn!("detector {child} is not a shadow child of {parent}");
        }
        self.clear_parent(parent, child);
        Ok(())
    }

    /// Detach `child` from its parent's light child list.
    pub fn remove(&mut self, child: Uuid) -> Result<(), DetectionFault> {
        let Some(parent) = self.require(child)?.parent() else {
            warn!("detector {child} has no parent to be removed from");
            return Ok(());
        };
        self.remove_child(parent, child)
    }

    fn clear_parent(&mut self, parent: Uuid, child: Uuid) {
        if let Some(detector) = self.get_mut(child) {
            if detector.parent == Some(parent) {
                detector.parent = None;
            }
        }
    }

    // --- Detection passes ---

    /// Run a normal pass starting at `id`: changes are applied and reported
    /// to the dispatcher.
    pub fn detect_changes(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.run_detect_changes(id, false)
    }

    /// Run a verification pass starting at `id`: the first detected change
    /// is a fault, and nothing dispatcher-visible may happen.
    pub fn check_no_changes(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.run_detect_changes(id, true)
    }

    /// The pass state machine. Ordering is a correctness contract:
    /// self-records, light subtree, own settle hook, shadow subtree, mode
    /// downgrade.
    pub(crate) fn run_detect_changes(
        &mut self,
        id: Uuid,
        throw_on_change: bool,
    ) -> Result<(), DetectionFault> {
        let (light, shadow) = {
            let detector = self.require(id)?;
            if detector.mode().skips_pass() {
                trace!(
                    "skipping pass on `{}` ({:?})",
                    detector.name(),
                    detector.mode()
                );
                return Ok(());
            }
            (
                detector.light_children.clone(),
                detector.shadow_children.clone(),
            )
        };

        self.require_mut(id)?.detect_changes_in_records(throw_on_change)?;

        for child in &light {
            self.run_detect_changes(*child, throw_on_change)?;
        }

        if !throw_on_change {
            self.require_mut(id)?.call_all_changes_settled();
        }

        for child in &shadow {
            self.run_detect_changes(*child, throw_on_change)?;
        }

        let detector = self.require_mut(id)?;
        if detector.mode() == DetectionMode::CheckOnce {
            detector.mode = DetectionMode::Checked;
        }
        Ok(())
    }

    // --- Mode propagation ---

    /// Unconditionally schedule `id` for the next pass.
    pub fn mark_as_check_once(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.require_mut(id)?.mark_as_check_once();
        Ok(())
    }

    /// Walk from `id` towards the root, upgrading `Checked` detectors to
    /// `CheckOnce`. The walk stops at the first `Detached` detector without
    /// upgrading it: detachment is a boundary invalidation never crosses.
    pub fn mark_path_to_root_as_check_once(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.require(id)?;
        let mut current = Some(id);
        while let Some(current_id) = current {
            let Some(detector) = self.get_mut(current_id) else {
                break;
            };
            if detector.mode() == DetectionMode::Detached {
                break;
            }
            if detector.mode() == DetectionMode::Checked {
                detector.mode = DetectionMode::CheckOnce;
            }
            current = detector.parent;
        }
        Ok(())
    }

    /// Exclude `id`'s subtree from passes until reattached.
    pub fn detach(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.require_mut(id)?.mode = DetectionMode::Detached;
        Ok(())
    }

    /// Resume checking `id` on every pass, and mark its ancestor chain so
    /// the next pass actually reaches it.
    pub fn reattach(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.require_mut(id)?.mode = DetectionMode::CheckAlways;
        self.mark_path_to_root_as_check_once(id)
    }

    // --- Hydration lifecycle ---

    pub fn hydrate(
        &mut self,
        id: Uuid,
        context: BoundContext,
        locals: Option<Locals>,
        directives: DirectiveValues,
        extras: Option<EvaluationExtras>,
    ) -> Result<(), DetectionFault> {
        self.require_mut(id)?
            .hydrate(context, locals, directives, extras);
        Ok(())
    }

    pub fn dehydrate(&mut self, id: Uuid) -> Result<(), DetectionFault> {
        self.require_mut(id)?.dehydrate();
        Ok(())
    }

    pub fn hydrated(&self, id: Uuid) -> bool {
        self.get(id).is_some_and(Detector::hydrated)
    }
}

impl Default for DetectorTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::detection::dispatcher::DebugContext;
    use crate::detection::strategy::{EvaluationHalt, RecordScope};
    use crate::model::record::BindingRecord;

    struct NullDispatcher;

    impl ChangeDispatcher for NullDispatcher {
        fn notify_on_binding(&self, _record: &BindingRecord, _value: &dyn Any) {}

        fn debug_context(
            &self,
            _element_index: usize,
            _directive_index: usize,
        ) -> Option<DebugContext> {
            None
        }
    }

    struct NullEvaluator;

    impl RecordEvaluator for NullEvaluator {
        fn evaluate_records(
            &mut self,
            _scope: &mut RecordScope<'_>,
            _throw_on_change: bool,
        ) -> Result<(), EvaluationHalt> {
            Ok(())
        }
    }

    fn setup_tree(count: usize) -> (DetectorTree, Vec<Uuid>) {
        let mut tree = DetectorTree::new();
        let ids = (0..count)
            .map(|index| {
                tree.register(
                    DetectorBlueprint::new(&format!("detector-{index}")),
                    Arc::new(NullDispatcher),
                    Box::new(NullEvaluator),
                )
                .unwrap()
            })
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_add_child_sets_parent() {
        let (mut tree, ids) = setup_tree(2);
        tree.add_child(ids[0], ids[1]).unwrap();

        assert_eq!(tree.get(ids[0]).unwrap().light_children(), &[ids[1]]);
        assert_eq!(tree.get(ids[1]).unwrap().parent(), Some(ids[0]));
    }

    #[test]
    fn test_shadow_children_are_a_separate_list() {
        let (mut tree, ids) = setup_tree(3);
        tree.add_child(ids[0], ids[1]).unwrap();
        tree.add_shadow_child(ids[0], ids[2]).unwrap();

        let root = tree.get(ids[0]).unwrap();
        assert_eq!(root.light_children(), &[ids[1]]);
        assert_eq!(root.shadow_children(), &[ids[2]]);
    }

    #[test]
    fn test_remove_clears_parent_reference() {
        let (mut tree, ids) = setup_tree(2);
        tree.add_child(ids[0], ids[1]).unwrap();
        tree.remove(ids[1]).unwrap();

        assert!(tree.get(ids[0]).unwrap().light_children().is_empty());
        assert_eq!(tree.get(ids[1]).unwrap().parent(), None);
    }

    #[test]
    fn test_remove_without_parent_is_a_noop() {
        let (mut tree, ids) = setup_tree(1);
        tree.remove(ids[0]).unwrap();
        assert_eq!(tree.get(ids[0]).unwrap().parent(), None);
    }

    #[test]
    fn test_composition_preserves_insertion_order() {
        let (mut tree, ids) = setup_tree(4);
        tree.add_child(ids[0], ids[2]).unwrap();
        tree.add_child(ids[0], ids[1]).unwrap();
        tree.add_child(ids[0], ids[3]).unwrap();

        assert_eq!(
            tree.get(ids[0]).unwrap().light_children(),
            &[ids[2], ids[1], ids[3]]
        );
    }

    #[test]
    fn test_unknown_detector_is_a_fault() {
        let (mut tree, ids) = setup_tree(1);
        let missing = Uuid::new_v4();
        let fault = tree.add_child(ids[0], missing).unwrap_err();
        assert!(matches!(fault, DetectionFault::Unknown { id } if id == missing));
    }
}
