use uuid::Uuid;

use super::detector::Detector;
use super::mode::DetectionMode;
use super::strategy::{BoundContext, DirectiveValues, EvaluationExtras, Locals};
use super::tree::DetectorTree;
use crate::error::DetectionFault;

/// External-facing reference to one detector, used to trigger passes and to
/// drive composition and lifecycle without exposing node internals.
///
/// Holds the tree exclusively for its lifetime; passes stay serialized.
pub struct DetectorHandle<'a> {
    tree: &'a mut DetectorTree,
    id: Uuid,
}

impl<'a> DetectorHandle<'a> {
    pub(crate) fn new(tree: &'a mut DetectorTree, id: Uuid) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run a normal detection pass over this subtree.
    pub fn detect_changes(&mut self) -> Result<(), DetectionFault> {
        self.tree.detect_changes(self.id)
    }

    /// Run a verification pass: raises on the first detected change and has
    /// no other observable effect.
    pub fn check_no_changes(&mut self) -> Result<(), DetectionFault> {
        self.tree.check_no_changes(self.id)
    }

    pub fn hydrate(
        &mut self,
        context: BoundContext,
        locals: Option<Locals>,
        directives: DirectiveValues,
        extras: Option<EvaluationExtras>,
    ) -> Result<(), DetectionFault> {
        self.tree.hydrate(self.id, context, locals, directives, extras)
    }

    pub fn dehydrate(&mut self) -> Result<(), DetectionFault> {
        self.tree.dehydrate(self.id)
    }

    pub fn hydrated(&self) -> bool {
        self.tree.hydrated(self.id)
    }

    pub fn mode(&self) -> Option<DetectionMode> {
        self.tree.get(self.id).map(Detector::mode)
    }

    pub fn mark_as_check_once(&mut self) -> Result<(), DetectionFault> {
        self.tree.mark_as_check_once(self.id)
    }

    pub fn mark_path_to_root_as_check_once(&mut self) -> Result<(), DetectionFault> {
        self.tree.mark_path_to_root_as_check_once(self.id)
    }

    /// Exclude this subtree from passes until reattached.
    pub fn detach(&mut self) -> Result<(), DetectionFault> {
        self.tree.detach(self.id)
    }

    /// Resume checking on every pass and mark the ancestor chain so the next
    /// pass reaches this detector.
    pub fn reattach(&mut self) -> Result<(), DetectionFault> {
        self.tree.reattach(self.id)
    }

    pub fn add_child(&mut self, child: Uuid) -> Result<(), DetectionFault> {
        self.tree.add_child(self.id, child)
    }

    pub fn remove_child(&mut self, child: Uuid) -> Result<(), DetectionFault> {
        self.tree.remove_child(self.id, child)
    }

    pub fn add_shadow_child(&mut self, child: Uuid) -> Result<(), DetectionFault> {
        self.tree.add_shadow_child(self.id, child)
    }

    pub fn remove_shadow_child(&mut self, child: Uuid) -> Result<(), DetectionFault> {
        self.tree.remove_shadow_child(self.id, child)
    }

    /// Detach this detector from its parent's light child list.
    pub fn remove(self) -> Result<(), DetectionFault> {
        self.tree.remove(self.id)
    }
}
