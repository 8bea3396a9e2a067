use std::any::Any;
use std::sync::Arc;

use library::{
    BindingRecord, ChangeDispatcher, DebugContext, DetectionFault, DetectionMode,
    DetectorBlueprint, DetectorTree, DirectiveDescriptor, EvaluationHalt, RecordEvaluator,
    RecordScope,
};

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

#[test]
fn test_blueprint_serialization_roundtrip() {
    let mut blueprint = DetectorBlueprint::on_push("item-view");
    blueprint.add_record(
        BindingRecord::new(0, 0, "item.title"),
        DirectiveDescriptor::new(0),
    );
    blueprint.add_record(
        BindingRecord::new(1, 2, "item.done"),
        DirectiveDescriptor {
            directive_index: 2,
            call_on_all_changes_done: true,
        },
    );

    let json = blueprint.save().expect("Failed to serialize blueprint");
    let loaded = DetectorBlueprint::load(&json).expect("Failed to deserialize blueprint");

    assert_eq!(blueprint, loaded);
    assert_eq!(loaded.mode_on_hydrate, DetectionMode::CheckOnce);
    assert_eq!(loaded.records[1].element_index, 1);
    assert!(loaded.directives[1].call_on_all_changes_done);
}

#[test]
fn test_blueprint_load_fills_defaults() {
    let loaded = DetectorBlueprint::load(r#"{"name":"bare"}"#).unwrap();

    assert_eq!(loaded.name, "bare");
    assert_eq!(loaded.mode_on_hydrate, DetectionMode::CheckAlways);
    assert!(loaded.records.is_empty());
    assert!(loaded.directives.is_empty());
}

#[test]
fn test_register_rejects_mismatched_tables() {
    let mut blueprint = DetectorBlueprint::new("broken");
    blueprint.records.push(BindingRecord::new(0, 0, "x"));

    let mut tree = DetectorTree::new();
    let fault = tree
        .register(blueprint, Arc::new(NullDispatcher), Box::new(NullEvaluator))
        .unwrap_err();

    assert!(matches!(
        fault,
        DetectionFault::Blueprint { ref name, .. } if name == "broken"
    ));
    assert!(tree.is_empty());
}
