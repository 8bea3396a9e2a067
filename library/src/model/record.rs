use serde::{Deserialize, Serialize};

/// One observable binding: which element owns it, which directive it feeds,
/// and the stringified source expression for fault reports.
///
/// Records are produced by the codegen stage and never mutated by the engine.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct BindingRecord {
    pub element_index: usize,
    pub directive_index: usize,
    #[serde(default)]
    pub expression: String,
}

impl BindingRecord {
    pub fn new(element_index: usize, directive_index: usize, expression: &str) -> Self {
        Self {
            element_index,
            directive_index,
            expression: expression.to_string(),
        }
    }
}

/// Directive metadata paired 1:1 with the record table, same order.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct DirectiveDescriptor {
    pub directive_index: usize,
    /// Whether the directive wants a callback once all changes in its unit
    /// have settled. Consumed by evaluation strategies, not by the engine.
    #[serde(default)]
    pub call_on_all_changes_done: bool,
}

impl DirectiveDescriptor {
    pub fn new(directive_index: usize) -> Self {
        Self {
            directive_index,
            call_on_all_changes_done: false,
        }
    }
}
