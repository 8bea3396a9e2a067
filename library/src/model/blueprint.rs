use serde::{Deserialize, Serialize};

use super::record::{BindingRecord, DirectiveDescriptor};
use crate::detection::mode::DetectionMode;
use crate::error::DetectionFault;

/// Construction-time bundle for one detector: debug name, the mode restored
/// on every hydration, and the immutable record/directive tables.
///
/// Blueprints are emitted by the codegen stage, typically as JSON.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct DetectorBlueprint {
    pub name: String,
    #[serde(default)]
    pub mode_on_hydrate: DetectionMode,
    #[serde(default)]
    pub records: Vec<BindingRecord>,
    #[serde(default)]
    pub directives: Vec<DirectiveDescriptor>,
}

impl DetectorBlueprint {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mode_on_hydrate: DetectionMode::CheckAlways,
            records: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Blueprint for a push-style view: checked once per hydration, then
    /// only when something marks its path for re-checking.
    pub fn on_push(name: &str) -> Self {
        Self {
            mode_on_hydrate: DetectionMode::CheckOnce,
            ..Self::new(name)
        }
    }

    /// Add a binding record with its paired directive descriptor.
    pub fn add_record(&mut self, record: BindingRecord, directive: DirectiveDescriptor) {
        self.records.push(record);
        self.directives.push(directive);
    }

    pub fn load(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    pub fn save(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Record and directive tables are paired by position; a length mismatch
    /// means the emitting stage is broken.
    pub(crate) fn validate(&self) -> Result<(), DetectionFault> {
        if self.records.len() != self.directives.len() {
            return Err(DetectionFault::Blueprint {
                name: self.name.clone(),
                reason: format!(
                    "{} records paired with {} directive descriptors",
                    self.records.len(),
                    self.directives.len()
                ),
            });
        }
        Ok(())
    }
}
