pub mod blueprint;
pub mod record;

pub use blueprint::DetectorBlueprint;
pub use record::{BindingRecord, DirectiveDescriptor};
