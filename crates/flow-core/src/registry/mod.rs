pub mod manifest;
pub mod types;

pub use manifest::{FlowEntry, RegistryManifest, TypeEntry};
pub use types::{FlowClass, FlowClassDef, FlowClassId, FlowRegistry, FlowRegistryBuilder};
