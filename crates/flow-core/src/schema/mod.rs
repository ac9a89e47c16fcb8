pub mod path;
pub mod types;

pub use path::{follow_path, resolve_path, PathStep, SpecializationPath};
pub(crate) use path::take_path;
pub use types::{EntityKind, EntityTypeDef, EntityTypeId, ParentLink, Storage, TypeSchema};
