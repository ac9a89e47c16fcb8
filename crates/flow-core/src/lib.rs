//! flow-core: resolución polimórfica de procesos/tareas y cola autorizada.
//!
//! El crate no escribe nada: recibe filas base ya persistidas por el motor de
//! ejecución y las presenta con la forma especializada de su flow.
pub mod constants;
pub mod errors;
pub mod model;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;

pub use errors::{QueryError, RegistryError, UnknownTaskKind};
pub use model::{Actor, ActorId, BaseProcess, BaseRecord, BaseTask, Fetched, LinkedRow, Links, PermissionSet, Resolved,
                Specialized, TaskKind};
pub use query::{Field, FieldValue, Filter, OrderBy, Page, PolymorphicQuery, ProcessQuery, QuerySpec, SortField, TaskQuery};
pub use registry::{FlowClass, FlowClassDef, FlowClassId, FlowRegistry, FlowRegistryBuilder, RegistryManifest};
pub use schema::{follow_path, resolve_path, EntityKind, EntityTypeId, PathStep, SpecializationPath, TypeSchema};
pub use store::{EntityStore, InMemoryEntityStore};
