//! Modelos de datos del core: registros base, actor y resultados.
pub mod actor;
pub mod fetched;
pub mod record;
pub mod resolved;

pub use actor::{Actor, ActorId, PermissionSet};
pub use fetched::{Fetched, LinkedRow, Links};
pub use record::{BaseProcess, BaseRecord, BaseTask, TaskKind};
pub use resolved::{Resolved, Specialized};
