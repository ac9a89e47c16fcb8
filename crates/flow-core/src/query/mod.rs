pub mod page;
pub mod polymorphic;
pub mod spec;
pub mod task;

pub use page::Page;
pub use polymorphic::{Materialize, PolymorphicQuery, ProcessQuery, TaskQuery};
pub use spec::{Field, FieldValue, Filter, OrderBy, QuerySpec, SortField};
pub use task::queue_predicate;
