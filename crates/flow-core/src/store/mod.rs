pub mod memory;
pub mod types;

pub use memory::InMemoryEntityStore;
pub use types::EntityStore;
