//! flowqueue-rust
//!
//! Vistas de lectura sobre `flow-core`: listados de procesos, tareas propias
//! y cola abierta de un sitio (conjunto de flows), paginados y con la forma
//! especializada de cada flow.
//!
//! Funciona con cualquier `EntityStore`: el binario `flow-cli` usa Postgres
//! (`flow-persistence`), los tests el store en memoria.

pub mod errors;
pub mod read_model;

pub use errors::ReadModelError;
pub use read_model::{FlowSite, ProcessDetail, DEFAULT_ORPHANS, DEFAULT_PER_PAGE};
