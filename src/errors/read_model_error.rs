use flow_core::QueryError;
use thiserror::Error;

/// Error de una vista: consulta mal formada o fallo del store `E`.
#[derive(Debug, Error)]
pub enum ReadModelError<E> {
    #[error("Consulta inválida: {0}")]
    Query(#[from] QueryError),
    #[error("Error de almacenamiento: {0}")]
    Storage(#[source] E),
}
