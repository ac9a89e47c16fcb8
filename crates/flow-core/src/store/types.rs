use crate::model::{BaseProcess, BaseTask, Fetched};
use crate::query::QuerySpec;

/// Lectura de filas base desde un almacenamiento.
///
/// Contrato:
/// - Aplicar todos los filtros de `spec`, luego el orden, luego offset/limit.
/// - Adjuntar en `Fetched::links` las filas de especialización de cada ruta de
///   `spec.prefetch` que existan para la fila (un accessor ausente = no existe).
/// - En tareas con `spec.with_process`, rellenar `BaseTask::process`.
/// - Los errores propios del almacenamiento se devuelven sin reintentos.
pub trait EntityStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_processes(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseProcess>>, Self::Error>;
    fn fetch_tasks(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseTask>>, Self::Error>;

    /// Filas que cumplen los filtros, sin offset/limit.
    fn count_processes(&self, spec: &QuerySpec) -> Result<u64, Self::Error>;
    fn count_tasks(&self, spec: &QuerySpec) -> Result<u64, Self::Error>;
}
