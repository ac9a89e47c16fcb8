//! Errores del core.
//!
//! `RegistryError` sólo aparece al registrar flows (errores de programación en
//! la declaración); `QueryError` al construir una consulta. Los errores del
//! almacenamiento viajan como `EntityStore::Error` sin envolver.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RegistryError {
    #[error("schema mismatch: '{specialized}' is not derived from '{base}'")]
    SchemaMismatch { specialized: String, base: String },
    #[error("unknown entity type: {0}")] UnknownType(String),
    #[error("entity type already registered: {0}")] DuplicateType(String),
    #[error("flow class already registered: {0}")] DuplicateFlowClass(String),
    #[error("invalid identifier: '{0}'")] InvalidIdentifier(String),
    /// Dos tablas hijas del mismo padre no pueden compartir accessor: los
    /// enlaces precargados se indexan por él.
    #[error("accessor '{accessor}' already used under '{parent}'")]
    AccessorClash { parent: String, accessor: String },
    #[error("invalid manifest: {0}")] Manifest(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum QueryError {
    #[error("polymorphic query needs at least one flow class")] EmptyFlowClasses,
    #[error("flow class id {0} is not registered")] UnknownFlowClass(usize),
}

/// Etiqueta de tipo de tarea desconocida al decodificar una fila.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("unknown task type: {0}")]
pub struct UnknownTaskKind(pub String);
