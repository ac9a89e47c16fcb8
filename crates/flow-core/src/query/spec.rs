//! Descripción de una consulta independiente del almacenamiento.
//!
//! Cada `EntityStore` traduce un `QuerySpec` a su propio lenguaje (SQL en
//! Postgres, recorrido de vectores en memoria). La semántica de nulos es la de
//! SQL: comparar contra un valor ausente nunca coincide.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::BaseRecord;
use crate::schema::{EntityKind, SpecializationPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Id,
    FlowClass,
    Status,
    /// Sólo tareas.
    ProcessId,
    /// Sólo tareas.
    Owner,
    /// Sólo tareas.
    OwnerPermission,
    /// Sólo tareas.
    TaskKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    Eq(Field, FieldValue),
    In(Field, Vec<FieldValue>),
    IsNull(Field),
    /// Disyunción; vacía no coincide con nada.
    Any(Vec<Filter>),
    /// Conjunción; vacía coincide con todo.
    All(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: Field, value: impl Into<FieldValue>) -> Self {
        Filter::Eq(field, value.into())
    }

    /// Evaluación en la aplicación, usada por stores sin pushdown.
    pub fn matches<R: BaseRecord>(&self, record: &R) -> bool {
        match self {
            Filter::Eq(field, value) => record.field(*field).as_ref() == Some(value),
            Filter::In(field, values) => record.field(*field).is_some_and(|v| values.contains(&v)),
            Filter::IsNull(field) => record.field(*field).is_none(),
            Filter::Any(filters) => filters.iter().any(|f| f.matches(record)),
            Filter::All(filters) => filters.iter().all(|f| f.matches(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Created,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: SortField,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: SortField) -> Self {
        Self { field, descending: false }
    }

    pub fn desc(field: SortField) -> Self {
        Self { field, descending: true }
    }

    pub fn compare<R: BaseRecord>(&self, a: &R, b: &R) -> Ordering {
        let ord = match self.field {
            SortField::Created => a.created().cmp(&b.created()),
            SortField::Id => a.id().cmp(&b.id()),
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Consulta completa tal como la recibe el store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub kind: EntityKind,
    /// Se combinan con AND.
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub offset: u64,
    pub limit: Option<u64>,
    /// Rutas de especialización a precargar, sin duplicados.
    pub prefetch: Vec<SpecializationPath>,
    /// Cargar el proceso dueño junto a cada tarea.
    pub with_process: bool,
}

impl QuerySpec {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind,
               filters: Vec::new(),
               order: Vec::new(),
               offset: 0,
               limit: None,
               prefetch: Vec::new(),
               with_process: false }
    }

    pub fn matches<R: BaseRecord>(&self, record: &R) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Orden total: los criterios pedidos y, como desempate, el id.
    pub fn compare<R: BaseRecord>(&self, a: &R, b: &R) -> Ordering {
        self.order
            .iter()
            .map(|o| o.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.id().cmp(&b.id()))
    }
}
