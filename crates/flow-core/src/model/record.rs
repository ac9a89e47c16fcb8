//! Registros base: una fila por proceso/tarea sin importar el flow.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actor::ActorId;
use crate::errors::UnknownTaskKind;
use crate::query::{Field, FieldValue, QuerySpec};
use crate::schema::EntityKind;
use crate::store::EntityStore;
use crate::model::Fetched;

/// Contrato común de las filas base (`BaseProcess`, `BaseTask`).
///
/// `fetch`/`count` despachan al método del store que corresponde al tipo de
/// entidad; así la consulta polimórfica es genérica sobre el registro.
pub trait BaseRecord: Clone + fmt::Debug + Sized {
    const KIND: EntityKind;

    fn id(&self) -> i64;
    fn flow_class(&self) -> &str;
    fn status(&self) -> &str;
    fn created(&self) -> DateTime<Utc>;

    /// Valor de un campo filtrable; `None` si es nulo o no aplica a la entidad.
    fn field(&self, field: Field) -> Option<FieldValue>;

    fn fetch<S: EntityStore + ?Sized>(store: &S, spec: &QuerySpec) -> Result<Vec<Fetched<Self>>, S::Error>;
    fn count<S: EntityStore + ?Sized>(store: &S, spec: &QuerySpec) -> Result<u64, S::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseProcess {
    pub id: i64,
    pub flow_class: String,
    pub status: String,
    pub created: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
}

impl BaseRecord for BaseProcess {
    const KIND: EntityKind = EntityKind::Process;

    fn id(&self) -> i64 {
        self.id
    }
    fn flow_class(&self) -> &str {
        &self.flow_class
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(FieldValue::Int(self.id)),
            Field::FlowClass => Some(FieldValue::Text(self.flow_class.clone())),
            Field::Status => Some(FieldValue::Text(self.status.clone())),
            Field::ProcessId | Field::Owner | Field::OwnerPermission | Field::TaskKind => None,
        }
    }

    fn fetch<S: EntityStore + ?Sized>(store: &S, spec: &QuerySpec) -> Result<Vec<Fetched<Self>>, S::Error> {
        store.fetch_processes(spec)
    }

    fn count<S: EntityStore + ?Sized>(store: &S, spec: &QuerySpec) -> Result<u64, S::Error> {
        store.count_processes(spec)
    }
}

/// Tipo de nodo que generó la tarea. Sólo `Human` entra en colas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskKind {
    Human,
    Start,
    Job,
    Gate,
    End,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Human => "HUMAN",
            TaskKind::Start => "START",
            TaskKind::Job => "JOB",
            TaskKind::Gate => "GATE",
            TaskKind::End => "END",
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, TaskKind::Human)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HUMAN" => Ok(TaskKind::Human),
            "START" => Ok(TaskKind::Start),
            "JOB" => Ok(TaskKind::Job),
            "GATE" => Ok(TaskKind::Gate),
            "END" => Ok(TaskKind::End),
            other => Err(UnknownTaskKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTask {
    pub id: i64,
    pub flow_class: String,
    pub process_id: i64,
    /// Nombre del nodo del flow que creó la tarea.
    pub flow_task: String,
    pub flow_task_type: TaskKind,
    pub status: String,
    pub created: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub owner: Option<ActorId>,
    pub owner_permission: Option<String>,
    /// Proceso dueño; sólo presente si la consulta lo precargó.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<BaseProcess>,
}

impl BaseRecord for BaseTask {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> i64 {
        self.id
    }
    fn flow_class(&self) -> &str {
        &self.flow_class
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(FieldValue::Int(self.id)),
            Field::FlowClass => Some(FieldValue::Text(self.flow_class.clone())),
            Field::Status => Some(FieldValue::Text(self.status.clone())),
            Field::ProcessId => Some(FieldValue::Int(self.process_id)),
            Field::Owner => self.owner.map(|o| FieldValue::Int(o.0)),
            Field::OwnerPermission => self.owner_permission.clone().map(FieldValue::Text),
            Field::TaskKind => Some(FieldValue::Text(self.flow_task_type.as_str().to_string())),
        }
    }

    fn fetch<S: EntityStore + ?Sized>(store: &S, spec: &QuerySpec) -> Result<Vec<Fetched<Self>>, S::Error> {
        store.fetch_tasks(spec)
    }

    fn count<S: EntityStore + ?Sized>(store: &S, spec: &QuerySpec) -> Result<u64, S::Error> {
        store.count_tasks(spec)
    }
}
