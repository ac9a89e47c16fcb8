//! Traducción de `QuerySpec` a una única sentencia SQL.
//!
//! Forma de la sentencia:
//! - tabla base con alias `p` (procesos) o `t` (tareas); en tareas con
//!   `with_process` se une `flow_process pp`.
//! - un `LEFT JOIN` por prefijo distinto de las rutas precargadas (`s0`, `s1`,
//!   ...), cada uno enlazado por la columna puntero del salto anterior.
//! - los enlaces vuelven en una sola columna `links`: un objeto JSON cuyas
//!   claves son los prefijos (`bprocess`, `bprocess.cprocess`) y cuyos valores
//!   son la fila sin su columna puntero, o `null` si no existe.
//! - filtros como `$n` con los valores en `binds`, en orden.
//!
//! Los nombres de tablas y columnas vienen del `TypeSchema`, que ya los validó
//! como identificadores.
use flow_core::constants::{PROCESS_TABLE, TASK_TABLE};
use flow_core::{EntityKind, Field, FieldValue, Filter, QuerySpec, SortField};

use crate::error::PersistenceError;

/// SQL con placeholders `$1..$n` y sus valores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    pub sql: String,
    pub binds: Vec<FieldValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Int,
    Text,
}

const PROCESS_COLUMNS: &str = "p.id, p.flow_class, p.status, p.created, p.finished";
const TASK_COLUMNS: &str = "t.id, t.flow_class, t.process_id, t.flow_task, t.flow_task_type, t.status, t.created, \
                            t.started, t.finished, t.owner_id, t.owner_permission";
const OWNER_PROCESS_COLUMNS: &str = "pp.flow_class AS process_flow_class, pp.status AS process_status, pp.created AS \
                                     process_created, pp.finished AS process_finished";
const NO_PROCESS_COLUMNS: &str = "NULL::text AS process_flow_class, NULL::text AS process_status, NULL::timestamptz \
                                  AS process_created, NULL::timestamptz AS process_finished";

fn base_alias(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Process => "p",
        EntityKind::Task => "t",
    }
}

fn base_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Process => PROCESS_TABLE,
        EntityKind::Task => TASK_TABLE,
    }
}

fn column(kind: EntityKind, field: Field) -> Result<(&'static str, ColumnType), PersistenceError> {
    let col = match (kind, field) {
        (_, Field::Id) => ("id", ColumnType::Int),
        (_, Field::FlowClass) => ("flow_class", ColumnType::Text),
        (_, Field::Status) => ("status", ColumnType::Text),
        (EntityKind::Task, Field::ProcessId) => ("process_id", ColumnType::Int),
        (EntityKind::Task, Field::Owner) => ("owner_id", ColumnType::Int),
        (EntityKind::Task, Field::OwnerPermission) => ("owner_permission", ColumnType::Text),
        (EntityKind::Task, Field::TaskKind) => ("flow_task_type", ColumnType::Text),
        (EntityKind::Process, other) => {
            return Err(PersistenceError::UnsupportedFilter(format!("{other:?} no existe en procesos")))
        }
    };
    Ok(col)
}

struct Builder {
    kind: EntityKind,
    binds: Vec<FieldValue>,
}

impl Builder {
    fn new(kind: EntityKind) -> Self {
        Self { kind,
               binds: Vec::new() }
    }

    fn bind(&mut self, value: FieldValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    fn bind_typed(&mut self, field: Field, expected: ColumnType, value: &FieldValue) -> Result<String, PersistenceError> {
        let actual = match value {
            FieldValue::Int(_) => ColumnType::Int,
            FieldValue::Text(_) => ColumnType::Text,
        };
        if actual != expected {
            return Err(PersistenceError::UnsupportedFilter(format!("{field:?} no admite {value:?}")));
        }
        Ok(self.bind(value.clone()))
    }

    fn filter(&mut self, filter: &Filter) -> Result<String, PersistenceError> {
        let alias = base_alias(self.kind);
        match filter {
            Filter::Eq(field, value) => {
                let (col, ty) = column(self.kind, *field)?;
                let placeholder = self.bind_typed(*field, ty, value)?;
                Ok(format!("{alias}.{col} = {placeholder}"))
            }
            Filter::In(field, values) => {
                let (col, ty) = column(self.kind, *field)?;
                if values.is_empty() {
                    return Ok("FALSE".into());
                }
                let placeholders = values.iter()
                                         .map(|v| self.bind_typed(*field, ty, v))
                                         .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{alias}.{col} IN ({})", placeholders.join(", ")))
            }
            Filter::IsNull(field) => {
                let (col, _) = column(self.kind, *field)?;
                Ok(format!("{alias}.{col} IS NULL"))
            }
            Filter::Any(filters) => self.group(filters, " OR ", "FALSE"),
            Filter::All(filters) => self.group(filters, " AND ", "TRUE"),
        }
    }

    fn group(&mut self, filters: &[Filter], op: &str, empty: &str) -> Result<String, PersistenceError> {
        if filters.is_empty() {
            return Ok(empty.into());
        }
        let parts = filters.iter()
                           .map(|f| self.filter(f))
                           .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("({})", parts.join(op)))
    }

    fn where_clause(&mut self, spec: &QuerySpec) -> Result<String, PersistenceError> {
        if spec.filters.is_empty() {
            return Ok(String::new());
        }
        let parts = spec.filters
                        .iter()
                        .map(|f| self.filter(f))
                        .collect::<Result<Vec<_>, _>>()?;
        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }

    fn page_clause(&mut self, spec: &QuerySpec) -> String {
        let mut out = String::new();
        if let Some(limit) = spec.limit {
            let placeholder = self.bind(FieldValue::Int(i64::try_from(limit).unwrap_or(i64::MAX)));
            out.push_str(&format!(" LIMIT {placeholder}"));
        }
        if spec.offset > 0 {
            let placeholder = self.bind(FieldValue::Int(i64::try_from(spec.offset).unwrap_or(i64::MAX)));
            out.push_str(&format!(" OFFSET {placeholder}"));
        }
        out
    }
}

fn order_clause(spec: &QuerySpec) -> String {
    let alias = base_alias(spec.kind);
    let mut terms: Vec<String> = spec.order
                                     .iter()
                                     .map(|o| {
                                         let col = match o.field {
                                             SortField::Created => "created",
                                             SortField::Id => "id",
                                         };
                                         let dir = if o.descending { "DESC" } else { "ASC" };
                                         format!("{alias}.{col} {dir}")
                                     })
                                     .collect();
    terms.push(format!("{alias}.id ASC"));
    format!(" ORDER BY {}", terms.join(", "))
}

/// `LEFT JOIN`s de las rutas precargadas y la expresión de la columna `links`.
fn prefetch_joins(spec: &QuerySpec) -> (String, String) {
    let alias = base_alias(spec.kind);
    let mut seen: Vec<String> = Vec::new();
    let mut joins = String::new();
    let mut entries = Vec::new();
    for path in &spec.prefetch {
        let mut parent = format!("{alias}.id");
        for (key, step) in path.prefixes() {
            let join_alias = match seen.iter().position(|k| *k == key) {
                Some(i) => format!("s{i}"),
                None => {
                    let join_alias = format!("s{}", seen.len());
                    joins.push_str(&format!(" LEFT JOIN {} {join_alias} ON {join_alias}.{} = {parent}",
                                            step.table, step.column));
                    entries.push(format!("'{key}', CASE WHEN {join_alias}.{col} IS NULL THEN NULL ELSE \
                                          to_jsonb({join_alias}) - '{col}' END",
                                         col = step.column));
                    seen.push(key);
                    join_alias
                }
            };
            parent = format!("{join_alias}.{}", step.column);
        }
    }
    let links = if entries.is_empty() {
        "NULL::jsonb".to_string()
    } else {
        format!("jsonb_build_object({})", entries.join(", "))
    };
    (joins, links)
}

/// `SELECT` completo para `fetch_processes` / `fetch_tasks`.
pub fn select(spec: &QuerySpec) -> Result<SqlFragment, PersistenceError> {
    let mut builder = Builder::new(spec.kind);
    let alias = base_alias(spec.kind);
    let (joins, links) = prefetch_joins(spec);
    let mut sql = match spec.kind {
        EntityKind::Process => format!("SELECT {PROCESS_COLUMNS}, {links} AS links FROM {PROCESS_TABLE} {alias}"),
        EntityKind::Task if spec.with_process => {
            format!("SELECT {TASK_COLUMNS}, {OWNER_PROCESS_COLUMNS}, {links} AS links FROM {TASK_TABLE} {alias} JOIN \
                     {PROCESS_TABLE} pp ON pp.id = {alias}.process_id")
        }
        EntityKind::Task => {
            format!("SELECT {TASK_COLUMNS}, {NO_PROCESS_COLUMNS}, {links} AS links FROM {TASK_TABLE} {alias}")
        }
    };
    sql.push_str(&joins);
    sql.push_str(&builder.where_clause(spec)?);
    sql.push_str(&order_clause(spec));
    sql.push_str(&builder.page_clause(spec));
    Ok(SqlFragment { sql,
                     binds: builder.binds })
}

/// `SELECT COUNT(*)` con los mismos filtros, sin joins ni paginación.
pub fn count(spec: &QuerySpec) -> Result<SqlFragment, PersistenceError> {
    let mut builder = Builder::new(spec.kind);
    let mut sql = format!("SELECT COUNT(*) AS count FROM {} {}", base_table(spec.kind), base_alias(spec.kind));
    sql.push_str(&builder.where_clause(spec)?);
    Ok(SqlFragment { sql,
                     binds: builder.binds })
}
