//! Filas leídas con `sql_query` y filas para inserción.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Jsonb, Nullable, Text, Timestamptz};
use serde_json::Value;

use flow_core::{ActorId, BaseProcess, BaseTask, Fetched, Links, TaskKind};

use crate::error::PersistenceError;
use crate::schema::{flow_process, flow_task};

#[derive(QueryableByName, Debug)]
pub struct ProcessRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub flow_class: String,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Timestamptz)]
    pub created: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub finished: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Jsonb>)]
    pub links: Option<Value>,
}

/// Tarea con las columnas del proceso dueño (`process_*`), nulas si no se
/// pidió precargarlo.
#[derive(QueryableByName, Debug)]
pub struct TaskRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub flow_class: String,
    #[diesel(sql_type = BigInt)]
    pub process_id: i64,
    #[diesel(sql_type = Text)]
    pub flow_task: String,
    #[diesel(sql_type = Text)]
    pub flow_task_type: String,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Timestamptz)]
    pub created: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub started: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub finished: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub owner_id: Option<i64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub owner_permission: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub process_flow_class: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub process_status: Option<String>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub process_created: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub process_finished: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Jsonb>)]
    pub links: Option<Value>,
}

#[derive(QueryableByName, Debug)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

fn links_from(value: Option<Value>) -> Links {
    match value {
        Some(Value::Object(map)) => Links::from_prefixed(map),
        _ => Links::new(),
    }
}

impl ProcessRow {
    pub fn into_fetched(self) -> Fetched<BaseProcess> {
        Fetched { record: BaseProcess { id: self.id,
                                        flow_class: self.flow_class,
                                        status: self.status,
                                        created: self.created,
                                        finished: self.finished },
                  links: links_from(self.links) }
    }
}

impl TaskRow {
    pub fn into_fetched(self) -> Result<Fetched<BaseTask>, PersistenceError> {
        let flow_task_type: TaskKind = self.flow_task_type
                                           .parse()
                                           .map_err(|e| PersistenceError::Decode(format!("task {}: {e}", self.id)))?;
        let process = match (self.process_flow_class, self.process_status, self.process_created) {
            (Some(flow_class), Some(status), Some(created)) => Some(BaseProcess { id: self.process_id,
                                                                                  flow_class,
                                                                                  status,
                                                                                  created,
                                                                                  finished: self.process_finished }),
            _ => None,
        };
        Ok(Fetched { record: BaseTask { id: self.id,
                                        flow_class: self.flow_class,
                                        process_id: self.process_id,
                                        flow_task: self.flow_task,
                                        flow_task_type,
                                        status: self.status,
                                        created: self.created,
                                        started: self.started,
                                        finished: self.finished,
                                        owner: self.owner_id.map(ActorId),
                                        owner_permission: self.owner_permission,
                                        process },
                     links: links_from(self.links) })
    }
}

/// Fila para insertar en `flow_process` (la escribe el motor de ejecución).
#[derive(Insertable, Debug)]
#[diesel(table_name = flow_process)]
pub struct NewProcessRow<'a> {
    pub flow_class: &'a str,
    pub status: &'a str,
    pub created: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
}

/// Fila para insertar en `flow_task`.
#[derive(Insertable, Debug)]
#[diesel(table_name = flow_task)]
pub struct NewTaskRow<'a> {
    pub flow_class: &'a str,
    pub process_id: i64,
    #[diesel(column_name = flow_task_name)]
    pub flow_task: &'a str,
    pub flow_task_type: &'a str,
    pub status: &'a str,
    pub created: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub owner_id: Option<i64>,
    pub owner_permission: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use diesel::pg::Pg;

    #[test]
    fn task_insert_writes_the_flow_task_column() {
        let row = NewTaskRow { flow_class: "x.Flow",
                               process_id: 1,
                               flow_task: "review",
                               flow_task_type: TaskKind::Human.as_str(),
                               status: "NEW",
                               created: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
                               started: None,
                               finished: None,
                               owner_id: None,
                               owner_permission: None };
        let query = diesel::insert_into(flow_task::table).values(&row)
                                                         .returning(flow_task::flow_task_name);
        let sql = diesel::debug_query::<Pg, _>(&query).to_string();
        assert!(sql.starts_with("INSERT INTO \"flow_task\" (\"flow_class\", \"process_id\", \"flow_task\", \
                                 \"flow_task_type\""),
                "{sql}");
        assert!(sql.contains("RETURNING \"flow_task\".\"flow_task\""), "{sql}");
    }
}
