//! Store en memoria: útil para tests y para el motor sin base de datos.
//!
//! No hay pushdown: los filtros (incluida la pertenencia al conjunto de
//! permisos de la cola) se evalúan en la aplicación recorriendo los vectores.
use std::collections::HashMap;
use std::convert::Infallible;

use serde_json::{Map, Value};

use super::types::EntityStore;
use crate::constants::PATH_SEPARATOR;
use crate::model::{BaseProcess, BaseRecord, BaseTask, Fetched, Links};
use crate::query::QuerySpec;

#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    pub processes: Vec<BaseProcess>,
    pub tasks: Vec<BaseTask>,
    /// tabla -> id base -> campos de la fila especializada.
    pub specializations: HashMap<String, HashMap<i64, Map<String, Value>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_process(&mut self, process: BaseProcess) {
        self.processes.push(process);
    }

    pub fn insert_task(&mut self, task: BaseTask) {
        self.tasks.push(task);
    }

    /// Fila de `table` cuyo puntero es `base_id`.
    pub fn insert_specialization(&mut self, table: &str, base_id: i64, fields: Map<String, Value>) {
        self.specializations
            .entry(table.to_string())
            .or_default()
            .insert(base_id, fields);
    }

    fn links_for(&self, base_id: i64, spec: &QuerySpec) -> Links {
        let mut links = Links::new();
        for path in &spec.prefetch {
            for (key, step) in path.prefixes() {
                let Some(fields) = self.specializations.get(&step.table).and_then(|rows| rows.get(&base_id)) else {
                    break;
                };
                let accessors: Vec<&str> = key.split(PATH_SEPARATOR).collect();
                links.attach(&accessors, fields.clone());
            }
        }
        links
    }

    fn process(&self, id: i64) -> Option<&BaseProcess> {
        self.processes.iter().find(|p| p.id == id)
    }
}

fn select<'a, R: BaseRecord>(rows: &'a [R], spec: &QuerySpec) -> Vec<&'a R> {
    let mut matched: Vec<&R> = rows.iter().filter(|r| spec.matches(*r)).collect();
    matched.sort_by(|a, b| spec.compare(*a, *b));
    let offset = usize::try_from(spec.offset).unwrap_or(usize::MAX);
    let limit = spec.limit
                    .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
                    .unwrap_or(usize::MAX);
    matched.into_iter().skip(offset).take(limit).collect()
}

impl EntityStore for InMemoryEntityStore {
    type Error = Infallible;

    fn fetch_processes(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseProcess>>, Self::Error> {
        Ok(select(&self.processes, spec).into_iter()
                                        .map(|p| Fetched { record: p.clone(),
                                                           links: self.links_for(p.id, spec) })
                                        .collect())
    }

    fn fetch_tasks(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseTask>>, Self::Error> {
        Ok(select(&self.tasks, spec).into_iter()
                                    .map(|t| {
                                        let mut record = t.clone();
                                        if spec.with_process {
                                            record.process = self.process(t.process_id).cloned();
                                        }
                                        Fetched { record,
                                                  links: self.links_for(t.id, spec) }
                                    })
                                    .collect())
    }

    fn count_processes(&self, spec: &QuerySpec) -> Result<u64, Self::Error> {
        Ok(self.processes.iter().filter(|p| spec.matches(*p)).count() as u64)
    }

    fn count_tasks(&self, spec: &QuerySpec) -> Result<u64, Self::Error> {
        Ok(self.tasks.iter().filter(|t| spec.matches(*t)).count() as u64)
    }
}
