//! Vistas de un sitio: un conjunto de flows publicados juntos.
//!
//! Todas las listas son polimórficas (cada fila sale con la forma de su flow),
//! ordenadas por fecha de creación descendente y paginadas.
use log::debug;
use serde::Serialize;

use flow_core::{Actor, BaseProcess, BaseTask, EntityStore, FlowClassId, FlowRegistry, Page, ProcessQuery, Resolved,
                TaskQuery};

use crate::errors::ReadModelError;

pub const DEFAULT_PER_PAGE: u64 = 15;
/// Filas que, quedando solas en la última página, se unen a la anterior.
pub const DEFAULT_ORPHANS: u64 = 5;

/// Proceso especializado con sus tareas en orden de creación.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDetail {
    pub process: Resolved<BaseProcess>,
    pub tasks: Vec<Resolved<BaseTask>>,
}

#[derive(Debug, Clone)]
pub struct FlowSite<'r> {
    registry: &'r FlowRegistry,
    flows: Vec<FlowClassId>,
    per_page: u64,
    orphans: u64,
}

impl<'r> FlowSite<'r> {
    /// Sitio con todos los flows del registro.
    pub fn new(registry: &'r FlowRegistry) -> Self {
        Self::with_flows(registry, registry.ids())
    }

    pub fn with_flows(registry: &'r FlowRegistry, flows: Vec<FlowClassId>) -> Self {
        Self { registry,
               flows,
               per_page: DEFAULT_PER_PAGE,
               orphans: DEFAULT_ORPHANS }
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn orphans(mut self, orphans: u64) -> Self {
        self.orphans = orphans;
        self
    }

    pub fn flows(&self) -> &[FlowClassId] {
        &self.flows
    }

    fn processes(&self, flows: &[FlowClassId]) -> Result<ProcessQuery<'r>, flow_core::QueryError> {
        Ok(ProcessQuery::new(self.registry).for_flow_classes(flows.iter().copied())?
                                           .order_by_created_desc())
    }

    fn tasks(&self, flows: &[FlowClassId]) -> Result<TaskQuery<'r>, flow_core::QueryError> {
        Ok(TaskQuery::new(self.registry).for_flow_classes(flows.iter().copied())?
                                        .order_by_created_desc())
    }

    /// Procesos de todos los flows del sitio.
    pub fn all_processes<S>(&self,
                            store: &S,
                            page: u64)
                            -> Result<Page<Resolved<BaseProcess>>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        self.processes(&self.flows)?
            .fetch_page_with_orphans(store, page, self.per_page, self.orphans)
            .map_err(ReadModelError::Storage)
    }

    /// Tareas ya asignadas a `actor`.
    pub fn all_tasks<S>(&self,
                        store: &S,
                        actor: &Actor,
                        page: u64)
                        -> Result<Page<Resolved<BaseTask>>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        self.tasks(&self.flows)?
            .assigned_to(actor)
            .fetch_page_with_orphans(store, page, self.per_page, self.orphans)
            .map_err(ReadModelError::Storage)
    }

    /// Tareas sin reclamar que `actor` puede ver.
    pub fn all_queue<S>(&self,
                        store: &S,
                        actor: &Actor,
                        page: u64)
                        -> Result<Page<Resolved<BaseTask>>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        debug!("all_queue actor={} flows={}", actor.id, self.flows.len());
        self.tasks(&self.flows)?
            .visible_queue(actor, None)
            .unclaimed()
            .fetch_page_with_orphans(store, page, self.per_page, self.orphans)
            .map_err(ReadModelError::Storage)
    }

    pub fn flow_processes<S>(&self,
                             store: &S,
                             flow: FlowClassId,
                             page: u64)
                             -> Result<Page<Resolved<BaseProcess>>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        self.processes(&[flow])?
            .fetch_page_with_orphans(store, page, self.per_page, self.orphans)
            .map_err(ReadModelError::Storage)
    }

    pub fn flow_tasks<S>(&self,
                         store: &S,
                         flow: FlowClassId,
                         actor: &Actor,
                         page: u64)
                         -> Result<Page<Resolved<BaseTask>>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        self.tasks(&[flow])?
            .assigned_to(actor)
            .fetch_page_with_orphans(store, page, self.per_page, self.orphans)
            .map_err(ReadModelError::Storage)
    }

    pub fn flow_queue<S>(&self,
                         store: &S,
                         flow: FlowClassId,
                         actor: &Actor,
                         page: u64)
                         -> Result<Page<Resolved<BaseTask>>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        self.tasks(&[flow])?
            .visible_queue(actor, None)
            .unclaimed()
            .fetch_page_with_orphans(store, page, self.per_page, self.orphans)
            .map_err(ReadModelError::Storage)
    }

    /// Proceso `process_id` de `flow` y sus tareas. `None` si no existe o es
    /// de otro flow.
    pub fn process_detail<S>(&self,
                             store: &S,
                             flow: FlowClassId,
                             process_id: i64)
                             -> Result<Option<ProcessDetail>, ReadModelError<S::Error>>
        where S: EntityStore + ?Sized
    {
        let process = ProcessQuery::new(self.registry).for_flow_classes([flow])?
                                                      .filter_id(process_id)
                                                      .limit(1)
                                                      .fetch(store)
                                                      .map_err(ReadModelError::Storage)?
                                                      .next();
        let Some(process) = process else {
            debug!("process_detail: #{process_id} no encontrado");
            return Ok(None);
        };
        let tasks = TaskQuery::new(self.registry).for_flow_classes([flow])?
                                                 .filter_process(process_id)
                                                 .order_by_created_asc()
                                                 .fetch(store)
                                                 .map_err(ReadModelError::Storage)?
                                                 .collect();
        Ok(Some(ProcessDetail { process, tasks }))
    }
}
