//! Registro de flows.
//!
//! Al registrar un flow se calculan sus dos rutas de especialización (proceso
//! y tarea) y se guardan en una arena indexada por `FlowClassId`. Una vez
//! construido, el `FlowRegistry` es inmutable y se comparte por referencia.
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;
use crate::model::{BaseRecord, Fetched, Resolved, Specialized};
use crate::schema::{resolve_path, take_path, EntityKind, EntityTypeId, SpecializationPath, TypeSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowClassId(usize);

impl FlowClassId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Flow registrado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowClass {
    pub id: FlowClassId,
    /// Referencia guardada en las filas base (`flow_class`).
    pub name: String,
    /// Etiqueta de presentación; el core no la usa.
    pub namespace: String,
    pub process_type: EntityTypeId,
    pub task_type: EntityTypeId,
}

impl FlowClass {
    pub fn entity_type(&self, kind: EntityKind) -> EntityTypeId {
        match kind {
            EntityKind::Process => self.process_type,
            EntityKind::Task => self.task_type,
        }
    }
}

/// Declaración de un flow a registrar.
#[derive(Debug, Clone)]
pub struct FlowClassDef {
    pub name: String,
    pub namespace: String,
    pub process_type: EntityTypeId,
    pub task_type: EntityTypeId,
}

impl FlowClassDef {
    pub fn new(name: impl Into<String>, process_type: EntityTypeId, task_type: EntityTypeId) -> Self {
        let name = name.into();
        Self { namespace: name.clone(),
               name,
               process_type,
               task_type }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

#[derive(Debug, Clone)]
struct FlowPaths {
    process: SpecializationPath,
    task: SpecializationPath,
}

#[derive(Debug, Clone)]
pub struct FlowRegistryBuilder {
    schema: TypeSchema,
    flows: Vec<FlowClass>,
    by_name: IndexMap<String, FlowClassId>,
    paths: Vec<FlowPaths>,
}

impl FlowRegistryBuilder {
    pub fn new(schema: TypeSchema) -> Self {
        Self { schema,
               flows: Vec::new(),
               by_name: IndexMap::new(),
               paths: Vec::new() }
    }

    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    /// Registra un flow. Falla si el nombre ya existe o si alguno de sus tipos
    /// no deriva del tipo base correspondiente; en ese caso el registro no
    /// cambia.
    pub fn register(&mut self, def: FlowClassDef) -> Result<FlowClassId, RegistryError> {
        if self.by_name.contains_key(&def.name) {
            return Err(RegistryError::DuplicateFlowClass(def.name));
        }
        let process = resolve_path(&self.schema, def.process_type, self.schema.base(EntityKind::Process))?;
        let task = resolve_path(&self.schema, def.task_type, self.schema.base(EntityKind::Task))?;
        let id = FlowClassId(self.flows.len());
        debug!("register flow={} process_path='{}' task_path='{}'", def.name, process, task);
        self.flows.push(FlowClass { id,
                                    name: def.name.clone(),
                                    namespace: def.namespace,
                                    process_type: def.process_type,
                                    task_type: def.task_type });
        self.by_name.insert(def.name, id);
        self.paths.push(FlowPaths { process, task });
        Ok(id)
    }

    pub fn build(self) -> FlowRegistry {
        FlowRegistry { schema: self.schema,
                       flows: self.flows,
                       by_name: self.by_name,
                       paths: self.paths }
    }
}

#[derive(Debug, Clone)]
pub struct FlowRegistry {
    schema: TypeSchema,
    flows: Vec<FlowClass>,
    by_name: IndexMap<String, FlowClassId>,
    paths: Vec<FlowPaths>,
}

impl FlowRegistry {
    pub fn builder(schema: TypeSchema) -> FlowRegistryBuilder {
        FlowRegistryBuilder::new(schema)
    }

    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    pub fn get(&self, id: FlowClassId) -> Option<&FlowClass> {
        self.flows.get(id.0)
    }

    pub fn lookup(&self, name: &str) -> Option<&FlowClass> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    /// Flows en orden de registro.
    pub fn flow_classes(&self) -> impl Iterator<Item = &FlowClass> {
        self.flows.iter()
    }

    pub fn ids(&self) -> Vec<FlowClassId> {
        self.flows.iter().map(|f| f.id).collect()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn path(&self, id: FlowClassId, kind: EntityKind) -> Option<&SpecializationPath> {
        self.paths.get(id.0).map(|p| match kind {
                                EntityKind::Process => &p.process,
                                EntityKind::Task => &p.task,
                            })
    }

    /// Presenta una fila con la forma declarada por su flow.
    ///
    /// - Flow no registrado: `None` (la fila se descarta).
    /// - Ruta vacía: `Base`, o `Alias` si el flow declara un alias del tipo base.
    /// - Ruta con fila precargada: `Specialized`, conservando el registro base.
    /// - Ruta sin fila para esta instancia: `Base`.
    pub fn materialize<R: BaseRecord>(&self, fetched: Fetched<R>) -> Option<Resolved<R>> {
        let Some(flow) = self.lookup(fetched.record.flow_class()) else {
            warn!("dropping {:?} #{}: flow class '{}' is not registered",
                  R::KIND,
                  fetched.record.id(),
                  fetched.record.flow_class());
            return None;
        };
        let declared = flow.entity_type(R::KIND);
        let path = self.path(flow.id, R::KIND)?;
        let Fetched { record, links } = fetched;
        if path.is_empty() {
            if declared == self.schema.base(R::KIND) {
                return Some(Resolved::Base { record });
            }
            return Some(Resolved::Alias { entity_type: declared,
                                          record });
        }
        match (take_path(links, path), path.concrete_type()) {
            (Some(fields), Some(storage_type)) => Some(Resolved::Specialized(Specialized { entity_type: declared,
                                                                                           storage_type,
                                                                                           record,
                                                                                           fields })),
            _ => Some(Resolved::Base { record }),
        }
    }
}
