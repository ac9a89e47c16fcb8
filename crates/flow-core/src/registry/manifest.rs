//! Manifiesto JSON de registro: tipos de entidad y flows.
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "ShipmentProcess", "extends": "Process", "table": "shipment_process",
//!       "accessor": "shipmentprocess", "column": "process_ptr_id" },
//!     { "name": "ShipmentView", "alias_of": "ShipmentProcess" }
//!   ],
//!   "flows": [
//!     { "name": "shipment.flows.ShipmentFlow", "namespace": "shipment",
//!       "process": "ShipmentView", "task": "Task" }
//!   ]
//! }
//! ```
//!
//! Los tipos se declaran padres primero.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{FlowClassDef, FlowRegistry};
use crate::errors::RegistryError;
use crate::schema::{EntityTypeId, TypeSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeEntry {
    Table {
        name: String,
        extends: String,
        table: String,
        accessor: String,
        column: String,
    },
    Alias {
        name: String,
        alias_of: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEntry {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub process: String,
    pub task: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub flows: Vec<FlowEntry>,
}

impl RegistryManifest {
    pub fn from_json_str(s: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(s).map_err(|e| RegistryError::Manifest(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| RegistryError::Manifest(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Construye el esquema y registra los flows. Cualquier error aborta el
    /// registro completo.
    pub fn into_registry(self) -> Result<FlowRegistry, RegistryError> {
        let mut schema = TypeSchema::new();
        for entry in &self.types {
            match entry {
                TypeEntry::Table { name,
                                   extends,
                                   table,
                                   accessor,
                                   column, } => {
                    let parent = lookup(&schema, extends)?;
                    schema.extend(name, table, parent, accessor, column)?;
                }
                TypeEntry::Alias { name, alias_of } => {
                    let target = lookup(&schema, alias_of)?;
                    schema.alias(name, target)?;
                }
            }
        }
        let mut builder = FlowRegistry::builder(schema);
        for flow in self.flows {
            let process = lookup(builder.schema(), &flow.process)?;
            let task = lookup(builder.schema(), &flow.task)?;
            let mut def = FlowClassDef::new(flow.name, process, task);
            if let Some(ns) = flow.namespace {
                def = def.namespace(ns);
            }
            builder.register(def)?;
        }
        Ok(builder.build())
    }
}

fn lookup(schema: &TypeSchema, name: &str) -> Result<EntityTypeId, RegistryError> {
    schema.lookup(name).ok_or_else(|| RegistryError::UnknownType(name.to_string()))
}
