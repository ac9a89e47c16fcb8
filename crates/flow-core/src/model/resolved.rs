//! Resultado de materializar una fila base con la forma de su flow.
//!
//! La forma se elige al construir el valor, a partir de los campos base ya
//! cargados y de la especialización precargada (si la hay). Nunca se vuelve a
//! leer la fila.
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::record::BaseRecord;
use crate::schema::{EntityTypeId, TypeSchema};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Resolved<R> {
    /// El flow usa el tipo base, o falta la fila especializada de esta instancia.
    Base { record: R },
    /// El flow declara un alias sin almacenamiento propio.
    Alias { entity_type: EntityTypeId, record: R },
    Specialized(Specialized<R>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Specialized<R> {
    /// Tipo declarado por el flow (puede ser un alias).
    pub entity_type: EntityTypeId,
    /// Tabla que realmente guarda los campos extra.
    pub storage_type: EntityTypeId,
    pub record: R,
    /// Campos de todas las filas de la ruta, fusionados.
    pub fields: Map<String, Value>,
}

impl<R: BaseRecord> Resolved<R> {
    pub fn record(&self) -> &R {
        match self {
            Resolved::Base { record } | Resolved::Alias { record, .. } => record,
            Resolved::Specialized(s) => &s.record,
        }
    }

    pub fn into_record(self) -> R {
        match self {
            Resolved::Base { record } | Resolved::Alias { record, .. } => record,
            Resolved::Specialized(s) => s.record,
        }
    }

    pub fn id(&self) -> i64 {
        self.record().id()
    }

    /// Tipo con el que se presenta la fila.
    pub fn entity_type(&self, schema: &TypeSchema) -> EntityTypeId {
        match self {
            Resolved::Base { .. } => schema.base(R::KIND),
            Resolved::Alias { entity_type, .. } => *entity_type,
            Resolved::Specialized(s) => s.entity_type,
        }
    }

    pub fn is_instance_of(&self, schema: &TypeSchema, ty: EntityTypeId) -> bool {
        schema.is_subtype_of(self.entity_type(schema), ty)
    }

    pub fn is_specialized(&self) -> bool {
        matches!(self, Resolved::Specialized(_))
    }

    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Resolved::Specialized(s) => Some(&s.fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields().and_then(|f| f.get(name))
    }

    /// Decodifica los campos propios del flow a su struct. `Ok(None)` si la
    /// fila no está especializada.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        match self.fields() {
            Some(fields) => serde_json::from_value(Value::Object(fields.clone())).map(Some),
            None => Ok(None),
        }
    }
}
