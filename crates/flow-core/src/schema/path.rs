//! Rutas de especialización: de la fila base a la fila que guarda los campos
//! propios del flow.
use std::fmt;

use serde_json::{Map, Value};

use super::types::{EntityTypeId, Storage, TypeSchema};
use crate::constants::PATH_SEPARATOR;
use crate::errors::RegistryError;
use crate::model::{LinkedRow, Links};

/// Un salto de la ruta: el tipo alcanzado y cómo se enlaza con su padre.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub accessor: String,
    pub entity_type: EntityTypeId,
    pub table: String,
    pub column: String,
}

/// Secuencia ordenada de saltos desde la fila base. Vacía si el flow usa el
/// registro base tal cual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpecializationPath {
    steps: Vec<PathStep>,
}

impl SpecializationPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn accessors(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.accessor.as_str())
    }

    /// Tipo con almacenamiento al final de la ruta.
    pub fn concrete_type(&self) -> Option<EntityTypeId> {
        self.steps.last().map(|s| s.entity_type)
    }

    /// Clave de cada prefijo (`a`, `a.b`, ...) junto al salto que lo cierra.
    pub fn prefixes(&self) -> impl Iterator<Item = (String, &PathStep)> {
        let mut key = String::new();
        self.steps.iter().map(move |step| {
                             if !key.is_empty() {
                                 key.push(PATH_SEPARATOR);
                             }
                             key.push_str(&step.accessor);
                             (key.clone(), step)
                         })
    }
}

impl fmt::Display for SpecializationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(&step.accessor)?;
        }
        Ok(())
    }
}

/// Calcula la ruta desde `base` hasta la tabla de `specialized`.
///
/// Salta capas de alias, luego sube por los enlaces "es-un" hasta llegar a
/// `base`. Si la cadena nunca llega a `base` el flow está mal declarado:
/// `RegistryError::SchemaMismatch`.
pub fn resolve_path(schema: &TypeSchema,
                    specialized: EntityTypeId,
                    base: EntityTypeId)
                    -> Result<SpecializationPath, RegistryError> {
    let concrete = schema.concrete(specialized)?;
    if concrete == base {
        return Ok(SpecializationPath::empty());
    }
    let mismatch = || RegistryError::SchemaMismatch { specialized: schema.name(specialized).to_string(),
                                                      base: schema.name(base).to_string() };
    let mut steps = Vec::new();
    let mut current = concrete;
    loop {
        let def = schema.get(current).ok_or_else(|| RegistryError::UnknownType(format!("#{}", current.index())))?;
        match &def.storage {
            Storage::Table { table, parent: Some(link) } => {
                steps.push(PathStep { accessor: link.accessor.clone(),
                                      entity_type: current,
                                      table: table.clone(),
                                      column: link.column.clone() });
                if link.parent == base {
                    break;
                }
                current = link.parent;
            }
            _ => return Err(mismatch()),
        }
    }
    steps.reverse();
    Ok(SpecializationPath { steps })
}

/// Sigue la ruta sobre los enlaces precargados de una fila.
///
/// Devuelve `None` si falta cualquier salto (la fila especializada no existe
/// para esta instancia); el llamador conserva entonces la fila base.
pub fn follow_path<'a>(links: &'a Links, path: &SpecializationPath) -> Option<&'a LinkedRow> {
    let mut current: Option<&LinkedRow> = None;
    let mut level = links;
    for accessor in path.accessors() {
        let row = level.get(accessor)?;
        level = &row.links;
        current = Some(row);
    }
    current
}

/// Variante con propiedad de `follow_path`: fusiona los campos de todas las
/// filas de la ruta (los tipos intermedios primero, el más específico gana).
pub(crate) fn take_path(mut links: Links, path: &SpecializationPath) -> Option<Map<String, Value>> {
    let mut fields = Map::new();
    let mut found = false;
    for accessor in path.accessors() {
        let row = links.remove(accessor)?;
        fields.extend(row.fields);
        links = row.links;
        found = true;
    }
    found.then_some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityKind;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    fn nested_schema() -> (TypeSchema, EntityTypeId, EntityTypeId) {
        let mut schema = TypeSchema::new();
        let base = schema.base(EntityKind::Process);
        let mid = schema.extend("MidProcess", "mid_process", base, "midprocess", "process_ptr_id").unwrap();
        let leaf = schema.extend("LeafProcess", "leaf_process", mid, "leafprocess", "midprocess_ptr_id").unwrap();
        let alias = schema.alias("LeafProxy", leaf).unwrap();
        (schema, leaf, alias)
    }

    #[test]
    fn base_type_has_empty_path() {
        let schema = TypeSchema::new();
        let base = schema.base(EntityKind::Task);
        assert!(resolve_path(&schema, base, base).unwrap().is_empty());
    }

    #[test]
    fn alias_of_base_has_empty_path() {
        let mut schema = TypeSchema::new();
        let base = schema.base(EntityKind::Task);
        let alias = schema.alias("TaskProxy", base).unwrap();
        assert!(resolve_path(&schema, alias, base).unwrap().is_empty());
    }

    #[test]
    fn nested_chain_is_ordered_from_base() {
        let (schema, leaf, alias) = nested_schema();
        let base = schema.base(EntityKind::Process);
        let path = resolve_path(&schema, leaf, base).unwrap();
        assert_eq!(path.accessors().collect::<Vec<_>>(), vec!["midprocess", "leafprocess"]);
        assert_eq!(path.to_string(), "midprocess.leafprocess");
        assert_eq!(path.concrete_type(), Some(leaf));
        assert_eq!(resolve_path(&schema, alias, base).unwrap(), path);
        let keys: Vec<String> = path.prefixes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["midprocess".to_string(), "midprocess.leafprocess".to_string()]);
    }

    #[test]
    fn unrelated_base_is_schema_mismatch() {
        let (schema, leaf, _) = nested_schema();
        let err = resolve_path(&schema, leaf, schema.base(EntityKind::Task)).unwrap_err();
        assert_eq!(err,
                   RegistryError::SchemaMismatch { specialized: "LeafProcess".into(),
                                                   base: "Task".into() });
    }

    #[test]
    fn follow_path_returns_deepest_row_or_none() {
        let (schema, leaf, _) = nested_schema();
        let path = resolve_path(&schema, leaf, schema.base(EntityKind::Process)).unwrap();

        let mut links = Links::new();
        links.attach(&["midprocess"], fields(json!({"mid": 1})));
        assert!(follow_path(&links, &path).is_none());

        links.attach(&["midprocess", "leafprocess"], fields(json!({"leaf": 2})));
        let row = follow_path(&links, &path).expect("leaf row");
        assert_eq!(row.fields.get("leaf"), Some(&json!(2)));

        let merged = take_path(links, &path).expect("merged");
        assert_eq!(merged.get("mid"), Some(&json!(1)));
        assert_eq!(merged.get("leaf"), Some(&json!(2)));
    }

    #[test]
    fn take_path_on_empty_links_is_none() {
        let (schema, leaf, _) = nested_schema();
        let path = resolve_path(&schema, leaf, schema.base(EntityKind::Process)).unwrap();
        assert!(take_path(Links::new(), &path).is_none());
    }
}
