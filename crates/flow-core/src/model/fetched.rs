//! Filas tal como las entrega un `EntityStore`: registro base más las filas de
//! especialización precargadas a lo largo de las rutas pedidas.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::PATH_SEPARATOR;

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<R> {
    pub record: R,
    pub links: Links,
}

impl<R> Fetched<R> {
    pub fn bare(record: R) -> Self {
        Self { record,
               links: Links::new() }
    }
}

/// Fila de una tabla de especialización y sus propios enlaces hacia abajo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedRow {
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

/// accessor -> fila enlazada. Un accessor ausente significa que la fila no
/// existe para esta instancia (o que no se pidió precargarla).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, LinkedRow>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, accessor: &str) -> Option<&LinkedRow> {
        self.0.get(accessor)
    }

    pub fn remove(&mut self, accessor: &str) -> Option<LinkedRow> {
        self.0.remove(accessor)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Inserta `fields` al final de `accessors`. Los saltos previos deben
    /// existir; si falta alguno no se inserta nada y devuelve `false`.
    pub fn attach(&mut self, accessors: &[&str], fields: Map<String, Value>) -> bool {
        let Some((last, parents)) = accessors.split_last() else {
            return false;
        };
        let mut level = self;
        for accessor in parents {
            match level.0.get_mut(*accessor) {
                Some(row) => level = &mut row.links,
                None => return false,
            }
        }
        level.0.entry(last.to_string()).or_default().fields = fields;
        true
    }

    /// Construye el árbol a partir de claves de prefijo (`a`, `a.b`).
    ///
    /// Los valores que no son objetos JSON (p.ej. `null` por un LEFT JOIN sin
    /// coincidencia) se ignoran, igual que un hijo cuyo padre falta.
    pub fn from_prefixed<I>(entries: I) -> Self
        where I: IntoIterator<Item = (String, Value)>
    {
        let mut sorted: Vec<(String, Map<String, Value>)> =
            entries.into_iter()
                   .filter_map(|(k, v)| match v {
                       Value::Object(m) => Some((k, m)),
                       _ => None,
                   })
                   .collect();
        sorted.sort_by_key(|(k, _)| k.matches(PATH_SEPARATOR).count());
        let mut links = Links::new();
        for (key, fields) in sorted {
            let accessors: Vec<&str> = key.split(PATH_SEPARATOR).collect();
            links.attach(&accessors, fields);
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_prefixed_skips_nulls_and_orphans() {
        let links = Links::from_prefixed(vec![("b.c".to_string(), json!({"c": 1})),
                                              ("b".to_string(), json!({"b": 0})),
                                              ("x".to_string(), Value::Null),
                                              ("x.y".to_string(), json!({"y": 2}))]);
        assert_eq!(links.len(), 1);
        let b = links.get("b").expect("b");
        assert_eq!(b.fields.get("b"), Some(&json!(0)));
        assert_eq!(b.links.get("c").map(|r| r.fields.get("c")), Some(Some(&json!(1))));
        assert!(links.get("x").is_none());
    }

    #[test]
    fn attach_requires_parent() {
        let mut links = Links::new();
        assert!(!links.attach(&["a", "b"], Map::new()));
        assert!(links.attach(&["a"], Map::new()));
        assert!(links.attach(&["a", "b"], Map::new()));
        assert!(!links.attach(&[], Map::new()));
    }
}
