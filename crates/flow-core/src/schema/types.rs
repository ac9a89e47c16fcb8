//! Arena de tipos de entidad.
//!
//! Cada flow declara su tipo de proceso y de tarea. Un tipo es, o bien una
//! tabla (opcionalmente "es-un" de otra tabla vía una FK igual al id base), o
//! bien un alias sin almacenamiento propio de otro tipo. Los ids sólo los emite
//! el propio `TypeSchema` y nunca se reutilizan.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::{PROCESS_TABLE, PROCESS_TYPE, TASK_TABLE, TASK_TYPE};
use crate::errors::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Process,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityTypeId(usize);

impl EntityTypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Enlace "es-un" desde un tipo hijo hacia su padre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub parent: EntityTypeId,
    /// Nombre con el que el padre alcanza la fila hija.
    pub accessor: String,
    /// Columna FK de la tabla hija (su valor es el id de la fila base).
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Table { table: String, parent: Option<ParentLink> },
    Alias { target: EntityTypeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTypeDef {
    pub name: String,
    pub storage: Storage,
}

#[derive(Debug, Clone)]
pub struct TypeSchema {
    types: Vec<EntityTypeDef>,
    by_name: IndexMap<String, EntityTypeId>,
    process: EntityTypeId,
    task: EntityTypeId,
}

impl Default for TypeSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSchema {
    /// Esquema con los dos tipos base (`Process`, `Task`) ya registrados.
    pub fn new() -> Self {
        let mut schema = Self { types: Vec::new(),
                                by_name: IndexMap::new(),
                                process: EntityTypeId(0),
                                task: EntityTypeId(1) };
        schema.process = schema.push(PROCESS_TYPE, Storage::Table { table: PROCESS_TABLE.to_string(),
                                                                    parent: None });
        schema.task = schema.push(TASK_TYPE, Storage::Table { table: TASK_TABLE.to_string(),
                                                              parent: None });
        schema
    }

    pub fn base(&self, kind: EntityKind) -> EntityTypeId {
        match kind {
            EntityKind::Process => self.process,
            EntityKind::Task => self.task,
        }
    }

    pub fn get(&self, id: EntityTypeId) -> Option<&EntityTypeDef> {
        self.types.get(id.0)
    }

    pub fn lookup(&self, name: &str) -> Option<EntityTypeId> {
        self.by_name.get(name).copied()
    }

    /// Nombre del tipo; `"?"` para ids ajenos a este esquema.
    pub fn name(&self, id: EntityTypeId) -> &str {
        self.get(id).map(|d| d.name.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registra una tabla que extiende `parent`.
    ///
    /// - `accessor`: nombre del enlace desde el padre.
    /// - `column`: FK en `table` hacia la fila padre.
    ///
    /// El padre debe ser otra tabla: un alias no tiene filas propias a las que
    /// apuntar.
    pub fn extend(&mut self,
                  name: &str,
                  table: &str,
                  parent: EntityTypeId,
                  accessor: &str,
                  column: &str)
                  -> Result<EntityTypeId, RegistryError> {
        self.check_new_name(name)?;
        for ident in [table, accessor, column] {
            if !is_identifier(ident) {
                return Err(RegistryError::InvalidIdentifier(ident.to_string()));
            }
        }
        match self.get(parent).map(|d| &d.storage) {
            Some(Storage::Table { .. }) => {}
            Some(Storage::Alias { .. }) => {
                return Err(RegistryError::SchemaMismatch { specialized: name.to_string(),
                                                           base: self.name(parent).to_string() })
            }
            None => return Err(RegistryError::UnknownType(format!("#{}", parent.0))),
        }
        if self.child_by_accessor(parent, accessor).is_some() {
            return Err(RegistryError::AccessorClash { parent: self.name(parent).to_string(),
                                                      accessor: accessor.to_string() });
        }
        let link = ParentLink { parent,
                                accessor: accessor.to_string(),
                                column: column.to_string() };
        Ok(self.push(name, Storage::Table { table: table.to_string(),
                                            parent: Some(link) }))
    }

    /// Registra un alias (sin almacenamiento) de `target`.
    pub fn alias(&mut self, name: &str, target: EntityTypeId) -> Result<EntityTypeId, RegistryError> {
        self.check_new_name(name)?;
        if self.get(target).is_none() {
            return Err(RegistryError::UnknownType(format!("#{}", target.0)));
        }
        Ok(self.push(name, Storage::Alias { target }))
    }

    /// Primer tipo con almacenamiento propio, saltando capas de alias.
    pub fn concrete(&self, id: EntityTypeId) -> Result<EntityTypeId, RegistryError> {
        let mut current = id;
        loop {
            match self.get(current).map(|d| &d.storage) {
                Some(Storage::Table { .. }) => return Ok(current),
                Some(Storage::Alias { target }) => current = *target,
                None => return Err(RegistryError::UnknownType(format!("#{}", current.0))),
            }
        }
    }

    /// `true` si `ty` es `ancestor` o desciende de él (alias incluidos).
    pub fn is_subtype_of(&self, ty: EntityTypeId, ancestor: EntityTypeId) -> bool {
        let mut current = Some(ty);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = match self.get(id).map(|d| &d.storage) {
                Some(Storage::Alias { target }) => Some(*target),
                Some(Storage::Table { parent: Some(link), .. }) => Some(link.parent),
                _ => None,
            };
        }
        false
    }

    /// Tabla hija de `parent` alcanzada por `accessor`, si la hay.
    fn child_by_accessor(&self, parent: EntityTypeId, accessor: &str) -> Option<EntityTypeId> {
        self.types
            .iter()
            .position(|d| match &d.storage {
                Storage::Table { parent: Some(link), .. } => link.parent == parent && link.accessor == accessor,
                _ => false,
            })
            .map(EntityTypeId)
    }

    fn check_new_name(&self, name: &str) -> Result<(), RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateType(name.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, name: &str, storage: Storage) -> EntityTypeId {
        let id = EntityTypeId(self.types.len());
        self.types.push(EntityTypeDef { name: name.to_string(),
                                        storage });
        self.by_name.insert(name.to_string(), id);
        id
    }
}

/// Identificador SQL simple: se interpolan en consultas generadas.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}
