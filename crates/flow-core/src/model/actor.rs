//! Actor que solicita una vista: identidad, superusuario y permisos.
//!
//! El cálculo de permisos no es responsabilidad de este crate; el llamador
//! entrega el conjunto ya resuelto.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::BaseTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub i64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conjunto ordenado de codenames de permiso (`app.can_approve`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.0.insert(permission.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Actor {
    pub fn new(id: i64) -> Self {
        Self { id: ActorId(id),
               is_superuser: false,
               permissions: PermissionSet::new() }
    }

    pub fn superuser(id: i64) -> Self {
        Self { is_superuser: true,
               ..Self::new(id) }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Regla de visibilidad de cola evaluada en la aplicación.
    ///
    /// Una tarea es visible si no exige permiso, si el actor posee el permiso
    /// exigido o si ya es suya. No mira el tipo de tarea ni el estado.
    pub fn may_see(&self, task: &BaseTask) -> bool {
        if self.is_superuser {
            return true;
        }
        match task.owner_permission.as_deref() {
            None => true,
            Some(required) => self.permissions.contains(required) || task.owner == Some(self.id),
        }
    }
}
