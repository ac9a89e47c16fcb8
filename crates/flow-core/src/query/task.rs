//! Filtros propios de tareas y cola autorizada por actor.
use log::debug;

use super::polymorphic::TaskQuery;
use super::spec::{Field, FieldValue, Filter};
use crate::constants::{STATUS_ASSIGNED, STATUS_NEW};
use crate::model::{Actor, ActorId, TaskKind};
use crate::registry::{FlowClassId, FlowRegistry};

/// Predicado de visibilidad para un actor no superusuario:
/// `owner_permission IS NULL OR owner_permission IN (permisos) OR owner = actor`.
///
/// Es una única disyunción: aplicar las tres condiciones como filtros
/// sucesivos (AND) excluiría filas que alguna de ellas admite. Con un
/// conjunto de permisos vacío la rama `IN` se omite.
pub fn queue_predicate(actor: &Actor) -> Filter {
    let mut any = vec![Filter::IsNull(Field::OwnerPermission)];
    if !actor.permissions.is_empty() {
        let held = actor.permissions
                        .iter()
                        .map(|p| FieldValue::Text(p.to_string()))
                        .collect();
        any.push(Filter::In(Field::OwnerPermission, held));
    }
    any.push(Filter::eq(Field::Owner, actor.id.0));
    Filter::Any(any)
}

impl<'r> TaskQuery<'r> {
    /// Cola visible para `actor` sobre todos los flows (consulta no
    /// polimórfica; combinar con `for_flow_classes` para especializar).
    pub fn queue_for(registry: &'r FlowRegistry, actor: &Actor, flow_class: Option<FlowClassId>) -> Self {
        Self::new(registry).visible_queue(actor, flow_class)
    }

    /// Excluye tareas automáticas (sólo `HUMAN`).
    pub fn human_actionable(self) -> Self {
        self.filter(Filter::eq(Field::TaskKind, TaskKind::Human.as_str()))
    }

    /// Tareas que `actor` puede ver o reclamar, opcionalmente de un solo flow.
    pub fn visible_queue(self, actor: &Actor, flow_class: Option<FlowClassId>) -> Self {
        let mut query = self.human_actionable();
        if let Some(id) = flow_class {
            query = query.filter_flow_class(id);
        }
        if actor.is_superuser {
            debug!("visible_queue actor={} superuser", actor.id);
            return query;
        }
        debug!("visible_queue actor={} permissions={}", actor.id, actor.permissions.len());
        query.filter(queue_predicate(actor))
    }

    pub fn filter_owner(self, owner: ActorId) -> Self {
        self.filter(Filter::eq(Field::Owner, owner.0))
    }

    pub fn filter_process(self, process_id: i64) -> Self {
        self.filter(Filter::eq(Field::ProcessId, process_id))
    }

    /// Tareas ya reclamadas por `actor`.
    pub fn assigned_to(self, actor: &Actor) -> Self {
        self.filter_owner(actor.id).filter_status(STATUS_ASSIGNED)
    }

    /// Tareas sin reclamar.
    pub fn unclaimed(self) -> Self {
        self.filter_status(STATUS_NEW)
    }
}
