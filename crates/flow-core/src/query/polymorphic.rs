//! Consulta polimórfica sobre una tabla base.
//!
//! `for_flow_classes` restringe las filas a un conjunto de flows, pide al
//! store que precargue la ruta de especialización de cada uno (una sola
//! lectura, sin N+1) y activa `materialize_as_variant`. La conversión a la
//! forma del flow ocurre al iterar, después de que el store aplicó orden y
//! paginación, así que nunca cambia el orden de las filas.
use std::fmt;
use std::marker::PhantomData;

use log::debug;

use super::page::{window, Page};
use super::spec::{Field, FieldValue, Filter, OrderBy, QuerySpec, SortField};
use crate::errors::QueryError;
use crate::model::{BaseProcess, BaseRecord, BaseTask, Fetched, Resolved};
use crate::registry::{FlowClassId, FlowRegistry};
use crate::schema::EntityKind;
use crate::store::EntityStore;

pub type ProcessQuery<'r> = PolymorphicQuery<'r, BaseProcess>;
pub type TaskQuery<'r> = PolymorphicQuery<'r, BaseTask>;

/// Builder inmutable: cada método consume `self` y devuelve la consulta
/// derivada, arrastrando `materialize_as_variant` como un campo más.
pub struct PolymorphicQuery<'r, R> {
    registry: &'r FlowRegistry,
    spec: QuerySpec,
    materialize_as_variant: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PolymorphicQuery<'_, R> {
    fn clone(&self) -> Self {
        Self { registry: self.registry,
               spec: self.spec.clone(),
               materialize_as_variant: self.materialize_as_variant,
               _record: PhantomData }
    }
}

impl<R> fmt::Debug for PolymorphicQuery<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicQuery")
         .field("spec", &self.spec)
         .field("materialize_as_variant", &self.materialize_as_variant)
         .finish()
    }
}

impl<'r, R: BaseRecord> PolymorphicQuery<'r, R> {
    /// Consulta no polimórfica sobre todas las filas base.
    pub fn new(registry: &'r FlowRegistry) -> Self {
        Self { registry,
               spec: QuerySpec::new(R::KIND),
               materialize_as_variant: false,
               _record: PhantomData }
    }

    pub fn registry(&self) -> &'r FlowRegistry {
        self.registry
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn is_polymorphic(&self) -> bool {
        self.materialize_as_variant
    }

    /// Restringe a `flow_classes`, precarga sus rutas y activa la
    /// materialización por variante.
    ///
    /// En consultas de tareas también precarga el proceso dueño.
    pub fn for_flow_classes<I>(mut self, flow_classes: I) -> Result<Self, QueryError>
        where I: IntoIterator<Item = FlowClassId>
    {
        let mut names = Vec::new();
        for id in flow_classes {
            let flow = self.registry.get(id).ok_or(QueryError::UnknownFlowClass(id.index()))?;
            let value = FieldValue::Text(flow.name.clone());
            if names.contains(&value) {
                continue;
            }
            names.push(value);
            let path = self.registry
                           .path(id, R::KIND)
                           .ok_or(QueryError::UnknownFlowClass(id.index()))?;
            if !path.is_empty() && !self.spec.prefetch.contains(path) {
                self.spec.prefetch.push(path.clone());
            }
        }
        if names.is_empty() {
            return Err(QueryError::EmptyFlowClasses);
        }
        debug!("for_flow_classes kind={:?} flows={} prefetch={}",
               R::KIND,
               names.len(),
               self.spec.prefetch.len());
        self.spec.filters.push(Filter::In(Field::FlowClass, names));
        if R::KIND == EntityKind::Task {
            self.spec.with_process = true;
        }
        self.materialize_as_variant = true;
        Ok(self)
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.spec.filters.push(filter);
        self
    }

    /// Filtra por un flow. Un id ajeno al registro no coincide con nada.
    pub fn filter_flow_class(self, id: FlowClassId) -> Self {
        let names = self.registry
                        .get(id)
                        .map(|f| vec![FieldValue::Text(f.name.clone())])
                        .unwrap_or_default();
        self.filter(Filter::In(Field::FlowClass, names))
    }

    pub fn filter_status(self, status: &str) -> Self {
        self.filter(Filter::eq(Field::Status, status))
    }

    pub fn filter_id(self, id: i64) -> Self {
        self.filter(Filter::eq(Field::Id, id))
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.spec.order.push(order);
        self
    }

    pub fn order_by_created_desc(self) -> Self {
        self.order_by(OrderBy::desc(SortField::Created))
    }

    pub fn order_by_created_asc(self) -> Self {
        self.order_by(OrderBy::asc(SortField::Created))
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.spec.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    /// Ejecuta la consulta. Los errores del store se propagan tal cual.
    ///
    /// En modo polimórfico las filas cuyo flow no está registrado se omiten:
    /// el número de resultados puede ser menor que el de filas coincidentes.
    ///
    /// El store entrega de una vez todas las filas pedidas; sin `limit` son
    /// todas las coincidentes. Los listados deben usar `fetch_page`.
    pub fn fetch<S: EntityStore + ?Sized>(&self, store: &S) -> Result<Materialize<'r, R>, S::Error> {
        let rows = R::fetch(store, &self.spec)?;
        Ok(Materialize { registry: self.registry,
                         rows: rows.into_iter(),
                         materialize_as_variant: self.materialize_as_variant })
    }

    /// Filas coincidentes en el store, ignorando offset/limit.
    pub fn count<S: EntityStore + ?Sized>(&self, store: &S) -> Result<u64, S::Error> {
        R::count(store, &self.spec)
    }

    /// Página `number` (base 1) de `per_page` filas.
    pub fn fetch_page<S: EntityStore + ?Sized>(&self,
                                               store: &S,
                                               number: u64,
                                               per_page: u64)
                                               -> Result<Page<Resolved<R>>, S::Error> {
        self.fetch_page_with_orphans(store, number, per_page, 0)
    }

    /// Como `fetch_page`, pero una última página de hasta `orphans` filas se
    /// une a la anterior. Un número de página más allá del final devuelve
    /// una página vacía.
    pub fn fetch_page_with_orphans<S: EntityStore + ?Sized>(&self,
                                                            store: &S,
                                                            number: u64,
                                                            per_page: u64,
                                                            orphans: u64)
                                                            -> Result<Page<Resolved<R>>, S::Error> {
        let number = number.max(1);
        let per_page = per_page.max(1);
        let total = self.count(store)?;
        let (offset, limit) = window(number, per_page, orphans, total);
        let items = if offset >= total {
            Vec::new()
        } else {
            self.clone().offset(offset).limit(limit).fetch(store)?.collect()
        };
        Ok(Page { items,
                  number,
                  per_page,
                  orphans,
                  total })
    }
}

/// Iterador perezoso sobre las filas devueltas por el store.
pub struct Materialize<'r, R> {
    registry: &'r FlowRegistry,
    rows: std::vec::IntoIter<Fetched<R>>,
    materialize_as_variant: bool,
}

impl<R: BaseRecord> Iterator for Materialize<'_, R> {
    type Item = Resolved<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.rows.next()?;
            if !self.materialize_as_variant {
                return Some(Resolved::Base { record: row.record });
            }
            if let Some(resolved) = self.registry.materialize(row) {
                return Some(resolved);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = self.rows.len();
        if self.materialize_as_variant {
            (0, Some(upper))
        } else {
            (upper, Some(upper))
        }
    }
}
