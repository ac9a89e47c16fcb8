//! Implementación Postgres (Diesel) de `EntityStore`.
//!
//! Cada lectura es una sola sentencia (ver `sql`): filas base, proceso dueño
//! y filas de especialización llegan juntas, sin consultas por fila. Los
//! errores de Diesel se mapean a `PersistenceError` y se devuelven sin
//! reintentos.

pub mod rows;
pub mod sql;

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::BoxedSqlQuery;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{BigInt, Text};
use log::{debug, error, warn};

use flow_core::{BaseProcess, BaseTask, EntityStore, Fetched, FieldValue, QuerySpec};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{flow_process, flow_task};
pub use rows::{CountRow, NewProcessRow, NewTaskRow, ProcessRow, TaskRow};
pub use sql::SqlFragment;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// Al construirlo se corre el set de migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o un proveedor de test sin acoplar el store
/// a r2d2. Debe devolver una conexión válida o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

fn bind_all(fragment: SqlFragment) -> BoxedSqlQuery<'static, Pg, diesel::query_builder::SqlQuery> {
    debug!("sql: {} binds={:?}", fragment.sql, fragment.binds);
    let mut query = diesel::sql_query(fragment.sql).into_boxed::<Pg>();
    for value in fragment.binds {
        query = match value {
            FieldValue::Int(v) => query.bind::<BigInt, _>(v),
            FieldValue::Text(v) => query.bind::<Text, _>(v),
        };
    }
    query
}

/// Store Postgres de lectura sobre `flow_process` / `flow_task` y las tablas
/// de especialización que declare el `TypeSchema`.
pub struct PgEntityStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgEntityStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn count(&self, spec: &QuerySpec) -> Result<u64, PersistenceError> {
        let fragment = sql::count(spec)?;
        let mut conn = self.provider.connection()?;
        let row: CountRow = bind_all(fragment).get_result(&mut conn).map_err(|e| {
                                                                         error!("count:{:?} err={e}", spec.kind);
                                                                         PersistenceError::from(e)
                                                                     })?;
        Ok(u64::try_from(row.count).unwrap_or(0))
    }

    /// Inserta un proceso y devuelve su id.
    pub fn insert_process(&self, row: &NewProcessRow<'_>) -> Result<i64, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let id = diesel::insert_into(flow_process::table).values(row)
                                                         .returning(flow_process::id)
                                                         .get_result(&mut conn)?;
        debug!("insert_process id={id} flow_class={}", row.flow_class);
        Ok(id)
    }

    /// Inserta una tarea y devuelve su id.
    pub fn insert_task(&self, row: &NewTaskRow<'_>) -> Result<i64, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let id = diesel::insert_into(flow_task::table).values(row)
                                                      .returning(flow_task::id)
                                                      .get_result(&mut conn)?;
        debug!("insert_task id={id} process_id={} flow_task={}", row.process_id, row.flow_task);
        Ok(id)
    }
}

impl<P: ConnectionProvider> EntityStore for PgEntityStore<P> {
    type Error = PersistenceError;

    fn fetch_processes(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseProcess>>, Self::Error> {
        let fragment = sql::select(spec)?;
        let mut conn = self.provider.connection()?;
        let rows: Vec<ProcessRow> = bind_all(fragment).load(&mut conn).map_err(|e| {
                                                                          error!("fetch_processes err={e}");
                                                                          PersistenceError::from(e)
                                                                      })?;
        debug!("fetch_processes rows={} prefetch={}", rows.len(), spec.prefetch.len());
        Ok(rows.into_iter().map(ProcessRow::into_fetched).collect())
    }

    fn fetch_tasks(&self, spec: &QuerySpec) -> Result<Vec<Fetched<BaseTask>>, Self::Error> {
        let fragment = sql::select(spec)?;
        let mut conn = self.provider.connection()?;
        let rows: Vec<TaskRow> = bind_all(fragment).load(&mut conn).map_err(|e| {
                                                                       error!("fetch_tasks err={e}");
                                                                       PersistenceError::from(e)
                                                                   })?;
        debug!("fetch_tasks rows={} with_process={}", rows.len(), spec.with_process);
        rows.into_iter().map(TaskRow::into_fetched).collect()
    }

    fn count_processes(&self, spec: &QuerySpec) -> Result<u64, Self::Error> {
        self.count(spec)
    }

    fn count_tasks(&self, spec: &QuerySpec) -> Result<u64, Self::Error> {
        self.count(spec)
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// - Si `min_size > max_size`, usa `min_size = max_size`.
/// - Ejecuta las migraciones pendientes tras el primer `get()`.
/// - Devuelve `PersistenceError::TransientIo` ante errores del pool/manager.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee configuración (DATABASE_URL,
/// tamaños) y construye un pool ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
