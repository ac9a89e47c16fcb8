//! flow-persistence
//!
//! Implementación Postgres (Diesel + r2d2) de `EntityStore`.
//!
//! Módulos:
//! - `pg`: store, pool y traducción de `QuerySpec` a SQL.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas base declaradas para Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, NewProcessRow, NewTaskRow, PgEntityStore, PgPool,
             PoolProvider};
