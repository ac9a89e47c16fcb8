//! Runner de migraciones embebidas (`migrations/` de este crate).
//!
//! Crea las tablas base `flow_process` y `flow_task`. Las tablas de
//! especialización pertenecen a cada flow y no se crean aquí.

use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::debug;

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")))?;
    debug!("migrations applied={}", applied.len());
    Ok(())
}
