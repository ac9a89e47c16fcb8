//! Constantes compartidas con el motor de ejecución.
//!
//! Los estados son propiedad del motor (este crate sólo filtra por ellos); se
//! exponen aquí para que las vistas de lectura no repitan literales.

/// Nombre del tipo base de proceso y de su tabla.
pub const PROCESS_TYPE: &str = "Process";
pub const PROCESS_TABLE: &str = "flow_process";

/// Nombre del tipo base de tarea y de su tabla.
pub const TASK_TYPE: &str = "Task";
pub const TASK_TABLE: &str = "flow_task";

/// Separador usado al serializar una ruta de especialización (`bprocess.cprocess`).
pub const PATH_SEPARATOR: char = '.';

pub const STATUS_NEW: &str = "NEW";
pub const STATUS_ASSIGNED: &str = "ASSIGNED";
pub const STATUS_STARTED: &str = "STARTED";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_CANCELED: &str = "CANCELED";
pub const STATUS_ERROR: &str = "ERROR";
