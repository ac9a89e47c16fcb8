pub mod read_model_error;

pub use read_model_error::ReadModelError;
