pub mod error;
pub mod store;
pub mod telemetry;

pub use error::InfraError;
