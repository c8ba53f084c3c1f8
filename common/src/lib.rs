// Leader-log common library - main library exports

pub mod calculations;
pub mod configuration;
pub mod genesis_values;
pub mod queries;
pub mod rational_number;
pub mod serialization;
pub mod types;

// Flattened re-exports
pub use self::types::*;
