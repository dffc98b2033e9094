pub mod normalizer;
pub mod registry;
pub mod schema;

pub use normalizer::{DataNormalizer, NormalizedOutcome};
pub use registry::SchemaRegistry;
pub use schema::{Schema, SchemaReport, SchemaValidator};
