pub mod field_numbers;
pub mod name_normalizer;
pub mod schema_compiler;
pub mod service_compiler;
pub mod spec_to_ir;

pub use field_numbers::FieldNumberMap;
pub use name_normalizer::NameScope;
pub use spec_to_ir::{Compilation, compile};
