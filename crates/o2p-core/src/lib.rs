//! Compile OpenAPI (Swagger 2 / OpenAPI 3) documents into proto3 files.
//!
//! The pipeline is: decode documents into a [`document::DocumentSet`],
//! [`transform::compile`] it into the [`ir::ProtoFile`] IR, then render that
//! with [`emit::render_proto`].

pub mod config;
pub mod document;
pub mod emit;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

pub use config::{CompilerOptions, EmitterOptions};
pub use document::DocumentSet;
pub use transform::{Compilation, FieldNumberMap, compile};
