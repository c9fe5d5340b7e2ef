//! sqlweave - Query template compiler
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use sqlweave_ast as ast;
pub use sqlweave_builder as builder;
pub use sqlweave_lexer as lexer;
pub use sqlweave_parser as parser;
pub use sqlweave_schema as schema;

pub use sqlweave_builder::{CompileError, CompiledFile, CompilerConfig, CompilerContext};
