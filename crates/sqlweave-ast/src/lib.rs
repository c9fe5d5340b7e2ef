//! sqlweave AST - Data model of compiled query templates
//!
//! This crate defines resolved statements, dynamic template segments,
//! query shapes and the method records consumed by code emitters.

mod span;
mod statement;
mod query;
mod method;

pub use span::*;
pub use statement::*;
pub use query::*;
pub use method::*;
