//! sqlweave Parser - Query template compilation
//!
//! Three passes over template text:
//! - placeholder resolution (`${bind}`, `#{substitute}`) into positional markers
//! - dynamic segment splitting (`%{if ..}` / `%{for ..}` blocks)
//! - query shape analysis of `SELECT` statements (fields, tables, aliases)

mod error;
mod placeholder;
mod segments;
mod shape;

pub use error::*;
pub use placeholder::*;
pub use segments::*;
pub use shape::*;
