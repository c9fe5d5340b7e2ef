//! sqlweave Builder - Method compilation
//!
//! Splits a template file into method blocks, decodes each header's
//! options, classifies the statement against the declared return shape and
//! runs the parser passes over the body. `auto` methods get a result record
//! synthesized from table metadata.

mod classify;
mod context;
mod derive;
mod error;
mod options;
mod template;

pub use classify::*;
pub use context::*;
pub use derive::*;
pub use error::*;
pub use options::*;
pub use template::*;
