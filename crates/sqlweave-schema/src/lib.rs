//! sqlweave Schema - Table metadata for result-shape derivation
//!
//! Defines the introspection interface consumed by the method builder,
//! an in-memory and a JSON-file provider, and a cache that is safe to
//! share across threads.

mod cache;
mod error;
mod json;
mod meta;
mod provider;

pub use cache::*;
pub use error::*;
pub use json::*;
pub use meta::*;
pub use provider::*;
