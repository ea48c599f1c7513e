//! Mapping of client-visible virtual paths onto the sandbox root.

pub mod error;
pub mod resolver;

pub use error::PathSecurityError;
pub use resolver::{normalize, PathResolver};
mod test_resolver;
