//! Source adapter contract.
//!
//! Every per-site adapter implements [`MediaSource`], keeping the
//! tracking core agnostic of markup parsing and transport.

pub mod registry;
pub mod traits;

pub use registry::SourceRegistry;
pub use traits::{MediaSource, SourceError};
