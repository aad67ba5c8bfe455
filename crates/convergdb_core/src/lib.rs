//! convergdb Core Types
//!
//! This crate contains pure types shared by the IR protocol and the concrete
//! node types. There is no I/O here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod value;

// Re-exports
pub use error::{ConfigurationError, CoreError, CoreResult, ValidationError};
pub use id::NodeId;
pub use value::{is_present, AttrValue};
