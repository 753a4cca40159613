//! CAPFLOW Core Types
//!
//! This crate contains pure types and helpers with no I/O.
//! All types are serializable with stable encoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod num;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use id::{EdgeId, NodeId};
pub use num::{EPSILON, clamp_unit, floor_div};
