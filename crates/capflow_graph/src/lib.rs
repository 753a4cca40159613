//! CAPFLOW Topology Model
//!
//! The graph a user sketches: entrypoints, compute services,
//! message-queue topics, datastores, and the directed edges between
//! them. This crate owns the immutable snapshot types the engine
//! evaluates, the adjacency index, the evaluation-order scheduler,
//! and the advisory semantic validator.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edge;
pub mod index;
pub mod model;
pub mod node;
pub mod order;
pub mod validate;

// Re-exports
pub use edge::{Edge, OpType, Protocol};
pub use index::GraphIndex;
pub use model::{GraphMetadata, GraphModel};
pub use node::{
    ApiEndpointDials, DatastoreDials, FanOut, JoinSemantics, Node, NodeKind, Penalties, Position,
    QueueTopicDials, ServiceDials,
};
pub use order::evaluation_order;
pub use validate::Validator;
