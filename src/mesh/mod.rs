mod emitter;
mod store;

pub use emitter::{CoordinateField, MeshEmitter, NodeValueLabel};
pub use store::{MeshElement, MeshElementId, MeshNode, MeshNodeId, MeshStore};
