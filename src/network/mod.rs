//! Network-level meshing: sampling segments, blending junctions and emitting
//! nodes and elements.

mod allocator;
pub mod blend;
mod builder;
mod emit;
pub mod remap;

pub use allocator::IdentifierAllocator;
pub use builder::{BuildParameters, ElementDensity, NetworkMeshBuilder, SampledNetwork};
pub use emit::{MeshedNetwork, SegmentMesh};
pub use remap::{BasisRemap, ElementShape, NodeTerm, RemapTable};
