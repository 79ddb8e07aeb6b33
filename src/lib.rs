pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod network;
pub mod operations;
pub mod sampling;
pub mod topology;

pub use error::{BranchMeshError, Result};
