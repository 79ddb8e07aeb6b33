use thiserror::Error;

/// Top-level error type for the branchmesh kernel.
#[derive(Debug, Error)]
pub enum BranchMeshError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("mismatched input lengths: {0}")]
    MismatchedLengths(String),
}

/// Errors raised while parsing or querying a network topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid network descriptor at offset {offset} ({fragment:?}): {reason}")]
    Parse {
        /// The offending substring of the descriptor.
        fragment: String,
        /// Byte offset of `fragment` within the descriptor.
        offset: usize,
        reason: &'static str,
    },

    #[error("network node {0} not found")]
    NodeNotFound(u32),

    #[error("network segment {0} not found")]
    SegmentNotFound(usize),

    #[error("node {node} has {count} derivative versions, version {version} requested")]
    VersionOutOfRange { node: u32, version: u32, count: u32 },
}

/// Errors raised while building a network mesh.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid build parameters: {0}")]
    InvalidParameters(String),

    #[error("segment {segment} has no sampled curve")]
    MissingSample { segment: usize },
}

/// Errors raised by the in-memory mesh store.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh node {0} not found")]
    NodeNotFound(u32),

    #[error("mesh element {0} not found")]
    ElementNotFound(u32),

    #[error("identifier {0} is already in use")]
    DuplicateIdentifier(u32),

    #[error("handle does not refer to a stored node")]
    InvalidHandle,
}

/// Convenience type alias for results using [`BranchMeshError`].
pub type Result<T> = std::result::Result<T, BranchMeshError>;
