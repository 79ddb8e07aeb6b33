//! Declarative basis remaps for elements whose ends use different node
//! derivative versions.

use std::collections::HashMap;

use crate::mesh::NodeValueLabel;

/// Element shape class a remap applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementShape {
    /// Two-node cubic Hermite line interpolating value and `d1`.
    CubicHermiteLine,
}

impl ElementShape {
    /// Node parameter labels referenced by each local node, in basis order.
    #[must_use]
    pub fn local_node_labels(self) -> &'static [&'static [NodeValueLabel]] {
        const LINE: &[&[NodeValueLabel]] = &[
            &[NodeValueLabel::Value, NodeValueLabel::D1],
            &[NodeValueLabel::Value, NodeValueLabel::D1],
        ];
        match self {
            ElementShape::CubicHermiteLine => LINE,
        }
    }
}

/// One node parameter referenced by an element corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTerm {
    pub label: NodeValueLabel,
    pub version: u32,
}

/// Maps every local node parameter of an element to the node version it
/// reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisRemap {
    shape: ElementShape,
    versions: Vec<u32>,
    terms: Vec<Vec<NodeTerm>>,
}

impl BasisRemap {
    /// Generates the remap of `shape` for the given per-corner versions.
    #[must_use]
    pub fn generate(shape: ElementShape, versions: &[u32]) -> Self {
        let terms = shape
            .local_node_labels()
            .iter()
            .zip(versions)
            .map(|(labels, &version)| {
                labels
                    .iter()
                    .map(|&label| NodeTerm {
                        label,
                        version: if label.is_versioned() { version } else { 1 },
                    })
                    .collect()
            })
            .collect();
        Self {
            shape,
            versions: versions.to_vec(),
            terms,
        }
    }

    #[must_use]
    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    /// Derivative version used at each local node.
    #[must_use]
    pub fn versions(&self) -> &[u32] {
        &self.versions
    }

    /// Parameters referenced by local node `local`.
    #[must_use]
    pub fn terms(&self, local: usize) -> &[NodeTerm] {
        self.terms.get(local).map_or(&[], Vec::as_slice)
    }

    /// Returns true if every corner reads version 1, the backend default.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.versions.iter().all(|&v| v == 1)
    }
}

/// Cache of remaps keyed by shape and corner versions, each generated the
/// first time it is needed.
#[derive(Debug, Default)]
pub struct RemapTable {
    remaps: HashMap<(ElementShape, Vec<u32>), BasisRemap>,
}

impl RemapTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remap for `shape` with the given corner versions.
    pub fn get(&mut self, shape: ElementShape, versions: &[u32]) -> &BasisRemap {
        self.remaps
            .entry((shape, versions.to_vec()))
            .or_insert_with(|| BasisRemap::generate(shape, versions))
    }

    /// Number of distinct remaps generated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remaps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaps.is_empty()
    }
}
