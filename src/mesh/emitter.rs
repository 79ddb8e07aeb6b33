use crate::error::Result;
use crate::math::Vector3;
use crate::network::BasisRemap;

/// Nodal parameter labels of a cubic Hermite coordinate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeValueLabel {
    Value,
    D1,
    D2,
    D3,
    /// Rate of change of `d2` along `d1`.
    D2D1D2,
    /// Rate of change of `d3` along `d1`.
    D2D1D3,
}

impl NodeValueLabel {
    /// Every label, in emission order.
    pub const ALL: [NodeValueLabel; 6] = [
        NodeValueLabel::Value,
        NodeValueLabel::D1,
        NodeValueLabel::D2,
        NodeValueLabel::D3,
        NodeValueLabel::D2D1D2,
        NodeValueLabel::D2D1D3,
    ];

    /// Returns true if the label is stored per derivative version.
    ///
    /// Node positions are shared by all versions and always use version 1.
    #[must_use]
    pub fn is_versioned(self) -> bool {
        self != NodeValueLabel::Value
    }
}

/// The coordinate field parameters are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CoordinateField {
    /// Outer wall.
    #[default]
    Outer,
    /// Inner wall of a shell-thickness structure.
    Inner,
}

/// Backend receiving the nodes and elements of a built network.
///
/// Implementations own storage; the network builder only hands out
/// identifiers and parameter values.
pub trait MeshEmitter {
    type NodeHandle: Copy;
    type ElementHandle;

    /// Creates a node with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the identifier.
    fn create_node(&mut self, id: u32) -> Result<Self::NodeHandle>;

    /// Sets one parameter of `node` in the currently selected field.
    ///
    /// # Errors
    ///
    /// Returns an error if the node handle is not valid in this backend.
    fn set_node_derivative(
        &mut self,
        node: Self::NodeHandle,
        label: NodeValueLabel,
        version: u32,
        value: Vector3,
    ) -> Result<()>;

    /// Creates a line element on `nodes`, whose corners reference node
    /// parameters as described by `remap`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is taken or a node handle is invalid.
    fn create_element(
        &mut self,
        id: u32,
        nodes: &[Self::NodeHandle],
        remap: &BasisRemap,
    ) -> Result<Self::ElementHandle>;

    /// Selects the field that subsequent parameters are written to.
    ///
    /// Backends without an inner field ignore this.
    fn select_field(&mut self, field: CoordinateField) {
        let _ = field;
    }
}
