use std::collections::{BTreeMap, HashMap};

use slotmap::{new_key_type, SlotMap};

use crate::error::{MeshError, Result};
use crate::math::hermite::interpolate;
use crate::math::{Point3, Vector3};
use crate::network::BasisRemap;

use super::{CoordinateField, MeshEmitter, NodeValueLabel};

new_key_type! {
    /// Handle of a node in a [`MeshStore`].
    pub struct MeshNodeId;
    /// Handle of an element in a [`MeshStore`].
    pub struct MeshElementId;
}

/// A stored node: its identifier and parameters per field, label and version.
#[derive(Debug, Clone, Default)]
pub struct MeshNode {
    pub id: u32,
    parameters: BTreeMap<(CoordinateField, NodeValueLabel, u32), Vector3>,
}

impl MeshNode {
    /// Returns a stored parameter.
    #[must_use]
    pub fn parameter(&self, field: CoordinateField, label: NodeValueLabel, version: u32) -> Option<&Vector3> {
        self.parameters.get(&(field, label, version))
    }

    /// Number of derivative versions stored for `label` in `field`.
    #[must_use]
    pub fn version_count(&self, field: CoordinateField, label: NodeValueLabel) -> usize {
        self.parameters
            .keys()
            .filter(|(f, l, _)| *f == field && *l == label)
            .count()
    }
}

/// A stored line element.
#[derive(Debug, Clone)]
pub struct MeshElement {
    pub id: u32,
    pub nodes: Vec<MeshNodeId>,
    pub remap: BasisRemap,
}

/// In-memory mesh backend.
///
/// Nodes and elements live in arenas and are also indexed by identifier.
#[derive(Debug, Default)]
pub struct MeshStore {
    nodes: SlotMap<MeshNodeId, MeshNode>,
    elements: SlotMap<MeshElementId, MeshElement>,
    node_ids: HashMap<u32, MeshNodeId>,
    element_ids: HashMap<u32, MeshElementId>,
    field: CoordinateField,
}

impl MeshStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Returns the node with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NodeNotFound`] if no such node exists.
    pub fn node(&self, id: u32) -> Result<&MeshNode> {
        self.node_ids
            .get(&id)
            .and_then(|&key| self.nodes.get(key))
            .ok_or_else(|| MeshError::NodeNotFound(id).into())
    }

    /// Returns the element with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::ElementNotFound`] if no such element exists.
    pub fn element(&self, id: u32) -> Result<&MeshElement> {
        self.element_ids
            .get(&id)
            .and_then(|&key| self.elements.get(key))
            .ok_or_else(|| MeshError::ElementNotFound(id).into())
    }

    /// Node identifiers of element `id`, in local node order.
    ///
    /// # Errors
    ///
    /// Returns an error if the element does not exist.
    pub fn element_node_ids(&self, id: u32) -> Result<Vec<u32>> {
        let element = self.element(id)?;
        Ok(element
            .nodes
            .iter()
            .filter_map(|&key| self.nodes.get(key).map(|n| n.id))
            .collect())
    }

    /// Element identifiers in ascending order.
    #[must_use]
    pub fn element_identifiers(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.element_ids.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Evaluates the outer coordinates of line element `id` at `xi`, reading
    /// each corner's value and `d1` through the element's remap.
    ///
    /// # Errors
    ///
    /// Returns an error if the element or a referenced parameter is missing.
    pub fn evaluate_element(&self, id: u32, xi: f64) -> Result<Point3> {
        let element = self.element(id)?;
        let mut corners = Vec::with_capacity(2);
        for (local, &key) in element.nodes.iter().enumerate() {
            let node = self.nodes.get(key).ok_or(MeshError::InvalidHandle)?;
            let mut value = None;
            let mut d1 = None;
            for term in element.remap.terms(local) {
                let parameter = node.parameter(CoordinateField::Outer, term.label, term.version).copied();
                match term.label {
                    NodeValueLabel::Value => value = parameter,
                    NodeValueLabel::D1 => d1 = parameter,
                    _ => {}
                }
            }
            match (value, d1) {
                (Some(value), Some(d1)) => corners.push((Point3::from(value), d1)),
                _ => return Err(MeshError::NodeNotFound(node.id).into()),
            }
        }
        match corners.as_slice() {
            [(v1, d1), (v2, d2)] => Ok(interpolate(v1, d1, v2, d2, xi)),
            _ => Err(MeshError::ElementNotFound(id).into()),
        }
    }
}

impl MeshEmitter for MeshStore {
    type NodeHandle = MeshNodeId;
    type ElementHandle = MeshElementId;

    fn create_node(&mut self, id: u32) -> Result<MeshNodeId> {
        if self.node_ids.contains_key(&id) {
            return Err(MeshError::DuplicateIdentifier(id).into());
        }
        let key = self.nodes.insert(MeshNode {
            id,
            ..MeshNode::default()
        });
        self.node_ids.insert(id, key);
        Ok(key)
    }

    fn set_node_derivative(
        &mut self,
        node: MeshNodeId,
        label: NodeValueLabel,
        version: u32,
        value: Vector3,
    ) -> Result<()> {
        let field = self.field;
        let stored = self.nodes.get_mut(node).ok_or(MeshError::InvalidHandle)?;
        stored.parameters.insert((field, label, version), value);
        Ok(())
    }

    fn create_element(&mut self, id: u32, nodes: &[MeshNodeId], remap: &BasisRemap) -> Result<MeshElementId> {
        if self.element_ids.contains_key(&id) {
            return Err(MeshError::DuplicateIdentifier(id).into());
        }
        if nodes.iter().any(|&key| !self.nodes.contains_key(key)) {
            return Err(MeshError::InvalidHandle.into());
        }
        let key = self.elements.insert(MeshElement {
            id,
            nodes: nodes.to_vec(),
            remap: remap.clone(),
        });
        self.element_ids.insert(id, key);
        Ok(key)
    }

    fn select_field(&mut self, field: CoordinateField) {
        self.field = field;
    }
}
