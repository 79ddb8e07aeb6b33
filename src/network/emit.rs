use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Result, TopologyError};
use crate::math::Vector3;
use crate::mesh::{CoordinateField, MeshEmitter, NodeValueLabel};
use crate::sampling::SampledCurve;
use crate::topology::NetworkTopology;

use super::{ElementShape, IdentifierAllocator, RemapTable, SampledNetwork};

/// Mesh identifiers assigned to one segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SegmentMesh {
    /// Node identifier of every sampled point, in order along the segment.
    pub node_ids: Vec<u32>,
    pub element_ids: Vec<u32>,
}

/// A network whose nodes and elements have been emitted.
#[derive(Debug, Clone)]
pub struct MeshedNetwork {
    sampled: SampledNetwork,
    segments: Vec<SegmentMesh>,
    network_nodes: BTreeMap<u32, u32>,
}

impl MeshedNetwork {
    #[must_use]
    pub fn topology(&self) -> &NetworkTopology {
        self.sampled.topology()
    }

    /// Sampled curves the mesh was generated from.
    #[must_use]
    pub fn curves(&self) -> &[SampledCurve] {
        self.sampled.curves()
    }

    /// Inner layer curves, if the network was built with an inner proportion.
    #[must_use]
    pub fn inner_curves(&self) -> Option<&[SampledCurve]> {
        self.sampled.inner_curves()
    }

    /// Identifiers per segment, in segment order.
    #[must_use]
    pub fn segment_meshes(&self) -> &[SegmentMesh] {
        &self.segments
    }

    /// Mesh node identifier of network node `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NodeNotFound`] if the network has no such node.
    pub fn mesh_node_id(&self, id: u32) -> Result<u32> {
        self.network_nodes
            .get(&id)
            .copied()
            .ok_or_else(|| TopologyError::NodeNotFound(id).into())
    }

    /// Number of distinct mesh nodes emitted.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let interior: usize = self
            .segments
            .iter()
            .map(|s| s.node_ids.len().saturating_sub(2))
            .sum();
        interior + self.network_nodes.len()
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.segments.iter().map(|s| s.element_ids.len()).sum()
    }
}

/// Per-layer view of one sampled curve with its side cross derivatives.
struct Layer<'a> {
    field: CoordinateField,
    curve: &'a SampledCurve,
    d12: Vec<Vector3>,
    d13: Vec<Vector3>,
}

impl<'a> Layer<'a> {
    fn new(field: CoordinateField, curve: &'a SampledCurve) -> Self {
        let (d12, d13) = curve.side_cross_derivatives();
        Self { field, curve, d12, d13 }
    }
}

fn write_value<E: MeshEmitter>(emitter: &mut E, layers: &[Layer<'_>], node: E::NodeHandle, k: usize) -> Result<()> {
    for layer in layers {
        emitter.select_field(layer.field);
        let position = layer.curve.points[k].position.coords;
        emitter.set_node_derivative(node, NodeValueLabel::Value, 1, position)?;
    }
    Ok(())
}

fn write_derivatives<E: MeshEmitter>(
    emitter: &mut E,
    layers: &[Layer<'_>],
    node: E::NodeHandle,
    k: usize,
    version: u32,
) -> Result<()> {
    for layer in layers {
        emitter.select_field(layer.field);
        let point = &layer.curve.points[k];
        let values = [
            (NodeValueLabel::D1, point.d1),
            (NodeValueLabel::D2, point.d2),
            (NodeValueLabel::D3, point.d3),
            (NodeValueLabel::D2D1D2, layer.d12[k]),
            (NodeValueLabel::D2D1D3, layer.d13[k]),
        ];
        for (label, value) in values {
            emitter.set_node_derivative(node, label, version, value)?;
        }
    }
    Ok(())
}

impl SampledNetwork {
    /// Emits nodes and cubic Hermite line elements for every segment.
    ///
    /// Segments are walked in definition order and points along each segment.
    /// A network node becomes one mesh node the first time it is met; its
    /// derivatives for a version are written the first time that version is
    /// met. Every interior sample point is a new node. Elements whose ends
    /// use different versions carry the matching basis remap. With an inner
    /// layer, both coordinate fields are written on the same nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the emitter rejects a node or element.
    pub fn generate_mesh<E: MeshEmitter>(
        self,
        emitter: &mut E,
        ids: &mut IdentifierAllocator,
    ) -> Result<MeshedNetwork> {
        let mut handles: HashMap<u32, (E::NodeHandle, u32)> = HashMap::new();
        let mut network_nodes = BTreeMap::new();
        let mut written: HashSet<(u32, u32)> = HashSet::new();
        let mut remaps = RemapTable::new();
        let mut segments = Vec::with_capacity(self.curves.len());

        for (index, segment) in self.topology.segments().iter().enumerate() {
            let mut layers = vec![Layer::new(CoordinateField::Outer, self.curve(index)?)];
            if let Some(inner) = self.inner.as_ref().and_then(|curves| curves.get(index)) {
                layers.push(Layer::new(CoordinateField::Inner, inner));
            }
            let count = layers[0].curve.points.len();
            let mut node_handles = Vec::with_capacity(count);
            let mut versions = Vec::with_capacity(count);
            let mut mesh = SegmentMesh::default();

            for k in 0..count {
                let end = if k == 0 {
                    Some(segment.start())
                } else if k == count - 1 {
                    Some(segment.end())
                } else {
                    None
                };
                let (handle, id, version, first_use) = match end {
                    Some((node, version)) => {
                        let (handle, id) = if let Some(&existing) = handles.get(&node) {
                            existing
                        } else {
                            let id = ids.next_node();
                            let handle = emitter.create_node(id)?;
                            write_value(emitter, &layers, handle, k)?;
                            handles.insert(node, (handle, id));
                            network_nodes.insert(node, id);
                            (handle, id)
                        };
                        (handle, id, version, written.insert((node, version)))
                    }
                    None => {
                        let id = ids.next_node();
                        let handle = emitter.create_node(id)?;
                        write_value(emitter, &layers, handle, k)?;
                        (handle, id, 1, true)
                    }
                };
                if first_use {
                    write_derivatives(emitter, &layers, handle, k, version)?;
                }
                node_handles.push(handle);
                versions.push(version);
                mesh.node_ids.push(id);
            }

            for e in 0..count.saturating_sub(1) {
                let remap = remaps.get(ElementShape::CubicHermiteLine, &versions[e..e + 2]);
                let id = ids.next_element();
                emitter.create_element(id, &node_handles[e..e + 2], remap)?;
                mesh.element_ids.push(id);
            }
            segments.push(mesh);
        }
        emitter.select_field(CoordinateField::Outer);

        let meshed = MeshedNetwork {
            sampled: self,
            segments,
            network_nodes,
        };
        tracing::debug!(
            nodes = meshed.node_count(),
            elements = meshed.element_count(),
            remaps = remaps.len(),
            "generated network mesh"
        );
        Ok(meshed)
    }
}
