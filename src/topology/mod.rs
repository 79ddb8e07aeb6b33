pub mod descriptor;
pub mod junction;
mod layout;
pub mod node;
pub mod segment;

pub use descriptor::{parse_descriptor, NodeToken, ParsedPath, ParsedSegment};
pub use junction::{EndRole, Junction, SegmentEnd, SharedVersion};
pub use node::NetworkNode;
pub use segment::NetworkSegment;

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TopologyError};
use crate::geometry::{ControlPoint, Derivatives};
use crate::math::Point3;

new_key_type! {
    /// Stable handle of a segment while the descriptor is being read.
    struct SegmentKey;
}

/// The parsed network graph: nodes with versioned derivatives and the
/// segments running between them, in definition order.
///
/// After parsing every node carries default layout geometry, which callers
/// replace through [`NetworkTopology::set_node_geometry`].
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    nodes: Vec<NetworkNode>,
    index: HashMap<u32, usize>,
    segments: Vec<NetworkSegment>,
}

/// Mutable state while reading paths. Segments live in an arena so that
/// splitting can insert a remainder without invalidating other handles.
#[derive(Default)]
struct TopologyReader {
    nodes: Vec<NetworkNode>,
    index: HashMap<u32, usize>,
    arena: SlotMap<SegmentKey, NetworkSegment>,
    order: Vec<SegmentKey>,
    interior: HashMap<u32, SegmentKey>,
}

impl TopologyReader {
    fn node_mut(&mut self, id: u32) -> (&mut NetworkNode, bool) {
        if let Some(&i) = self.index.get(&id) {
            return (&mut self.nodes[i], true);
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(NetworkNode::new(id));
        let last = self.nodes.len() - 1;
        (&mut self.nodes[last], false)
    }

    fn split_at(&mut self, key: SegmentKey, node: u32) {
        let Some(remainder) = self.arena.get_mut(key).and_then(|s| s.split_at_node(node)) else {
            return;
        };
        let interior: Vec<u32> = remainder.interior_nodes().to_vec();
        let new_key = self.arena.insert(remainder);
        let position = self.order.iter().position(|&k| k == key).map_or(self.order.len(), |p| p + 1);
        self.order.insert(position, new_key);
        for id in interior {
            self.interior.insert(id, new_key);
        }
        tracing::debug!(node, "split segment at interior node");
    }

    fn register(&mut self, nodes: Vec<u32>, versions: Vec<u32>) -> Result<()> {
        let segment = NetworkSegment::new(nodes, versions)?;
        for &id in segment.node_ids() {
            if let Some(&i) = self.index.get(&id) {
                self.nodes[i].mark_registered();
            }
        }
        let interior: Vec<u32> = segment.interior_nodes().to_vec();
        let key = self.arena.insert(segment);
        self.order.push(key);
        for id in interior {
            self.interior.insert(id, key);
        }
        Ok(())
    }

    fn read_path(&mut self, path: &ParsedPath) -> Result<()> {
        let last = path.tokens.len() - 1;
        let mut nodes = Vec::new();
        let mut versions = Vec::new();
        for (i, token) in path.tokens.iter().enumerate() {
            if let Some(key) = self.interior.remove(&token.id) {
                self.split_at(key, token.id);
            }
            let (node, existing) = self.node_mut(token.id);
            let version = token.version.unwrap_or(if node.is_registered() {
                node.version_count() + 1
            } else {
                1
            });
            node.define_version(version);
            nodes.push(token.id);
            versions.push(version);
            // Segments end wherever the path meets a known node.
            if nodes.len() > 1 && (existing || i == last) {
                let end = (token.id, version);
                self.register(std::mem::take(&mut nodes), std::mem::take(&mut versions))?;
                nodes.push(end.0);
                versions.push(end.1);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<NetworkTopology> {
        let TopologyReader {
            mut nodes,
            index,
            mut arena,
            order,
            ..
        } = self;
        let segments: Vec<NetworkSegment> = order.into_iter().filter_map(|key| arena.remove(key)).collect();

        let mut in_segments = vec![Vec::new(); nodes.len()];
        let mut out_segments = vec![Vec::new(); nodes.len()];
        let mut interior = vec![None; nodes.len()];
        for (s, segment) in segments.iter().enumerate() {
            if let Some(&i) = index.get(&segment.start().0) {
                out_segments[i].push(s);
            }
            if let Some(&i) = index.get(&segment.end().0) {
                in_segments[i].push(s);
            }
            for id in segment.interior_nodes() {
                if let Some(&i) = index.get(id) {
                    interior[i] = Some(s);
                }
            }
        }
        for (i, node) in nodes.iter_mut().enumerate() {
            node.connect(
                std::mem::take(&mut in_segments[i]),
                std::mem::take(&mut out_segments[i]),
                interior[i],
            );
            node.check_versions();
        }
        layout::apply_default_layout(&mut nodes, &index, &segments)?;
        Ok(NetworkTopology { nodes, index, segments })
    }
}

impl NetworkTopology {
    /// Parses a network descriptor such as `"1-2-4-5,3-4.2-6"`.
    ///
    /// Each path is one continuous segment until another path references one
    /// of its interior nodes, which splits it there. An un-suffixed token uses
    /// version 1 unless the node is already part of a registered segment, in
    /// which case the next free version is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Parse`] for a malformed descriptor.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let paths = parse_descriptor(descriptor)?;
        let mut reader = TopologyReader::default();
        for path in &paths {
            reader.read_path(path)?;
        }
        let topology = reader.finish()?;
        tracing::debug!(
            nodes = topology.nodes.len(),
            segments = topology.segments.len(),
            "parsed network topology"
        );
        Ok(topology)
    }

    /// Nodes in first-seen order.
    #[must_use]
    pub fn nodes(&self) -> &[NetworkNode] {
        &self.nodes
    }

    /// Segments in definition order.
    #[must_use]
    pub fn segments(&self) -> &[NetworkSegment] {
        &self.segments
    }

    /// Returns the node with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NodeNotFound`] if no such node exists.
    pub fn node(&self, id: u32) -> Result<&NetworkNode> {
        self.index
            .get(&id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| TopologyError::NodeNotFound(id).into())
    }

    fn node_mut(&mut self, id: u32) -> Result<&mut NetworkNode> {
        match self.index.get(&id) {
            Some(&i) => Ok(&mut self.nodes[i]),
            None => Err(TopologyError::NodeNotFound(id).into()),
        }
    }

    /// Returns segment `index` in definition order.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::SegmentNotFound`] if the index is out of range.
    pub fn segment(&self, index: usize) -> Result<&NetworkSegment> {
        self.segments
            .get(index)
            .ok_or_else(|| TopologyError::SegmentNotFound(index).into())
    }

    /// Replaces the position and every version's derivatives of node `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or `versions` does not
    /// hold exactly one record per node version.
    pub fn set_node_geometry(&mut self, id: u32, position: Point3, versions: &[Derivatives]) -> Result<()> {
        let node = self.node_mut(id)?;
        let count = node.version_count();
        if versions.len() != count as usize {
            return Err(TopologyError::VersionOutOfRange {
                node: id,
                version: u32::try_from(versions.len()).unwrap_or(u32::MAX),
                count,
            }
            .into());
        }
        node.set_position(position);
        for (version, derivatives) in (1..).zip(versions) {
            node.set_derivatives(version, *derivatives)?;
        }
        Ok(())
    }

    /// Replaces the derivatives of one version of node `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or version does not exist.
    pub fn set_node_derivatives(&mut self, id: u32, version: u32, derivatives: Derivatives) -> Result<()> {
        self.node_mut(id)?.set_derivatives(version, derivatives)
    }

    /// Control points of segment `index`, using each node's chosen version.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not exist.
    pub fn segment_control_points(&self, index: usize) -> Result<Vec<ControlPoint>> {
        let segment = self.segment(index)?;
        segment
            .node_ids()
            .iter()
            .zip(segment.versions())
            .map(|(&id, &version)| self.node(id)?.control_point(version))
            .collect()
    }

    /// Every node version used by two or more segment ends, in first-seen
    /// node order then version order. Includes junction groups and
    /// pass-through nodes whose two segments share a version.
    #[must_use]
    pub fn shared_versions(&self) -> Vec<SharedVersion> {
        self.nodes
            .iter()
            .flat_map(|node| junction::shared_versions_at(&self.segments, node.id()))
            .collect()
    }

    /// Junction nodes in first-seen node order.
    #[must_use]
    pub fn junctions(&self) -> Vec<Junction> {
        self.nodes
            .iter()
            .filter_map(|node| junction::junction_at(&self.segments, node.id()))
            .collect()
    }
}
