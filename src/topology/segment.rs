use crate::error::{GeometryError, Result};

/// A run of network nodes between two junction or end nodes, with the
/// derivative version used at each node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSegment {
    nodes: Vec<u32>,
    versions: Vec<u32>,
}

impl NetworkSegment {
    /// Creates a segment through `nodes` using `versions`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two nodes are given or the version
    /// list does not match the node list.
    pub fn new(nodes: Vec<u32>, versions: Vec<u32>) -> Result<Self> {
        if nodes.len() < 2 {
            return Err(GeometryError::Degenerate("a segment needs at least two nodes".into()).into());
        }
        if versions.len() != nodes.len() {
            return Err(GeometryError::MismatchedLengths(format!(
                "{} nodes, {} versions",
                nodes.len(),
                versions.len()
            ))
            .into());
        }
        Ok(Self { nodes, versions })
    }

    /// Node identifiers from start to end.
    #[must_use]
    pub fn node_ids(&self) -> &[u32] {
        &self.nodes
    }

    /// Derivative version at each node.
    #[must_use]
    pub fn versions(&self) -> &[u32] {
        &self.versions
    }

    /// `(node, version)` at the start.
    #[must_use]
    pub fn start(&self) -> (u32, u32) {
        (self.nodes[0], self.versions[0])
    }

    /// `(node, version)` at the end.
    #[must_use]
    pub fn end(&self) -> (u32, u32) {
        let last = self.nodes.len() - 1;
        (self.nodes[last], self.versions[last])
    }

    /// Nodes strictly between the start and end.
    #[must_use]
    pub fn interior_nodes(&self) -> &[u32] {
        &self.nodes[1..self.nodes.len() - 1]
    }

    /// Number of control-point intervals.
    #[must_use]
    pub fn interval_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns true if the segment starts and ends on the same node.
    #[must_use]
    pub fn is_closed_loop(&self) -> bool {
        self.nodes[0] == self.nodes[self.nodes.len() - 1]
    }

    /// Truncates this segment to end at interior node `node` and returns the
    /// remainder, which starts there. Both keep the version used at `node`.
    ///
    /// Returns `None` if `node` is not interior.
    pub(crate) fn split_at_node(&mut self, node: u32) -> Option<NetworkSegment> {
        let index = self.interior_nodes().iter().position(|&id| id == node)? + 1;
        let remainder = NetworkSegment {
            nodes: self.nodes[index..].to_vec(),
            versions: self.versions[index..].to_vec(),
        };
        self.nodes.truncate(index + 1);
        self.versions.truncate(index + 1);
        Some(remainder)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_or_mismatched() {
        assert!(NetworkSegment::new(vec![1], vec![1]).is_err());
        assert!(NetworkSegment::new(vec![1, 2], vec![1]).is_err());
    }

    #[test]
    fn split_keeps_version_on_both_halves() {
        let mut segment = NetworkSegment::new(vec![1, 2, 3, 4], vec![1, 1, 2, 1]).unwrap();
        let rest = segment.split_at_node(3).unwrap();
        assert_eq!(segment.node_ids(), &[1, 2, 3]);
        assert_eq!(segment.end(), (3, 2));
        assert_eq!(rest.start(), (3, 2));
        assert_eq!(rest.node_ids(), &[3, 4]);
    }

    #[test]
    fn split_at_end_node_is_refused() {
        let mut segment = NetworkSegment::new(vec![1, 2, 3], vec![1, 1, 1]).unwrap();
        assert!(segment.split_at_node(1).is_none());
        assert!(segment.split_at_node(3).is_none());
        assert_eq!(segment.interval_count(), 2);
    }

    #[test]
    fn loop_is_detected() {
        let segment = NetworkSegment::new(vec![1, 2, 3, 1], vec![1; 4]).unwrap();
        assert!(segment.is_closed_loop());
        assert_eq!(segment.interior_nodes(), &[2, 3]);
    }
}
