use std::collections::BTreeMap;

use super::NetworkSegment;

/// Which end of a segment meets a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndRole {
    Start,
    End,
}

/// One segment end incident on a junction node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentEnd {
    /// Index of the segment in definition order.
    pub segment: usize,
    pub role: EndRole,
    /// Derivative version the segment uses at the junction node.
    pub version: u32,
}

/// A node where segment ends meet and derivatives must be reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    node: u32,
    ends: Vec<SegmentEnd>,
}

impl Junction {
    /// Returns the junction node identifier.
    #[must_use]
    pub fn node(&self) -> u32 {
        self.node
    }

    /// Incident segment ends in segment definition order, start before end.
    #[must_use]
    pub fn ends(&self) -> &[SegmentEnd] {
        &self.ends
    }

    /// Incident ends grouped by the node version they use.
    #[must_use]
    pub fn version_groups(&self) -> BTreeMap<u32, Vec<SegmentEnd>> {
        let mut groups: BTreeMap<u32, Vec<SegmentEnd>> = BTreeMap::new();
        for end in &self.ends {
            groups.entry(end.version).or_default().push(*end);
        }
        groups
    }
}

/// Segment ends that share one derivative version of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedVersion {
    pub node: u32,
    pub version: u32,
    /// At least two ends, in segment order.
    pub ends: Vec<SegmentEnd>,
}

/// Groups the ends incident on `node` by version, keeping groups of two or
/// more ends.
pub(crate) fn shared_versions_at(segments: &[NetworkSegment], node: u32) -> Vec<SharedVersion> {
    let mut groups: BTreeMap<u32, Vec<SegmentEnd>> = BTreeMap::new();
    for end in incident_ends(segments, node) {
        groups.entry(end.version).or_default().push(end);
    }
    groups
        .into_iter()
        .filter(|(_, ends)| ends.len() >= 2)
        .map(|(version, ends)| SharedVersion { node, version, ends })
        .collect()
}

/// Segment ends incident on `node`, in segment order.
pub(crate) fn incident_ends(segments: &[NetworkSegment], node: u32) -> Vec<SegmentEnd> {
    let mut ends = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        let (start, start_version) = segment.start();
        if start == node {
            ends.push(SegmentEnd {
                segment: index,
                role: EndRole::Start,
                version: start_version,
            });
        }
        let (end, end_version) = segment.end();
        if end == node {
            ends.push(SegmentEnd {
                segment: index,
                role: EndRole::End,
                version: end_version,
            });
        }
    }
    ends
}

/// Classifies `node` from its incident ends: three or more ends, or both
/// ends of one closed segment.
pub(crate) fn junction_at(segments: &[NetworkSegment], node: u32) -> Option<Junction> {
    let ends = incident_ends(segments, node);
    let is_junction = ends.len() >= 3 || (ends.len() == 2 && ends[0].segment == ends[1].segment);
    is_junction.then_some(Junction { node, ends })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(nodes: &[u32], versions: &[u32]) -> NetworkSegment {
        NetworkSegment::new(nodes.to_vec(), versions.to_vec()).unwrap()
    }

    #[test]
    fn three_ends_make_a_junction() {
        let segments = vec![seg(&[1, 2], &[1, 1]), seg(&[2, 3], &[1, 1]), seg(&[2, 4], &[2, 1])];
        let junction = junction_at(&segments, 2).unwrap();
        assert_eq!(junction.ends().len(), 3);
        assert_eq!(junction.ends()[0].role, EndRole::End);
        let groups = junction.version_groups();
        assert_eq!(groups[&1].len(), 2);
        assert_eq!(groups[&2].len(), 1);
    }

    #[test]
    fn pass_through_node_is_not_a_junction() {
        let segments = vec![seg(&[1, 2], &[1, 1]), seg(&[2, 3], &[2, 1])];
        assert!(junction_at(&segments, 2).is_none());
        assert!(junction_at(&segments, 1).is_none());
        assert!(shared_versions_at(&segments, 2).is_empty());
    }

    #[test]
    fn pass_through_node_can_share_a_version() {
        let segments = vec![seg(&[1, 2], &[1, 1]), seg(&[2, 3], &[1, 1])];
        assert!(junction_at(&segments, 2).is_none());
        let shared = shared_versions_at(&segments, 2);
        assert_eq!(shared.len(), 1);
        assert_eq!((shared[0].node, shared[0].version), (2, 1));
        assert_eq!(shared[0].ends[0].role, EndRole::End);
        assert_eq!(shared[0].ends[1].role, EndRole::Start);
    }

    #[test]
    fn closed_loop_end_is_a_junction() {
        let segments = vec![seg(&[1, 2, 3, 1], &[1, 1, 1, 1])];
        let junction = junction_at(&segments, 1).unwrap();
        assert_eq!(junction.ends().len(), 2);
        assert!(junction_at(&segments, 2).is_none());
    }
}
