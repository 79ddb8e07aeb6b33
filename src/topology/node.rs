use std::collections::BTreeSet;

use crate::error::{Result, TopologyError};
use crate::geometry::{ControlPoint, Derivatives};
use crate::math::Point3;

/// A node of the network graph.
///
/// Every version shares the single position; only the derivative record
/// differs between versions. Versions are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkNode {
    id: u32,
    position: Point3,
    versions: Vec<Derivatives>,
    versions_used: BTreeSet<u32>,
    in_segments: Vec<usize>,
    out_segments: Vec<usize>,
    interior_segment: Option<usize>,
    layer: usize,
    registered: bool,
}

impl NetworkNode {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            position: Point3::origin(),
            versions: Vec::new(),
            versions_used: BTreeSet::new(),
            in_segments: Vec::new(),
            out_segments: Vec::new(),
            interior_segment: None,
            layer: 0,
            registered: false,
        }
    }

    /// Returns the node identifier.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the position shared by all versions.
    #[must_use]
    pub fn position(&self) -> &Point3 {
        &self.position
    }

    /// Returns the number of derivative versions.
    #[must_use]
    pub fn version_count(&self) -> u32 {
        u32::try_from(self.versions.len()).unwrap_or(u32::MAX)
    }

    /// Returns the derivative record of `version`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::VersionOutOfRange`] if the node has no such version.
    pub fn derivatives(&self, version: u32) -> Result<&Derivatives> {
        version
            .checked_sub(1)
            .and_then(|i| self.versions.get(i as usize))
            .ok_or_else(|| self.out_of_range(version).into())
    }

    /// Returns the position and derivatives of `version` as a control point.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::VersionOutOfRange`] if the node has no such version.
    pub fn control_point(&self, version: u32) -> Result<ControlPoint> {
        Ok(self.derivatives(version)?.at(self.position))
    }

    /// Indices of segments ending on this node.
    #[must_use]
    pub fn in_segments(&self) -> &[usize] {
        &self.in_segments
    }

    /// Indices of segments starting on this node.
    #[must_use]
    pub fn out_segments(&self) -> &[usize] {
        &self.out_segments
    }

    /// Index of the segment this node is interior to, if any.
    #[must_use]
    pub fn interior_segment(&self) -> Option<usize> {
        self.interior_segment
    }

    /// Integer layer along the network used by the default layout.
    #[must_use]
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Returns true if some segment references this node.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Returns true if every declared version is used by a segment.
    ///
    /// Logs a warning for each unused version.
    pub fn check_versions(&self) -> bool {
        let mut all_used = true;
        for version in 1..=self.version_count() {
            if !self.versions_used.contains(&version) {
                tracing::warn!(
                    node = self.id,
                    version,
                    count = self.version_count(),
                    "node does not use derivative version"
                );
                all_used = false;
            }
        }
        all_used
    }

    pub(crate) fn define_version(&mut self, version: u32) {
        let count = self.versions.len().max(version as usize);
        self.versions.resize(count, Derivatives::default());
        self.versions_used.insert(version);
    }

    pub(crate) fn mark_registered(&mut self) {
        self.registered = true;
    }

    pub(crate) fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    pub(crate) fn set_derivatives(&mut self, version: u32, derivatives: Derivatives) -> Result<()> {
        let slot = version
            .checked_sub(1)
            .and_then(|i| self.versions.get_mut(i as usize));
        match slot {
            Some(slot) => {
                *slot = derivatives;
                Ok(())
            }
            None => Err(self.out_of_range(version).into()),
        }
    }

    pub(crate) fn set_layer(&mut self, layer: usize) {
        self.layer = layer;
    }

    pub(crate) fn connect(&mut self, in_segments: Vec<usize>, out_segments: Vec<usize>, interior: Option<usize>) {
        self.in_segments = in_segments;
        self.out_segments = out_segments;
        self.interior_segment = interior;
    }

    fn out_of_range(&self, version: u32) -> TopologyError {
        TopologyError::VersionOutOfRange {
            node: self.id,
            version,
            count: self.version_count(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    #[test]
    fn explicit_version_raises_count() {
        let mut node = NetworkNode::new(7);
        node.define_version(3);
        assert_eq!(node.version_count(), 3);
        assert!(!node.check_versions());
        node.define_version(1);
        node.define_version(2);
        assert!(node.check_versions());
    }

    #[test]
    fn version_lookup_is_bounded() {
        let mut node = NetworkNode::new(1);
        node.define_version(1);
        assert!(node.derivatives(1).is_ok());
        assert!(node.derivatives(0).is_err());
        assert!(node.derivatives(2).is_err());
        assert!(node.set_derivatives(2, Derivatives::default()).is_err());
    }

    #[test]
    fn control_point_uses_shared_position() {
        let mut node = NetworkNode::new(1);
        node.define_version(2);
        node.set_position(Point3::new(1.0, 2.0, 3.0));
        let d = Derivatives::new(Vector3::z(), Vector3::x(), Vector3::y());
        node.set_derivatives(2, d).unwrap();
        let cp = node.control_point(2).unwrap();
        assert_eq!(cp.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(cp.d1, Vector3::z());
        assert_eq!(node.control_point(1).unwrap().position, cp.position);
    }
}
