//! Default geometry for a freshly parsed network.
//!
//! Nodes are layered along the network by integer `x`; nodes sharing a layer
//! are spread evenly in `y`. Each version gets a unit `d1` pointing from the
//! previous to the next node it connects, `d3 = (0, 0, 0.1)` and
//! `d2 = d3 x d1`.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::geometry::Derivatives;
use crate::math::{normalize_or_zero, Point3, Vector3};

use super::{NetworkNode, NetworkSegment};

const DEFAULT_D3: Vector3 = Vector3::new(0.0, 0.0, 0.1);

/// True if following out segments from the end of `segment` leads back to
/// its start node.
fn closes_cycle(
    segment: &NetworkSegment,
    nodes: &[NetworkNode],
    index: &HashMap<u32, usize>,
    segments: &[NetworkSegment],
) -> bool {
    let (start, _) = segment.start();
    let (end, _) = segment.end();
    let mut visited = HashSet::from([end]);
    let mut pending = vec![end];
    while let Some(id) = pending.pop() {
        if id == start {
            return true;
        }
        let Some(&i) = index.get(&id) else {
            continue;
        };
        for &s in nodes[i].out_segments() {
            let (next, _) = segments[s].end();
            if visited.insert(next) {
                pending.push(next);
            }
        }
    }
    false
}

fn assign_layers(nodes: &mut [NetworkNode], index: &HashMap<u32, usize>, segments: &[NetworkSegment]) {
    let cyclic: Vec<bool> = segments
        .iter()
        .map(|segment| closes_cycle(segment, nodes, index, segments))
        .collect();
    let mut layers: Vec<Option<usize>> = vec![None; nodes.len()];
    // Bounded so a closed loop cannot push layers forever.
    for _ in 0..segments.len() {
        let mut changes = 0;
        for (segment, &cyclic) in segments.iter().zip(&cyclic) {
            let (start, _) = segment.start();
            let mut layer = index.get(&start).and_then(|&i| layers[i]).unwrap_or(0);
            let last = segment.node_ids().len() - 1;
            for (k, id) in segment.node_ids().iter().enumerate() {
                // The node closing a cycle keeps its earlier layer.
                let closing = k == last && cyclic;
                if let Some(&i) = index.get(id) {
                    if layers[i].is_none_or(|existing| existing < layer && !closing) {
                        layers[i] = Some(layer);
                        changes += 1;
                    }
                }
                layer += 1;
            }
        }
        if changes == 0 {
            break;
        }
    }
    for (node, layer) in nodes.iter_mut().zip(layers) {
        node.set_layer(layer.unwrap_or(0));
    }
}

fn place_layers(nodes: &mut [NetworkNode]) {
    let Some(max_layer) = nodes.iter().map(NetworkNode::layer).max() else {
        return;
    };
    let mut by_layer: Vec<Vec<usize>> = vec![Vec::new(); max_layer + 1];
    for (i, node) in nodes.iter().enumerate() {
        by_layer[node.layer()].push(i);
    }
    for (layer, members) in by_layer.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let range = members.len().saturating_sub(1) as f64;
        for (iy, &i) in members.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = if members.len() > 1 {
                range * (-0.5 + iy as f64 / range)
            } else {
                0.0
            };
            #[allow(clippy::cast_precision_loss)]
            nodes[i].set_position(Point3::new(layer as f64, y, 0.0));
        }
    }
}

/// Neighbouring node ids of `node` along the segments using `version` there.
fn neighbours(node: &NetworkNode, version: u32, segments: &[NetworkSegment]) -> (Option<u32>, Option<u32>) {
    if let Some(s) = node.interior_segment() {
        let ids = segments[s].node_ids();
        if let Some(k) = ids[1..ids.len() - 1].iter().position(|&id| id == node.id()) {
            return (Some(ids[k]), Some(ids[k + 2]));
        }
    }
    let prev = node
        .in_segments()
        .iter()
        .map(|&s| &segments[s])
        .find(|segment| segment.end().1 == version)
        .map(|segment| segment.node_ids()[segment.node_ids().len() - 2]);
    let next = node
        .out_segments()
        .iter()
        .map(|&s| &segments[s])
        .find(|segment| segment.start().1 == version)
        .map(|segment| segment.node_ids()[1]);
    (prev, next)
}

/// Lays out positions and derivatives of every node version.
///
/// Versions no segment connects to keep their previous derivatives and are
/// reported with a warning.
pub(crate) fn apply_default_layout(
    nodes: &mut [NetworkNode],
    index: &HashMap<u32, usize>,
    segments: &[NetworkSegment],
) -> Result<()> {
    assign_layers(nodes, index, segments);
    place_layers(nodes);
    let positions: Vec<Point3> = nodes.iter().map(|n| *n.position()).collect();
    let at = |id: u32| index.get(&id).map_or_else(Point3::origin, |&i| positions[i]);

    for node in nodes.iter_mut() {
        for version in 1..=node.version_count() {
            let here = *node.position();
            let d1 = match neighbours(node, version, segments) {
                (Some(prev), Some(next)) => at(next) - at(prev),
                (Some(prev), None) => here - at(prev),
                (None, Some(next)) => at(next) - here,
                (None, None) => {
                    tracing::warn!(node = node.id(), version, "no segment defines derivative version");
                    continue;
                }
            };
            let d1 = normalize_or_zero(&d1);
            node.set_derivatives(version, Derivatives::new(d1, DEFAULT_D3.cross(&d1), DEFAULT_D3))?;
        }
    }
    Ok(())
}
