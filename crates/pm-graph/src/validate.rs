//! Mechanism validation logic.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use std::collections::HashSet;

use pm_core::LinkId;

use crate::error::{GraphError, GraphResult};
use crate::joint::{Joint, JointType};
use crate::link::Link;

/// Check the link names of one input row.
pub(crate) fn validate_row_links(row: usize, joint_type: JointType, links: &[String]) -> GraphResult<()> {
    if links.is_empty() || links.iter().any(|l| l.is_empty()) {
        return Err(GraphError::MissingLinkNames { row });
    }
    if links.len() > 2 {
        return Err(GraphError::TooManyLinks {
            row,
            count: links.len(),
        });
    }
    if links.len() == 2 && links[0] == links[1] {
        return Err(GraphError::DuplicateLink {
            row,
            link: links[0].clone(),
        });
    }
    if links.len() == 1 && joint_type != JointType::R {
        return Err(GraphError::DanglingJoint { row });
    }
    Ok(())
}

/// Validate joint/link cross references and per-link requirements.
pub(crate) fn validate_structure(joints: &[Joint], links: &[Link]) -> GraphResult<()> {
    for joint in joints {
        for link in std::iter::once(joint.link1).chain(joint.link2) {
            let Some(l) = links.get(link.ix()) else {
                return Err(GraphError::InvalidLinkRef {
                    joint: joint.id,
                    link,
                });
            };
            if !l.joints.contains(&joint.id) {
                return Err(GraphError::InconsistentIncidence {
                    joint: joint.id,
                    link,
                });
            }
        }
    }

    for link in links {
        for &j in &link.joints {
            let connected = joints.get(j.ix()).is_some_and(|joint| joint.connects(link.id));
            if !connected {
                return Err(GraphError::InconsistentIncidence { joint: j, link: link.id });
            }
        }
        if link.is_ground {
            continue;
        }
        let has_fixed = link
            .joints
            .iter()
            .any(|j| joints[j.ix()].fixed_with_respect_to(link.id));
        if !has_fixed {
            return Err(GraphError::NoFixedJoint { link: link.id });
        }
    }
    Ok(())
}

/// Every link must be reachable from ground through joints.
pub(crate) fn validate_connectivity(joints: &[Joint], links: &[Link], ground: LinkId) -> GraphResult<()> {
    let mut graph: UnGraph<(), ()> = UnGraph::with_capacity(links.len(), joints.len());
    let nodes: Vec<NodeIndex> = links.iter().map(|_| graph.add_node(())).collect();
    for joint in joints {
        if let Some(link2) = joint.link2 {
            graph.add_edge(nodes[joint.link1.ix()], nodes[link2.ix()], ());
        }
    }

    let mut reached = HashSet::new();
    let mut bfs = Bfs::new(&graph, nodes[ground.ix()]);
    while let Some(node) = bfs.next(&graph) {
        reached.insert(node);
    }

    match links.iter().find(|l| !reached.contains(&nodes[l.id.ix()])) {
        Some(link) => Err(GraphError::Disconnected {
            link: link.name.clone(),
        }),
        None => Ok(()),
    }
}
