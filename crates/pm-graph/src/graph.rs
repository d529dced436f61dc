//! The validated, immutable mechanism graph.

use pm_core::{JointId, LinkId};

use crate::error::{GraphError, GraphResult};
use crate::gear::GearData;
use crate::joint::{Joint, JointType};
use crate::link::Link;
use crate::ordering::EntityOrder;

/// How the driving joint moves the mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The input link turns about a ground pivot.
    Rotary,
    /// The input joint slides. With the slot on ground the input link
    /// carries the block; otherwise the input link carries the slot and
    /// moves opposite to the slide travel.
    Prismatic { slot_on_ground: bool },
}

/// The mechanism: joints, links and derived indices.
///
/// Joints and links are stored in internal order (see [`EntityOrder`]); ids
/// are positions in these vectors.
#[derive(Debug, Clone)]
pub struct MechanismGraph {
    pub(crate) joints: Vec<Joint>,
    pub(crate) links: Vec<Link>,
    pub(crate) gears: Vec<GearData>,
    pub(crate) order: EntityOrder,
    pub(crate) input_kind: InputKind,
    pub(crate) ground: LinkId,
    pub(crate) input_joint: JointId,
    pub(crate) input_link: LinkId,
    pub(crate) average_link_length: f64,
}

impl MechanismGraph {
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.ix())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.ix())
    }

    pub fn gears(&self) -> &[GearData] {
        &self.gears
    }

    /// Gear record for a `G` joint.
    pub fn gear_for(&self, joint: JointId) -> Option<&GearData> {
        self.gears.iter().find(|g| g.joint == joint)
    }

    pub fn order(&self) -> &EntityOrder {
        &self.order
    }

    pub fn ground(&self) -> LinkId {
        self.ground
    }

    pub fn input_joint(&self) -> JointId {
        self.input_joint
    }

    pub fn input_link(&self) -> LinkId {
        self.input_link
    }

    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    pub fn first_input_joint_index(&self) -> usize {
        self.order.first_input_joint_index()
    }

    /// Average rigid length over all links; scales tolerances and limits.
    pub fn average_link_length(&self) -> f64 {
        self.average_link_length
    }

    pub fn max_link_length(&self) -> f64 {
        self.links.iter().map(Link::max_length).fold(0.0, f64::max)
    }

    pub fn link_by_name(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Joints in the order they were supplied.
    pub fn joints_in_input_order(&self) -> &[JointId] {
        self.order.joints_by_input()
    }

    /// Links in order of first mention.
    pub fn links_in_input_order(&self) -> &[LinkId] {
        self.order.links_by_input()
    }

    /// Joints rigidly attached to `link`.
    pub fn fixed_joints(&self, link: LinkId) -> impl Iterator<Item = JointId> + '_ {
        self.links[link.ix()]
            .joints
            .iter()
            .copied()
            .filter(move |j| self.joints[j.ix()].fixed_with_respect_to(link))
    }

    /// Joints sliding in a slot carried by `link`.
    pub fn sliding_joints(&self, link: LinkId) -> impl Iterator<Item = JointId> + '_ {
        self.links[link.ix()]
            .joints
            .iter()
            .copied()
            .filter(move |j| self.joints[j.ix()].sliding_with_respect_to(link))
    }

    /// Gruebler–Kutzbach mobility: `3(n - 1) - 2 (R + P) - (RP + G)`,
    /// counting only joints that connect two links.
    pub fn degrees_of_freedom(&self) -> i32 {
        let n = self.links.len() as i32;
        let (lower, higher) = self
            .joints
            .iter()
            .filter(|j| j.is_pair())
            .fold((0, 0), |(lo, hi), j| {
                if j.joint_type.is_lower_pair() {
                    (lo + 1, hi)
                } else {
                    (lo, hi + 1)
                }
            });
        3 * (n - 1) - 2 * lower - higher
    }

    /// Fail unless the mechanism has exactly one degree of freedom.
    pub fn require_single_dof(&self) -> GraphResult<()> {
        match self.degrees_of_freedom() {
            1 => Ok(()),
            dof => Err(GraphError::DegreesOfFreedom { dof }),
        }
    }

    /// Number of joints of each type, as `[R, P, RP, G]`.
    pub fn joint_type_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for j in &self.joints {
            let slot = match j.joint_type {
                JointType::R => 0,
                JointType::P => 1,
                JointType::RP => 2,
                JointType::G => 3,
            };
            counts[slot] += 1;
        }
        counts
    }
}
