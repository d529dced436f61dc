//! Joints: the kinematic pairs that connect links.

use pm_core::{JointId, LinkId, Vec2};
use std::fmt;
use std::str::FromStr;

/// Kind of kinematic pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Revolute pin joint.
    R,
    /// Prismatic slider: translation along a slot, no relative rotation.
    P,
    /// Pin in a slot: translation along the slot plus rotation.
    RP,
    /// Pitch point of a gear pair.
    G,
}

impl JointType {
    /// Number of position values expected for this joint type.
    pub fn coordinate_count(self) -> usize {
        match self {
            JointType::P | JointType::RP => 3,
            JointType::R | JointType::G => 2,
        }
    }

    /// Sliding joints carry a slot line on their second link.
    pub fn is_sliding(self) -> bool {
        matches!(self, JointType::P | JointType::RP)
    }

    /// Lower pairs remove two freedoms, higher pairs one.
    pub fn is_lower_pair(self) -> bool {
        matches!(self, JointType::R | JointType::P)
    }

    pub fn code(self) -> &'static str {
        match self {
            JointType::R => "R",
            JointType::P => "P",
            JointType::RP => "RP",
            JointType::G => "G",
        }
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for JointType {
    type Err = String;

    /// Accepts bare codes (`r`, `RP`) and the descriptive labels used by
    /// editors (`R (pin joint)`, `G (gear teeth)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.split_whitespace().next().unwrap_or("");
        match code.to_ascii_uppercase().as_str() {
            "R" => Ok(JointType::R),
            "P" => Ok(JointType::P),
            "RP" => Ok(JointType::RP),
            "G" => Ok(JointType::G),
            _ => Err(s.to_string()),
        }
    }
}

/// A joint of the mechanism.
///
/// For sliding joints `link1` carries the block (the joint point is fixed on
/// it) and `link2` carries the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub joint_type: JointType,
    pub link1: LinkId,
    pub link2: Option<LinkId>,
    /// Position in the initial configuration.
    pub initial: Vec2,
    /// Absolute slide angle in the initial configuration (radians).
    pub slide_angle_initial: f64,
    /// Slide angle measured from the slot link's angle.
    pub slide_offset: f64,
    /// Row of this joint in the caller's input.
    pub input_index: usize,
}

impl Joint {
    /// Is the joint point rigidly attached to `link`?
    pub fn fixed_with_respect_to(&self, link: LinkId) -> bool {
        match self.joint_type {
            JointType::R => self.link1 == link || self.link2 == Some(link),
            JointType::P | JointType::RP => self.link1 == link,
            JointType::G => false,
        }
    }

    /// Does the joint slide along a slot carried by `link`?
    pub fn sliding_with_respect_to(&self, link: LinkId) -> bool {
        self.joint_type.is_sliding() && self.link2 == Some(link)
    }

    pub fn connects(&self, link: LinkId) -> bool {
        self.link1 == link || self.link2 == Some(link)
    }

    /// The link on the other side of the joint.
    pub fn other_link(&self, link: LinkId) -> Option<LinkId> {
        if self.link1 == link {
            self.link2
        } else if self.link2 == Some(link) {
            Some(self.link1)
        } else {
            None
        }
    }

    /// The slot link of a sliding joint.
    pub fn slot_link(&self) -> Option<LinkId> {
        if self.joint_type.is_sliding() {
            self.link2
        } else {
            None
        }
    }

    /// Counts toward the Gruebler sum only when it joins two links.
    pub fn is_pair(&self) -> bool {
        self.link2.is_some()
    }
}
