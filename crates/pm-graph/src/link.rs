//! Links: rigid bodies carrying joints.

use pm_core::constants::EPSILON_SAME;
use pm_core::geometry::{angle, distance, signed_distance_to_line};
use pm_core::{JointId, LinkId, Vec2};

use crate::joint::Joint;
use crate::pair_map::PairMap;

/// A rigid link of the mechanism.
///
/// Pairwise geometry is keyed by the *local* index of a joint in
/// [`Link::joints`]:
/// - `lengths`: distance between two joints both fixed to the link
/// - `distance_to_slide_line`: signed offset of a fixed joint (first key) from
///   the slot line of a joint sliding on this link (second key)
///
/// A block carried by a `P` joint turns with its slot, so its pose follows
/// from the slot angle and needs no map of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub is_ground: bool,
    /// Incident joints, sorted by internal id.
    pub joints: Vec<JointId>,
    /// Joint whose initial position anchors the link frame.
    pub reference: Option<JointId>,
    /// Initial position of the reference joint.
    pub origin_initial: Vec2,
    pub angle_initial: f64,
    pub lengths: PairMap,
    pub distance_to_slide_line: PairMap,
    /// Position of the link in order of first mention.
    pub input_index: usize,
}

impl Link {
    pub fn new(id: LinkId, name: impl Into<String>, is_ground: bool, input_index: usize) -> Self {
        Self {
            id,
            name: name.into(),
            is_ground,
            joints: Vec::new(),
            reference: None,
            origin_initial: Vec2::zeros(),
            angle_initial: 0.0,
            lengths: PairMap::default(),
            distance_to_slide_line: PairMap::default(),
            input_index,
        }
    }

    /// Local index of `joint` in this link's joint list.
    pub fn local_index(&self, joint: JointId) -> Option<usize> {
        self.joints.iter().position(|&j| j == joint)
    }

    /// Rigid distance between two joints fixed to this link.
    pub fn length_between(&self, a: JointId, b: JointId) -> Option<f64> {
        let i = self.local_index(a)?;
        let j = self.local_index(b)?;
        self.lengths.symmetric(i, j)
    }

    /// Signed offset of `fixed` from the slot line of `sliding`.
    pub fn distance_to_slide(&self, fixed: JointId, sliding: JointId) -> Option<f64> {
        let i = self.local_index(fixed)?;
        let j = self.local_index(sliding)?;
        self.distance_to_slide_line.signed(i, j)
    }

    pub fn max_length(&self) -> f64 {
        self.lengths.values().fold(0.0, f64::max)
    }

    /// Sum of the rigid joint-to-joint lengths.
    pub fn total_length(&self) -> f64 {
        self.lengths.values().sum()
    }

    /// Number of rigid pairs longer than `EPSILON_SAME`.
    pub fn rigid_pair_count(&self) -> usize {
        self.lengths.values().filter(|&v| v > EPSILON_SAME).count()
    }

    /// Fill the reference frame and the pairwise maps from the initial
    /// joint positions.
    ///
    /// The reference joint is the fixed joint with the smallest initial `x`
    /// (ties broken by `y`); the initial angle points from it to the next
    /// one in that order. Links with fewer than two fixed joints, and ground,
    /// start at angle zero.
    pub fn determine_lengths_and_references(&mut self, joints: &[Joint]) {
        let n = self.joints.len();
        self.lengths = PairMap::new(n);
        self.distance_to_slide_line = PairMap::new(n);

        let mut fixed: Vec<JointId> = self
            .joints
            .iter()
            .copied()
            .filter(|j| joints[j.ix()].fixed_with_respect_to(self.id))
            .collect();
        fixed.sort_by(|a, b| {
            let pa = joints[a.ix()].initial;
            let pb = joints[b.ix()].initial;
            pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
        });

        self.reference = fixed.first().copied();
        self.origin_initial = self
            .reference
            .map(|r| joints[r.ix()].initial)
            .unwrap_or_else(Vec2::zeros);
        self.angle_initial = 0.0;
        if !self.is_ground {
            if let Some(second) = fixed
                .iter()
                .skip(1)
                .find(|j| distance(&joints[j.ix()].initial, &self.origin_initial) > 0.0)
            {
                self.angle_initial = angle(&self.origin_initial, &joints[second.ix()].initial);
            }
        }

        for i in 0..n {
            let ji = &joints[self.joints[i].ix()];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let jj = &joints[self.joints[j].ix()];
                let i_fixed = ji.fixed_with_respect_to(self.id);
                let j_fixed = jj.fixed_with_respect_to(self.id);
                if i < j && i_fixed && j_fixed {
                    self.lengths
                        .insert_symmetric(i, j, distance(&ji.initial, &jj.initial));
                }
                if i_fixed && jj.sliding_with_respect_to(self.id) {
                    self.distance_to_slide_line.insert_directed(
                        i,
                        j,
                        signed_distance_to_line(&ji.initial, &jj.initial, jj.slide_angle_initial),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointType;
    use pm_core::Id;
    use std::f64::consts::FRAC_PI_2;

    fn joint(ix: u32, jt: JointType, l1: u32, l2: Option<u32>, x: f64, y: f64, a: f64) -> Joint {
        Joint {
            id: Id::from_index(ix),
            joint_type: jt,
            link1: Id::from_index(l1),
            link2: l2.map(Id::from_index),
            initial: Vec2::new(x, y),
            slide_angle_initial: a,
            slide_offset: 0.0,
            input_index: ix as usize,
        }
    }

    #[test]
    fn lengths_and_reference_angle() {
        let joints = vec![
            joint(0, JointType::R, 0, Some(1), 3.0, 4.0, 0.0),
            joint(1, JointType::R, 0, Some(2), 0.0, 0.0, 0.0),
        ];
        let mut link = Link::new(Id::from_index(0), "coupler", false, 0);
        link.joints = vec![Id::from_index(0), Id::from_index(1)];
        link.determine_lengths_and_references(&joints);

        assert_eq!(link.reference, Some(Id::from_index(1)));
        assert!((link.angle_initial - (4.0_f64).atan2(3.0)).abs() < 1e-12);
        let l = link
            .length_between(Id::from_index(1), Id::from_index(0))
            .unwrap();
        assert!((l - 5.0).abs() < 1e-12);
        assert!((link.max_length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn slot_offsets_are_signed() {
        // slider block on link 1 riding a horizontal slot on link 0
        let joints = vec![
            joint(0, JointType::P, 1, Some(0), 2.0, 0.0, 0.0),
            joint(1, JointType::R, 0, Some(2), 0.0, 3.0, 0.0),
        ];
        let mut slot = Link::new(Id::from_index(0), "rail", false, 0);
        slot.joints = vec![Id::from_index(0), Id::from_index(1)];
        slot.determine_lengths_and_references(&joints);

        let d = slot
            .distance_to_slide(Id::from_index(1), Id::from_index(0))
            .unwrap();
        assert!((d - 3.0).abs() < 1e-12);
        let reversed = slot
            .distance_to_slide(Id::from_index(0), Id::from_index(1))
            .unwrap();
        assert!((reversed + 3.0).abs() < 1e-12);
        // a sliding joint is not rigidly fixed to its slot link
        assert!(slot.lengths.is_empty());
    }

    #[test]
    fn block_keeps_rigid_pairs_with_its_pins() {
        let joints = vec![
            joint(0, JointType::P, 0, Some(1), 0.0, 0.0, 0.0),
            joint(1, JointType::R, 0, Some(2), 0.0, 2.0, 0.0),
            joint(2, JointType::R, 0, Some(3), 0.0, 2.0, 0.0),
        ];
        let mut block = Link::new(Id::from_index(0), "block", false, 0);
        block.joints = vec![Id::from_index(0), Id::from_index(1), Id::from_index(2)];
        block.determine_lengths_and_references(&joints);
        // the block joint is fixed on its own link; the last two coincide
        assert!((block.total_length() - 4.0).abs() < 1e-12);
        assert_eq!(block.rigid_pair_count(), 2);
        assert!((block.angle_initial - FRAC_PI_2).abs() < 1e-12);
    }
}
