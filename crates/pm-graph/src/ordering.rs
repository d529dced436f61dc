//! Internal ordering of joints and links.
//!
//! Solvers address joints and links by contiguous internal indices. The
//! builder arranges them so that joints which must be located every step
//! come first, followed by the driving joint and finally the joints pinned to
//! ground. Links follow the same idea: free links, the input link, ground.
//! `EntityOrder` keeps the bidirectional mapping to the caller's row order,
//! which is what results are reported in.

use pm_core::{Id, JointId, LinkId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOrder {
    /// Internal joint id for each input row.
    joints_by_input: Vec<JointId>,
    /// Internal link id for each link, in order of first mention.
    links_by_input: Vec<LinkId>,
    /// Number of joints placed before the input joint.
    first_input_joint_index: usize,
}

impl EntityOrder {
    /// Arrange joints and links.
    ///
    /// `ground_fixed[row]` marks joints that cannot move. `input_link` and
    /// `ground` are positions in link input order.
    pub fn arrange(
        ground_fixed: &[bool],
        link_count: usize,
        input_link: usize,
        ground: usize,
    ) -> Self {
        let n = ground_fixed.len();
        let mut internal: Vec<usize> = Vec::with_capacity(n);
        internal.extend((1..n).filter(|&row| !ground_fixed[row]));
        let first_input_joint_index = internal.len();
        if n > 0 {
            internal.push(0);
        }
        internal.extend((1..n).filter(|&row| ground_fixed[row]));

        let mut joints_by_input = vec![Id::from_index(0); n];
        for (position, &row) in internal.iter().enumerate() {
            joints_by_input[row] = Id::from_usize(position);
        }

        let mut link_internal: Vec<usize> = (0..link_count)
            .filter(|&l| l != input_link && l != ground)
            .collect();
        if input_link != ground {
            link_internal.push(input_link);
        }
        link_internal.push(ground);

        let mut links_by_input = vec![Id::from_index(0); link_count];
        for (position, &l) in link_internal.iter().enumerate() {
            links_by_input[l] = Id::from_usize(position);
        }

        Self {
            joints_by_input,
            links_by_input,
            first_input_joint_index,
        }
    }

    pub fn joint(&self, row: usize) -> Option<JointId> {
        self.joints_by_input.get(row).copied()
    }

    pub fn link(&self, position: usize) -> Option<LinkId> {
        self.links_by_input.get(position).copied()
    }

    /// Internal joint ids in input order.
    pub fn joints_by_input(&self) -> &[JointId] {
        &self.joints_by_input
    }

    /// Internal link ids in order of first mention.
    pub fn links_by_input(&self) -> &[LinkId] {
        &self.links_by_input
    }

    pub fn first_input_joint_index(&self) -> usize {
        self.first_input_joint_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_joint_sits_between_free_and_ground_joints() {
        // rows: 0 = input, 1 free, 2 free, 3 pinned to ground
        let order = EntityOrder::arrange(&[true, false, false, true], 4, 1, 0);
        assert_eq!(order.first_input_joint_index(), 2);
        assert_eq!(order.joint(0).unwrap().ix(), 2);
        assert_eq!(order.joint(1).unwrap().ix(), 0);
        assert_eq!(order.joint(2).unwrap().ix(), 1);
        assert_eq!(order.joint(3).unwrap().ix(), 3);
    }

    #[test]
    fn ground_is_last_link() {
        let order = EntityOrder::arrange(&[true, false, false, true], 4, 1, 0);
        assert_eq!(order.link(0).unwrap().ix(), 3);
        assert_eq!(order.link(1).unwrap().ix(), 2);
        assert_eq!(order.link(2).unwrap().ix(), 0);
        assert_eq!(order.link(3).unwrap().ix(), 1);
        assert!(order.link(4).is_none());
    }
}
