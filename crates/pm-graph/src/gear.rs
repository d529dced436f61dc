//! Gear pairs.
//!
//! A `G` joint marks the pitch point of two meshing gears. Both gear centres
//! are revolute pivots on a common carrier link, so the centre distance and
//! the signed pitch radii stay constant. With `u` the unit vector from the
//! first centre to the second:
//!
//! ```text
//! s1 = (p - c1) . u        s2 = (c2 - p) . u
//! (w2 - wc) * s2 + (w1 - wc) * s1 = 0
//! ```
//!
//! External pairs have both radii positive. An internal (ring) gear shows up
//! as one negative radius, which makes the pair turn the same way.

use pm_core::geometry::distance;
use pm_core::{JointId, LinkId, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct GearData {
    /// The pitch-point joint.
    pub joint: JointId,
    pub gear1: LinkId,
    pub gear2: LinkId,
    pub carrier: LinkId,
    /// Pivot joining `gear1` to the carrier.
    pub center1: JointId,
    /// Pivot joining `gear2` to the carrier.
    pub center2: JointId,
    pub radius1: f64,
    pub radius2: f64,
}

impl GearData {
    /// Signed pitch radii for a pitch point `p` between centres `c1`, `c2`.
    pub fn pitch_radii(c1: &Vec2, c2: &Vec2, p: &Vec2) -> Option<(f64, f64)> {
        let d = distance(c1, c2);
        if d <= 0.0 || !d.is_finite() {
            return None;
        }
        let u = (c2 - c1) / d;
        Some(((p - c1).dot(&u), (c2 - p).dot(&u)))
    }

    /// Angular-velocity ratio `w2 / w1` relative to the carrier.
    pub fn ratio(&self) -> f64 {
        -self.radius1 / self.radius2
    }

    /// Rotation of gear 2 given the rotations of gear 1 and the carrier.
    pub fn second_from_first(&self, d1: f64, dc: f64) -> f64 {
        dc + (d1 - dc) * self.ratio()
    }

    /// Rotation of gear 1 given the rotations of gear 2 and the carrier.
    pub fn first_from_second(&self, d2: f64, dc: f64) -> f64 {
        dc + (d2 - dc) / self.ratio()
    }

    /// Rotation of the carrier given the rotations of both gears.
    pub fn carrier_from_gears(&self, d1: f64, d2: f64) -> Option<f64> {
        let sum = self.radius1 + self.radius2;
        if sum.abs() < f64::EPSILON {
            return None;
        }
        Some((d1 * self.radius1 + d2 * self.radius2) / sum)
    }

    /// The pitch point for the current centre positions.
    pub fn pitch_point(&self, c1: &Vec2, c2: &Vec2) -> Vec2 {
        let d = distance(c1, c2);
        if d <= 0.0 {
            return *c1;
        }
        c1 + (c2 - c1) * (self.radius1 / d)
    }

    /// The gear-link on the other side of `link`, if `link` is one of the pair.
    pub fn mate(&self, link: LinkId) -> Option<LinkId> {
        if link == self.gear1 {
            Some(self.gear2)
        } else if link == self.gear2 {
            Some(self.gear1)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_core::Id;

    fn pair(r1: f64, r2: f64) -> GearData {
        GearData {
            joint: Id::from_index(0),
            gear1: Id::from_index(1),
            gear2: Id::from_index(2),
            carrier: Id::from_index(3),
            center1: Id::from_index(1),
            center2: Id::from_index(2),
            radius1: r1,
            radius2: r2,
        }
    }

    #[test]
    fn external_pair_counter_rotates() {
        let (s1, s2) =
            GearData::pitch_radii(&Vec2::new(0.0, 0.0), &Vec2::new(3.0, 0.0), &Vec2::new(1.0, 0.0))
                .unwrap();
        assert!((s1 - 1.0).abs() < 1e-12);
        assert!((s2 - 2.0).abs() < 1e-12);
        let g = pair(s1, s2);
        assert!((g.second_from_first(0.4, 0.0) + 0.2).abs() < 1e-12);
        assert!((g.first_from_second(-0.2, 0.0) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn internal_pair_co_rotates() {
        // pinion centred at (1,0) with radius 1 inside a ring of radius 2 at the origin
        let (s1, s2) =
            GearData::pitch_radii(&Vec2::new(1.0, 0.0), &Vec2::new(0.0, 0.0), &Vec2::new(2.0, 0.0))
                .unwrap();
        assert!((s1 + 1.0).abs() < 1e-12);
        assert!((s2 - 2.0).abs() < 1e-12);
        let g = pair(s1, s2);
        assert!((g.ratio() - 0.5).abs() < 1e-12);
        let p = g.pitch_point(&Vec2::new(1.0, 0.0), &Vec2::new(0.0, 0.0));
        assert!((p - Vec2::new(2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn carrier_rotation_balances_gears() {
        let g = pair(1.0, 2.0);
        let dc = 0.3;
        let d1 = 1.1;
        let d2 = g.second_from_first(d1, dc);
        let back = g.carrier_from_gears(d1, d2).unwrap();
        assert!((back - dc).abs() < 1e-12);
        assert_eq!(g.mate(Id::from_index(2)), Some(Id::from_index(1)));
        assert_eq!(g.mate(Id::from_index(3)), None);
    }
}
