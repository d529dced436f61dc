//! Planar geometry primitives used by the position solver.
//!
//! A joint whose location is only partly pinned down by one of its links lies
//! on a [`Locus`]: a circle about a known pivot, or a line fixed in a placed
//! link. Intersecting two loci yields zero, one or two candidate positions.

use crate::constants::{EPSILON, EPSILON_SAME, MAX_SLOPE};
use crate::numeric::same_close_zero;
use std::f64::consts::PI;

/// 2-D vector/point type used across the workspace.
pub type Vec2 = nalgebra::Vector2<f64>;

/// Squared distance between two points.
pub fn distance_squared(a: &Vec2, b: &Vec2) -> f64 {
    (a - b).norm_squared()
}

pub fn distance(a: &Vec2, b: &Vec2) -> f64 {
    (a - b).norm()
}

/// Angle of the vector from `start` to `end`.
pub fn angle(start: &Vec2, end: &Vec2) -> f64 {
    (end.y - start.y).atan2(end.x - start.x)
}

/// z-component of the 3-D cross product of two planar vectors.
pub fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Rotate a vector a quarter turn counter-clockwise (`k × v`).
pub fn perp(v: &Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

pub fn rotate(v: &Vec2, theta: f64) -> Vec2 {
    let (s, c) = theta.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

pub fn unit(theta: f64) -> Vec2 {
    let (s, c) = theta.sin_cos();
    Vec2::new(c, s)
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(theta: f64) -> f64 {
    let mut a = theta % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Return the representative of `theta` (mod 2π) closest to `reference`.
///
/// Link angles are tracked continuously so that a full crank revolution
/// shows up as a 2π change rather than a jump back to zero.
pub fn unwrap_near(theta: f64, reference: f64) -> f64 {
    reference + wrap_angle(theta - reference)
}

/// Foot of the perpendicular from `point` onto the line through `line_point`
/// with direction angle `line_angle`.
pub fn ortho_point(point: &Vec2, line_point: &Vec2, line_angle: f64) -> Vec2 {
    if same_close_zero(line_angle) || same_close_zero(line_angle.abs() - PI) {
        return Vec2::new(point.x, line_point.y);
    }
    if same_close_zero(line_angle.abs() - PI / 2.0) {
        return Vec2::new(line_point.x, point.y);
    }
    let dir = unit(line_angle);
    line_point + dir * (point - line_point).dot(&dir)
}

/// Signed distance of `point` from the directed line (positive to the left).
pub fn signed_distance_to_line(point: &Vec2, line_point: &Vec2, line_angle: f64) -> f64 {
    cross(&unit(line_angle), &(point - line_point))
}

/// Intersection of two lines given in slope/point form.
///
/// Returns `None` for parallel lines. A slope beyond [`MAX_SLOPE`] (or a
/// non-finite slope) is treated as a vertical line.
pub fn solve_via_intersecting_lines(
    slope_a: f64,
    pt_a: &Vec2,
    slope_b: f64,
    pt_b: &Vec2,
) -> Option<Vec2> {
    if same_close_zero(pt_a.x - pt_b.x) && same_close_zero(pt_a.y - pt_b.y) {
        return Some(*pt_a);
    }
    let vertical_a = vertical_slope(slope_a);
    let vertical_b = vertical_slope(slope_b);
    if (vertical_a && vertical_b) || same_close_zero(slope_a - slope_b) {
        return None;
    }
    let offset_a = pt_a.y - slope_a * pt_a.x;
    let offset_b = pt_b.y - slope_b * pt_b.x;
    if vertical_a {
        return Some(Vec2::new(pt_a.x, slope_b * pt_a.x + offset_b));
    }
    if vertical_b {
        return Some(Vec2::new(pt_b.x, slope_a * pt_b.x + offset_a));
    }
    let x = (offset_b - offset_a) / (slope_a - slope_b);
    Some(Vec2::new(x, slope_a * x + offset_a))
}

fn vertical_slope(slope: f64) -> bool {
    !slope.is_finite() || slope.abs() > MAX_SLOPE
}

/// Set of points a joint is confined to by one partially placed link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Locus {
    /// The joint position is fully determined.
    Point(Vec2),
    /// Rigid distance from a known pivot.
    Circle { center: Vec2, radius: f64 },
    /// Line through `point` with unit `direction`.
    Line { point: Vec2, direction: Vec2 },
}

impl Locus {
    pub fn line(point: Vec2, angle: f64) -> Self {
        Locus::Line {
            point,
            direction: unit(angle),
        }
    }

    /// Distance from `p` to the locus.
    pub fn distance_to(&self, p: &Vec2) -> f64 {
        match self {
            Locus::Point(q) => distance(p, q),
            Locus::Circle { center, radius } => (distance(p, center) - radius).abs(),
            Locus::Line { point, direction } => cross(direction, &(p - point)).abs(),
        }
    }

    /// Intersect two loci. Tangent configurations within tolerance return a
    /// single point; disjoint loci return an empty vector.
    pub fn intersect(&self, other: &Locus) -> Vec<Vec2> {
        match (self, other) {
            (Locus::Point(p), l) | (l, Locus::Point(p)) => {
                let scale = 1.0 + p.norm();
                if l.distance_to(p) <= EPSILON * scale {
                    vec![*p]
                } else {
                    vec![]
                }
            }
            (
                Locus::Circle {
                    center: c1,
                    radius: r1,
                },
                Locus::Circle {
                    center: c2,
                    radius: r2,
                },
            ) => circle_circle(c1, *r1, c2, *r2),
            (Locus::Circle { center, radius }, Locus::Line { point, direction })
            | (Locus::Line { point, direction }, Locus::Circle { center, radius }) => {
                circle_line(center, *radius, point, direction)
            }
            (
                Locus::Line {
                    point: p1,
                    direction: d1,
                },
                Locus::Line {
                    point: p2,
                    direction: d2,
                },
            ) => line_line(p1, d1, p2, d2).into_iter().collect(),
        }
    }
}

fn circle_circle(c1: &Vec2, r1: f64, c2: &Vec2, r2: f64) -> Vec<Vec2> {
    let d = distance(c1, c2);
    if d < EPSILON_SAME {
        return vec![];
    }
    let u = (c2 - c1) / d;
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h_sq = r1 * r1 - a * a;
    let scale = r1.max(r2).max(d);
    if h_sq < -EPSILON * scale * scale {
        return vec![];
    }
    let base = c1 + u * a;
    if h_sq <= EPSILON_SAME * scale * scale {
        return vec![base];
    }
    let h = h_sq.sqrt();
    let n = perp(&u);
    vec![base + n * h, base - n * h]
}

fn circle_line(center: &Vec2, radius: f64, point: &Vec2, direction: &Vec2) -> Vec<Vec2> {
    let w = point - center;
    let b = w.dot(direction);
    let disc = b * b - (w.norm_squared() - radius * radius);
    let scale = radius.max(w.norm()).max(1e-300);
    if disc < -EPSILON * scale * scale {
        return vec![];
    }
    if disc <= EPSILON_SAME * scale * scale {
        return vec![point - direction * b];
    }
    let root = disc.sqrt();
    vec![point + direction * (-b + root), point + direction * (-b - root)]
}

fn line_line(p1: &Vec2, d1: &Vec2, p2: &Vec2, d2: &Vec2) -> Option<Vec2> {
    let denom = cross(d1, d2);
    if denom.abs() < EPSILON_SAME {
        return None;
    }
    let t = cross(&(p2 - p1), d2) / denom;
    Some(p1 + d1 * t)
}

/// Pick the candidate closest to `target` (the continuity heuristic).
pub fn nearest(candidates: &[Vec2], target: &Vec2) -> Option<Vec2> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| distance_squared(a, target).total_cmp(&distance_squared(b, target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_circle_two_branches() {
        let pts = Locus::Circle {
            center: Vec2::new(0.0, 0.0),
            radius: 5.0,
        }
        .intersect(&Locus::Circle {
            center: Vec2::new(8.0, 0.0),
            radius: 5.0,
        });
        assert_eq!(pts.len(), 2);
        for p in &pts {
            assert!((p.x - 4.0).abs() < 1e-12);
            assert!((p.y.abs() - 3.0).abs() < 1e-12);
        }
        let up = nearest(&pts, &Vec2::new(4.0, 2.9)).unwrap();
        assert!(up.y > 0.0);
    }

    #[test]
    fn circle_circle_out_of_reach() {
        let pts = Locus::Circle {
            center: Vec2::new(0.0, 0.0),
            radius: 1.0,
        }
        .intersect(&Locus::Circle {
            center: Vec2::new(5.0, 0.0),
            radius: 1.0,
        });
        assert!(pts.is_empty());
    }

    #[test]
    fn circle_line_chord() {
        let pts = Locus::Circle {
            center: Vec2::new(0.0, 0.0),
            radius: 2.0,
        }
        .intersect(&Locus::line(Vec2::new(-10.0, 1.0), 0.0));
        assert_eq!(pts.len(), 2);
        for p in pts {
            assert!((p.norm() - 2.0).abs() < 1e-12);
            assert!((p.y - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn line_line_crossing_and_parallel() {
        let a = Locus::line(Vec2::new(0.0, 0.0), 0.0);
        let b = Locus::line(Vec2::new(3.0, -1.0), PI / 2.0);
        let pts = a.intersect(&b);
        assert_eq!(pts.len(), 1);
        assert!((pts[0] - Vec2::new(3.0, 0.0)).norm() < 1e-12);

        let c = Locus::line(Vec2::new(0.0, 2.0), 0.0);
        assert!(a.intersect(&c).is_empty());
    }

    #[test]
    fn slope_form_lines() {
        let p = solve_via_intersecting_lines(1.0, &Vec2::new(0.0, 0.0), -1.0, &Vec2::new(2.0, 0.0))
            .unwrap();
        assert!((p - Vec2::new(1.0, 1.0)).norm() < 1e-12);
        let v = solve_via_intersecting_lines(f64::INFINITY, &Vec2::new(2.0, 0.0), 0.5, &Vec2::zeros())
            .unwrap();
        assert!((v - Vec2::new(2.0, 1.0)).norm() < 1e-12);
        assert!(solve_via_intersecting_lines(2.0, &Vec2::zeros(), 2.0, &Vec2::new(0.0, 1.0)).is_none());
    }

    #[test]
    fn unwrap_keeps_continuity() {
        let prev = 3.1;
        let next = unwrap_near(-3.1, prev);
        assert!((next - (2.0 * PI - 3.1)).abs() < 1e-12);
    }

    #[test]
    fn ortho_point_and_signed_distance() {
        let foot = ortho_point(&Vec2::new(1.0, 3.0), &Vec2::new(0.0, 0.0), PI / 4.0);
        assert!((foot - Vec2::new(2.0, 2.0)).norm() < 1e-12);
        let d = signed_distance_to_line(&Vec2::new(0.0, 2.0), &Vec2::zeros(), 0.0);
        assert!((d - 2.0).abs() < 1e-12);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn wrapped_angles_stay_in_half_open_range(theta in -100.0f64..100.0) {
                let w = wrap_angle(theta);
                prop_assert!(w > -PI - 1e-12 && w <= PI + 1e-12);
                let turns = (theta - w) / (2.0 * PI);
                prop_assert!((turns - turns.round()).abs() < 1e-9);
            }

            #[test]
            fn rotation_preserves_length(x in -10.0f64..10.0, y in -10.0f64..10.0, t in -7.0f64..7.0) {
                let v = Vec2::new(x, y);
                prop_assert!((rotate(&v, t).norm() - v.norm()).abs() < 1e-9);
            }
        }
    }
}
