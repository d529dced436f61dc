// pm-core/src/units.rs

//! Unit conversions at the input edge. Solver code works in raw radians and
//! rad/s; files and the command line speak degrees and rpm.

use uom::si::angle::{degree, radian};
use uom::si::angular_velocity::{radian_per_second, revolution_per_minute};
use uom::si::f64::{Angle as UomAngle, AngularVelocity as UomAngularVelocity};

pub type Angle = UomAngle;
pub type AngularVelocity = UomAngularVelocity;

#[inline]
pub fn deg(v: f64) -> Angle {
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    Angle::new::<radian>(v)
}

#[inline]
pub fn rpm(v: f64) -> AngularVelocity {
    AngularVelocity::new::<revolution_per_minute>(v)
}

#[inline]
pub fn radians(a: Angle) -> f64 {
    a.get::<radian>()
}

#[inline]
pub fn radians_per_second(w: AngularVelocity) -> f64 {
    w.get::<radian_per_second>()
}
