//! pm-core: stable foundation for the planar mechanism simulator.
//!
//! Contains:
//! - constants (tolerances and step-control constants shared by every layer)
//! - geometry (2-D points, circle/line loci and their intersections)
//! - ids (stable compact IDs for joints and links)
//! - numeric (Real and tolerance comparisons)
//! - units (uom conversions used at the input edge)
//! - error (shared error types)

pub mod constants;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PmError, PmResult};
pub use geometry::{Locus, Vec2};
pub use ids::*;
pub use numeric::*;
