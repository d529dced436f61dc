//! pm-graph: mechanism graph layer for the planar mechanism simulator.
//!
//! Provides:
//! - Joint and link data structures with their pairwise geometry maps
//! - Gear-pair records
//! - A builder that turns tabular input into a validated `MechanismGraph`
//! - Replicable kinematic state (`MechanismState`) kept apart from topology
//!
//! # Example
//!
//! ```
//! use pm_graph::{JointType, MechanismBuilder};
//! use pm_core::Vec2;
//!
//! let mut builder = MechanismBuilder::new();
//! builder.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "crank"]);
//! builder.add_joint(JointType::R, Vec2::new(0.0, 2.0), 0.0, &["crank", "coupler"]);
//! builder.add_joint(JointType::R, Vec2::new(4.0, 4.0), 0.0, &["coupler", "rocker"]);
//! builder.add_joint(JointType::R, Vec2::new(4.0, 0.0), 0.0, &["rocker", "ground"]);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.joints().len(), 4);
//! assert_eq!(graph.degrees_of_freedom(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod gear;
pub mod graph;
pub mod joint;
pub mod link;
pub mod ordering;
pub mod pair_map;
pub mod state;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{GROUND, MechanismBuilder, canonical_name};
pub use error::{GraphError, GraphResult};
pub use gear::GearData;
pub use graph::{InputKind, MechanismGraph};
pub use joint::{Joint, JointType};
pub use link::Link;
pub use ordering::EntityOrder;
pub use pair_map::PairMap;
pub use state::{JointState, LinkState, MechanismState};
