//! Graph-specific error types.

use pm_core::{JointId, LinkId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Mechanism construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The three input sequences do not have the same number of rows.
    RowCountMismatch {
        links: usize,
        types: usize,
        positions: usize,
    },

    /// A joint-type code could not be parsed.
    UnknownJointType { row: usize, code: String },

    /// Too few numbers were supplied for a joint.
    MissingNumericData {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A numeric field is NaN or infinite.
    NonFiniteValue { row: usize },

    /// A joint names no links, or an empty link name.
    MissingLinkNames { row: usize },

    /// A joint names more than two links.
    TooManyLinks { row: usize, count: usize },

    /// A joint names the same link twice.
    DuplicateLink { row: usize, link: String },

    /// A single-link joint must be a pin.
    DanglingJoint { row: usize },

    /// No link is named ground.
    MissingGround,

    /// The first joint cannot drive the mechanism.
    InvalidInput { reason: &'static str },

    /// A gear joint has no link carrying both gear centers.
    GearWithoutCarrier { joint: JointId },

    /// A link cannot be reached from ground through joints.
    Disconnected { link: String },

    /// A link carries no joints that are fixed to it.
    NoFixedJoint { link: LinkId },

    /// A joint refers to a link that doesn't exist.
    InvalidLinkRef { joint: JointId, link: LinkId },

    /// A link's joint list and a joint's link fields disagree.
    InconsistentIncidence { joint: JointId, link: LinkId },

    /// Mechanism has not exactly one degree of freedom.
    DegreesOfFreedom { dof: i32 },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::RowCountMismatch {
                links,
                types,
                positions,
            } => write!(
                f,
                "Input rows disagree: {} link lists, {} joint types, {} positions",
                links, types, positions
            ),
            GraphError::UnknownJointType { row, code } => {
                write!(f, "Unrecognized joint type '{}' for joint at row {}", code, row)
            }
            GraphError::MissingNumericData {
                row,
                expected,
                found,
            } => write!(
                f,
                "Numerical data required ({} values, found {}) for joint at row {}",
                expected, found, row
            ),
            GraphError::NonFiniteValue { row } => {
                write!(f, "Non-finite coordinate for joint at row {}", row)
            }
            GraphError::MissingLinkNames { row } => {
                write!(f, "One or more link names required for joint at row {}", row)
            }
            GraphError::TooManyLinks { row, count } => write!(
                f,
                "Joint at row {} connects {} links (at most 2 allowed)",
                row, count
            ),
            GraphError::DuplicateLink { row, link } => {
                write!(f, "Joint at row {} lists link '{}' twice", row, link)
            }
            GraphError::DanglingJoint { row } => write!(
                f,
                "Joint at row {} is attached to a single link and must be a pin (R)",
                row
            ),
            GraphError::MissingGround => write!(f, "No link is named 'ground'"),
            GraphError::InvalidInput { reason } => write!(f, "Invalid driving input: {}", reason),
            GraphError::GearWithoutCarrier { joint } => write!(
                f,
                "Gear joint {} has no link carrying both gear centers",
                joint
            ),
            GraphError::Disconnected { link } => {
                write!(f, "Link '{}' is not connected to ground", link)
            }
            GraphError::NoFixedJoint { link } => {
                write!(f, "Link {} has no joint fixed to it", link)
            }
            GraphError::InvalidLinkRef { joint, link } => {
                write!(f, "Joint {} refers to non-existent link {}", joint, link)
            }
            GraphError::InconsistentIncidence { joint, link } => write!(
                f,
                "Joint {} and link {} disagree about their incidence",
                joint, link
            ),
            GraphError::DegreesOfFreedom { dof } => write!(
                f,
                "Cannot simulate mechanisms with {} degrees of freedom (exactly 1 required)",
                dof
            ),
        }
    }
}

impl std::error::Error for GraphError {}
