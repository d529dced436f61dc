//! Incremental mechanism builder.

use std::collections::HashMap;

use pm_core::geometry::distance;
use pm_core::units::{deg, radians};
use pm_core::{Id, JointId, LinkId, Vec2};

use crate::error::{GraphError, GraphResult};
use crate::gear::GearData;
use crate::graph::{InputKind, MechanismGraph};
use crate::joint::{Joint, JointType};
use crate::link::Link;
use crate::ordering::EntityOrder;
use crate::validate;

/// Link names that refer to the fixed frame.
const GROUND_NAMES: [&str; 3] = ["ground", "frame", "0"];

/// Canonical name of the ground link.
pub const GROUND: &str = "ground";

#[derive(Debug, Clone)]
struct JointRow {
    joint_type: JointType,
    position: Vec2,
    slide_angle: f64,
    links: Vec<String>,
}

/// Builder for a mechanism, one joint at a time.
///
/// The first joint added drives the mechanism. Call `build()` to validate
/// and freeze the topology into a `MechanismGraph`.
#[derive(Debug, Default)]
pub struct MechanismBuilder {
    rows: Vec<JointRow>,
}

impl MechanismBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a joint at `position` connecting the named links and return its row.
    ///
    /// `slide_angle` (radians) is the slot direction of `P`/`RP` joints and is
    /// ignored for other types. For sliding joints the first link carries the
    /// block and the second the slot.
    pub fn add_joint(
        &mut self,
        joint_type: JointType,
        position: Vec2,
        slide_angle: f64,
        links: &[&str],
    ) -> usize {
        self.rows.push(JointRow {
            joint_type,
            position,
            slide_angle,
            links: links.iter().map(|s| canonical_name(s)).collect(),
        });
        self.rows.len() - 1
    }

    /// Build from tabular input.
    ///
    /// Each row gives the joint's link names, its type code and its
    /// coordinates: `[x, y]`, or `[angle_deg, x, y]` for sliding joints.
    pub fn from_input<S: AsRef<str>>(
        link_names: &[Vec<S>],
        type_codes: &[S],
        positions: &[Vec<f64>],
    ) -> GraphResult<MechanismGraph> {
        if link_names.len() != type_codes.len() || type_codes.len() != positions.len() {
            return Err(GraphError::RowCountMismatch {
                links: link_names.len(),
                types: type_codes.len(),
                positions: positions.len(),
            });
        }

        let mut builder = Self::new();
        for (row, ((names, code), values)) in link_names
            .iter()
            .zip(type_codes)
            .zip(positions)
            .enumerate()
        {
            let code = code.as_ref();
            let joint_type: JointType = code.parse().map_err(|_| GraphError::UnknownJointType {
                row,
                code: code.to_string(),
            })?;
            let expected = joint_type.coordinate_count();
            if values.len() < expected {
                return Err(GraphError::MissingNumericData {
                    row,
                    expected,
                    found: values.len(),
                });
            }
            if values[..expected].iter().any(|v| !v.is_finite()) {
                return Err(GraphError::NonFiniteValue { row });
            }
            let (slide_angle, position) = if joint_type.is_sliding() {
                (radians(deg(values[0])), Vec2::new(values[1], values[2]))
            } else {
                (0.0, Vec2::new(values[0], values[1]))
            };
            let names: Vec<&str> = names.iter().map(|s| s.as_ref()).collect();
            builder.add_joint(joint_type, position, slide_angle, &names);
        }
        builder.build()
    }

    /// Validate and freeze the mechanism.
    pub fn build(self) -> GraphResult<MechanismGraph> {
        let rows = self.rows;
        for (row, r) in rows.iter().enumerate() {
            validate::validate_row_links(row, r.joint_type, &r.links)?;
            if !r.position.x.is_finite() || !r.position.y.is_finite() || !r.slide_angle.is_finite() {
                return Err(GraphError::NonFiniteValue { row });
            }
        }

        // links in order of first mention
        let mut link_names: Vec<String> = Vec::new();
        let mut link_pos: HashMap<String, usize> = HashMap::new();
        for r in &rows {
            for name in &r.links {
                if !link_pos.contains_key(name) {
                    link_pos.insert(name.clone(), link_names.len());
                    link_names.push(name.clone());
                }
            }
        }
        let ground = *link_pos.get(GROUND).ok_or(GraphError::MissingGround)?;

        let (input_link, input_kind) = input_of(&rows, &link_pos)?;

        let ground_fixed: Vec<bool> = rows
            .iter()
            .map(|r| match r.joint_type {
                JointType::R => r.links.iter().any(|l| l == GROUND),
                JointType::P | JointType::RP => r.links[0] == GROUND,
                JointType::G => false,
            })
            .collect();
        let order = EntityOrder::arrange(&ground_fixed, link_names.len(), input_link, ground);

        let link_id = |name: &String| -> GraphResult<LinkId> {
            link_pos
                .get(name)
                .and_then(|&p| order.link(p))
                .ok_or(GraphError::InvalidInput {
                    reason: "joint refers to an unknown link",
                })
        };

        let mut joints: Vec<Joint> = Vec::with_capacity(rows.len());
        for (row, r) in rows.iter().enumerate() {
            let id = order.joint(row).ok_or(GraphError::InvalidInput {
                reason: "joint ordering is incomplete",
            })?;
            let link1 = link_id(&r.links[0])?;
            let link2 = r.links.get(1).map(&link_id).transpose()?;
            joints.push(Joint {
                id,
                joint_type: r.joint_type,
                link1,
                link2,
                initial: r.position,
                slide_angle_initial: if r.joint_type.is_sliding() {
                    r.slide_angle
                } else {
                    0.0
                },
                slide_offset: 0.0,
                input_index: row,
            });
        }
        joints.sort_by_key(|j| j.id);

        let mut links: Vec<Link> = link_names
            .iter()
            .enumerate()
            .map(|(pos, name)| {
                let id = order.link(pos).unwrap_or(Id::from_usize(pos));
                Link::new(id, name.clone(), pos == ground, pos)
            })
            .collect();
        links.sort_by_key(|l| l.id);
        for joint in &joints {
            for link in std::iter::once(joint.link1).chain(joint.link2) {
                if let Some(l) = links.get_mut(link.ix()) {
                    l.joints.push(joint.id);
                }
            }
        }
        for link in &mut links {
            link.joints.sort();
        }

        validate::validate_structure(&joints, &links)?;
        let ground_id = link_id(&link_names[ground])?;
        validate::validate_connectivity(&joints, &links, ground_id)?;

        for link in &mut links {
            link.determine_lengths_and_references(&joints);
        }
        for joint in &mut joints {
            if let Some(slot) = joint.slot_link() {
                joint.slide_offset = joint.slide_angle_initial - links[slot.ix()].angle_initial;
            }
        }

        let gears = joints
            .iter()
            .filter(|j| j.joint_type == JointType::G)
            .map(|j| gear_data(&joints, &links, j))
            .collect::<GraphResult<Vec<_>>>()?;

        let average_link_length = average_length(&links, &joints);
        let input_joint = order.joint(0).unwrap_or(Id::from_index(0));
        let input_link = link_id(&link_names[input_link])?;

        Ok(MechanismGraph {
            joints,
            links,
            gears,
            order,
            input_kind,
            ground: ground_id,
            input_joint,
            input_link,
            average_link_length,
        })
    }
}

/// Trimmed link name, with ground aliases folded onto [`GROUND`].
pub fn canonical_name(name: &str) -> String {
    let name = name.trim();
    if GROUND_NAMES.iter().any(|g| g.eq_ignore_ascii_case(name)) {
        GROUND.to_string()
    } else {
        name.to_string()
    }
}

/// Identify the input link (by position in first-mention order) and how it
/// is driven.
fn input_of(
    rows: &[JointRow],
    link_pos: &HashMap<String, usize>,
) -> GraphResult<(usize, InputKind)> {
    let first = rows.first().ok_or(GraphError::InvalidInput {
        reason: "the mechanism has no joints",
    })?;
    if first.links.len() != 2 {
        return Err(GraphError::InvalidInput {
            reason: "the first joint must connect ground to the input link",
        });
    }
    let other = match (first.links[0] == GROUND, first.links[1] == GROUND) {
        (true, false) => &first.links[1],
        (false, true) => &first.links[0],
        _ => {
            return Err(GraphError::InvalidInput {
                reason: "the first joint must connect ground to the input link",
            });
        }
    };
    let kind = match first.joint_type {
        JointType::R => InputKind::Rotary,
        JointType::P => InputKind::Prismatic {
            slot_on_ground: first.links[1] == GROUND,
        },
        JointType::RP | JointType::G => {
            return Err(GraphError::InvalidInput {
                reason: "only R or P joints can drive the mechanism",
            });
        }
    };
    let input_link = link_pos.get(other).copied().ok_or(GraphError::InvalidInput {
        reason: "input link is unknown",
    })?;
    Ok((input_link, kind))
}

fn gear_data(joints: &[Joint], links: &[Link], joint: &Joint) -> GraphResult<GearData> {
    let missing = GraphError::GearWithoutCarrier { joint: joint.id };
    let gear1 = joint.link1;
    let gear2 = joint.link2.ok_or(missing.clone())?;

    // A revolute joint between `gear` and `carrier`.
    let pivot = |gear: LinkId, carrier: LinkId| -> Option<JointId> {
        links[gear.ix()].joints.iter().copied().find(|j| {
            let jj = &joints[j.ix()];
            jj.joint_type == JointType::R && jj.connects(carrier) && jj.connects(gear)
        })
    };

    for carrier in links {
        if carrier.id == gear1 || carrier.id == gear2 {
            continue;
        }
        if let (Some(center1), Some(center2)) = (pivot(gear1, carrier.id), pivot(gear2, carrier.id)) {
            let c1 = joints[center1.ix()].initial;
            let c2 = joints[center2.ix()].initial;
            let (radius1, radius2) =
                GearData::pitch_radii(&c1, &c2, &joint.initial).ok_or(missing.clone())?;
            if radius1 == 0.0 || radius2 == 0.0 {
                return Err(missing);
            }
            return Ok(GearData {
                joint: joint.id,
                gear1,
                gear2,
                carrier: carrier.id,
                center1,
                center2,
                radius1,
                radius2,
            });
        }
    }
    Err(missing)
}

/// Mean of the non-degenerate rigid lengths over all links.
fn average_length(links: &[Link], joints: &[Joint]) -> f64 {
    let sum: f64 = links.iter().map(Link::total_length).sum();
    let count: usize = links.iter().map(Link::rigid_pair_count).sum();
    if count > 0 {
        return sum / count as f64;
    }
    // no rigid pairs: fall back to the spread of the joints
    let spread = joints
        .iter()
        .flat_map(|a| joints.iter().map(move |b| distance(&a.initial, &b.initial)))
        .fold(0.0, f64::max);
    if spread > 0.0 { spread } else { 1.0 }
}
