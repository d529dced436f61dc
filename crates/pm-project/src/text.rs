//! One joint per line: `TYPE x y [angle_deg] link link ...`.
//!
//! Fields are separated by whitespace or commas and `#` starts a comment.
//! Sliding joints (`P`, `RP`) carry the slot angle after the coordinates.
//! The URL form joins the lines with `|` behind a `mech=` key.

use pm_graph::JointType;

use crate::schema::JointDef;
use crate::{ProjectError, ProjectResult};

const URL_KEY: &str = "mech=";

pub fn parse_text(text: &str) -> ProjectResult<Vec<JointDef>> {
    let mut joints = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("");
        let mut fields = content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty());
        let Some(code) = fields.next() else { continue };

        let kind: JointType = code.parse().map_err(|_| ProjectError::Parse {
            line,
            what: format!("unknown joint type '{code}'"),
        })?;
        let mut number = |what: &str| -> ProjectResult<f64> {
            let field = fields.next().ok_or_else(|| ProjectError::Parse {
                line,
                what: format!("missing {what}"),
            })?;
            field.parse().map_err(|_| ProjectError::Parse {
                line,
                what: format!("{what} '{field}' is not a number"),
            })
        };
        let x = number("x")?;
        let y = number("y")?;
        let angle_deg = if kind.is_sliding() {
            Some(number("slot angle")?)
        } else {
            None
        };
        let links: Vec<String> = fields.map(str::to_string).collect();
        if links.is_empty() {
            return Err(ProjectError::Parse {
                line,
                what: "no link names".to_string(),
            });
        }
        joints.push(JointDef {
            kind: kind.code().to_string(),
            x,
            y,
            angle_deg,
            links,
        });
    }
    Ok(joints)
}

fn joint_line(j: &JointDef) -> String {
    let mut fields = vec![j.kind.clone(), j.x.to_string(), j.y.to_string()];
    if let Some(a) = j.angle_deg {
        fields.push(a.to_string());
    }
    fields.extend(j.links.iter().cloned());
    fields.join(" ")
}

pub fn to_text(joints: &[JointDef]) -> String {
    let mut out = String::new();
    for j in joints {
        out.push_str(&joint_line(j));
        out.push('\n');
    }
    out
}

pub fn to_url_argument(joints: &[JointDef]) -> String {
    let lines: Vec<String> = joints.iter().map(joint_line).collect();
    format!("{URL_KEY}{}", lines.join("|"))
}

/// Accepts the bare `mech=` argument or a whole query string containing it.
pub fn from_url_argument(argument: &str) -> ProjectResult<Vec<JointDef>> {
    let value = match argument.find(URL_KEY) {
        Some(at) => &argument[at + URL_KEY.len()..],
        None => argument,
    };
    let value = value.split('&').next().unwrap_or("");
    let text = value.replace("%20", " ").replace('+', " ").replace('|', "\n");
    parse_text(&text)
}
