//! Project schema definitions.

use pm_core::units::{deg, radians, radians_per_second, rpm};
use pm_graph::{MechanismBuilder, MechanismGraph};
use pm_sim::{SimOptions, StepMode};
use serde::{Deserialize, Serialize};

use crate::ProjectResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub joints: Vec<JointDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_speed_rpm: Option<f64>,
    /// Written as a one-key map, e.g. `step: {delta_angle_deg: 5.0}`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub step: Option<StepDef>,
}

/// One joint: type code, position, slot angle for sliding joints, and the
/// names of the links it connects (the first row is the driver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JointDef {
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_deg: Option<f64>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StepDef {
    DeltaAngleDeg(f64),
    FixedTimeStep(f64),
    MaxSmoothingError(f64),
}

impl JointDef {
    /// Position row in the `[x, y]` / `[angle_deg, x, y]` layout.
    pub fn position_row(&self) -> Vec<f64> {
        match self.angle_deg {
            Some(a) => vec![a, self.x, self.y],
            None => vec![self.x, self.y],
        }
    }
}

impl Project {
    pub fn build_graph(&self) -> ProjectResult<MechanismGraph> {
        let links: Vec<Vec<&str>> = self
            .joints
            .iter()
            .map(|j| j.links.iter().map(String::as_str).collect())
            .collect();
        let kinds: Vec<&str> = self.joints.iter().map(|j| j.kind.as_str()).collect();
        let positions: Vec<Vec<f64>> = self.joints.iter().map(JointDef::position_row).collect();
        Ok(MechanismBuilder::from_input(&links, &kinds, &positions)?)
    }

    /// Input speed in rad/s, if set.
    pub fn input_speed(&self) -> Option<f64> {
        self.input_speed_rpm.map(|v| radians_per_second(rpm(v)))
    }

    pub fn step_mode(&self) -> Option<StepMode> {
        self.step.map(|s| match s {
            StepDef::DeltaAngleDeg(d) => StepMode::DeltaAngle(radians(deg(d))),
            StepDef::FixedTimeStep(dt) => StepMode::FixedTimeStep(dt),
            StepDef::MaxSmoothingError(e) => StepMode::MaxSmoothingError(e),
        })
    }

    pub fn sim_options(&self) -> SimOptions {
        let defaults = SimOptions::default();
        SimOptions {
            input_speed: self.input_speed().unwrap_or(defaults.input_speed),
            step: self.step_mode(),
            ..defaults
        }
    }
}
