//! Project validation logic.

use pm_graph::JointType;

use crate::schema::{Project, StepDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Project has no joints")]
    NoJoints,

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn invalid(field: String, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.joints.is_empty() {
        return Err(ValidationError::NoJoints);
    }

    for (i, joint) in project.joints.iter().enumerate() {
        let kind: JointType = joint
            .kind
            .parse()
            .map_err(|_| invalid(format!("joints[{i}].kind"), &joint.kind, "unknown joint type"))?;
        for (name, v) in [("x", joint.x), ("y", joint.y)] {
            if !v.is_finite() {
                return Err(invalid(format!("joints[{i}].{name}"), v, "must be finite"));
            }
        }
        match (kind.is_sliding(), joint.angle_deg) {
            (true, None) => {
                return Err(invalid(
                    format!("joints[{i}].angle_deg"),
                    "none",
                    "sliding joints need a slot angle",
                ));
            }
            (true, Some(a)) if !a.is_finite() => {
                return Err(invalid(format!("joints[{i}].angle_deg"), a, "must be finite"));
            }
            (false, Some(a)) => {
                return Err(invalid(
                    format!("joints[{i}].angle_deg"),
                    a,
                    "only sliding joints have a slot angle",
                ));
            }
            _ => {}
        }
        if joint.links.is_empty() {
            return Err(invalid(format!("joints[{i}].links"), "[]", "no link names"));
        }
    }

    if let Some(rpm) = project.input_speed_rpm {
        if !rpm.is_finite() || rpm == 0.0 {
            return Err(invalid("input_speed_rpm".into(), rpm, "must be finite and non-zero"));
        }
    }

    if let Some(step) = project.step {
        let (field, v) = match step {
            StepDef::DeltaAngleDeg(v) => ("step.delta_angle_deg", v),
            StepDef::FixedTimeStep(v) => ("step.fixed_time_step", v),
            StepDef::MaxSmoothingError(v) => ("step.max_smoothing_error", v),
        };
        if !v.is_finite() || v <= 0.0 {
            return Err(invalid(field.into(), v, "must be positive"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JointDef;

    fn joint(kind: &str, angle: Option<f64>) -> JointDef {
        JointDef {
            kind: kind.into(),
            x: 0.0,
            y: 0.0,
            angle_deg: angle,
            links: vec!["ground".into(), "a".into()],
        }
    }

    #[test]
    fn sliding_joints_need_an_angle() {
        let mut project = Project {
            joints: vec![joint("P", None)],
            ..Project::default()
        };
        assert!(validate_project(&project).is_err());
        project.joints[0].angle_deg = Some(30.0);
        validate_project(&project).unwrap();
        project.joints.push(joint("R", Some(10.0)));
        assert!(validate_project(&project).is_err());
    }

    #[test]
    fn rejects_bad_settings() {
        let mut project = Project {
            joints: vec![joint("R", None)],
            step: Some(StepDef::FixedTimeStep(0.0)),
            ..Project::default()
        };
        let err = validate_project(&project).unwrap_err();
        assert!(err.to_string().contains("step.fixed_time_step"));
        project.step = None;
        project.input_speed_rpm = Some(f64::NAN);
        assert!(validate_project(&project).is_err());
        assert!(matches!(
            validate_project(&Project::default()),
            Err(ValidationError::NoJoints)
        ));
    }
}
