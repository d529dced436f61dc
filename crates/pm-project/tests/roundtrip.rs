use pm_project::*;

fn crank_rocker() -> Project {
    let j = |x: f64, y: f64, a: &str, b: &str| JointDef {
        kind: "R".to_string(),
        x,
        y,
        angle_deg: None,
        links: vec![a.to_string(), b.to_string()],
    };
    Project {
        name: "crank rocker".to_string(),
        joints: vec![
            j(0.0, 0.0, "ground", "crank"),
            j(0.0, 2.0, "crank", "coupler"),
            j(4.0, 5.0, "coupler", "rocker"),
            j(4.0, 0.0, "rocker", "ground"),
        ],
        input_speed_rpm: Some(30.0),
        step: Some(StepDef::DeltaAngleDeg(5.0)),
    }
}

#[test]
fn roundtrip_yaml_project() {
    let project = crank_rocker();
    let path = std::env::temp_dir().join("pm_project_roundtrip.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(project, loaded);

    let graph = loaded.build_graph().unwrap();
    assert_eq!(graph.degrees_of_freedom(), 1);
}

#[test]
fn yaml_layout_is_readable() {
    let text = "\
name: slider crank
input_speed_rpm: 60
step:
  max_smoothing_error: 0.001
joints:
  - { kind: R, x: 0, y: 0, links: [ground, crank] }
  - { kind: R, x: 0, y: 1, links: [crank, coupler] }
  - { kind: R, x: 2.8284271247461903, y: 0, links: [coupler, slider] }
  - { kind: P, x: 2.8284271247461903, y: 0, angle_deg: 0, links: [slider, ground] }
";
    let project: Project = serde_yaml::from_str(text).unwrap();
    validate_project(&project).unwrap();
    assert_eq!(project.step, Some(StepDef::MaxSmoothingError(0.001)));
    let graph = project.build_graph().unwrap();
    assert_eq!(graph.joint_type_counts(), [3, 1, 0, 0]);
}

#[test]
fn text_file_loads_with_default_settings() {
    let path = std::env::temp_dir().join("pm_project_slider.txt");
    std::fs::write(
        &path,
        "R 0 0 ground crank\nR 0 1 crank coupler\nR 2.8284271247461903 0 coupler slider\nP 2.8284271247461903 0 0 slider ground\n",
    )
    .unwrap();
    let project = load(&path).unwrap();
    assert_eq!(project.joints.len(), 4);
    assert!(project.step.is_none());
    assert_eq!(project.build_graph().unwrap().degrees_of_freedom(), 1);
}

#[test]
fn invalid_mechanism_is_reported_on_build() {
    let mut project = crank_rocker();
    project.joints[3].links = vec!["lonely".to_string(), "island".to_string()];
    assert!(matches!(project.build_graph(), Err(ProjectError::Graph(_))));
}
