//! Integration tests for pm-graph.

use pm_core::Vec2;
use pm_graph::{GraphError, InputKind, JointType, MechanismBuilder, MechanismGraph, MechanismState};
use std::f64::consts::FRAC_PI_2;

fn rows(v: &[&[&str]]) -> Vec<Vec<String>> {
    v.iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
}

fn codes(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn slider_crank() -> MechanismGraph {
    let x = 8.0_f64.sqrt();
    MechanismBuilder::from_input(
        &rows(&[
            &["ground", "crank"],
            &["crank", "coupler"],
            &["coupler", "slider"],
            &["slider", "ground"],
        ]),
        &codes(&["R", "R", "R", "P"]),
        &[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![x, 0.0],
            vec![0.0, x, 0.0],
        ],
    )
    .unwrap()
}

#[test]
fn slider_crank_from_tabular_input() {
    let graph = slider_crank();
    assert_eq!(graph.degrees_of_freedom(), 1);
    assert_eq!(graph.joint_type_counts(), [3, 1, 0, 0]);
    assert_eq!(graph.input_kind(), InputKind::Rotary);

    let slider = graph.link_by_name("slider").unwrap();
    let ground = graph.link(graph.ground()).unwrap();
    let p_row = graph.joints_in_input_order()[3];
    let p = graph.joint(p_row).unwrap();
    assert_eq!(p.joint_type, JointType::P);
    assert_eq!(p.link1, slider.id);
    assert_eq!(p.slot_link(), Some(ground.id));
    assert!(graph.sliding_joints(ground.id).any(|j| j == p_row));
    assert_eq!(graph.fixed_joints(slider.id).count(), 2);

    // the crank pivot sits on the slot line
    let pivot = graph.joints_in_input_order()[0];
    let d = ground.distance_to_slide(pivot, p_row).unwrap();
    assert!(d.abs() < 1e-12);
}

#[test]
fn results_follow_input_order() {
    let graph = slider_crank();
    let order = graph.joints_in_input_order();
    for (row, id) in order.iter().enumerate() {
        assert_eq!(graph.joint(*id).unwrap().input_index, row);
    }
    let names: Vec<&str> = graph
        .links_in_input_order()
        .iter()
        .map(|l| graph.link(*l).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["ground", "crank", "coupler", "slider"]);
}

#[test]
fn gear_pair_finds_carrier() {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "pinion"]);
    b.add_joint(JointType::G, Vec2::new(1.0, 0.0), 0.0, &["pinion", "wheel"]);
    b.add_joint(JointType::R, Vec2::new(3.0, 0.0), 0.0, &["wheel", "ground"]);
    let graph = b.build().unwrap();

    assert_eq!(graph.degrees_of_freedom(), 1);
    let gear = &graph.gears()[0];
    assert_eq!(gear.carrier, graph.ground());
    assert!((gear.radius1 - 1.0).abs() < 1e-12);
    assert!((gear.radius2 - 2.0).abs() < 1e-12);
    assert!((gear.ratio() + 0.5).abs() < 1e-12);
    assert!(graph.gear_for(gear.joint).is_some());
}

#[test]
fn gear_without_carrier_is_rejected() {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "pinion"]);
    b.add_joint(JointType::G, Vec2::new(1.0, 0.0), 0.0, &["pinion", "wheel"]);
    b.add_joint(JointType::RP, Vec2::new(3.0, 0.0), 0.0, &["wheel", "ground"]);
    assert!(matches!(
        b.build(),
        Err(GraphError::GearWithoutCarrier { .. })
    ));
}

#[test]
fn malformed_rows_are_rejected() {
    let err = MechanismBuilder::from_input(
        &rows(&[&["ground", "crank"]]),
        &codes(&["R", "R"]),
        &[vec![0.0, 0.0]],
    )
    .unwrap_err();
    assert!(matches!(err, GraphError::RowCountMismatch { .. }));

    let err = MechanismBuilder::from_input(
        &rows(&[&["ground", "crank"]]),
        &codes(&["X"]),
        &[vec![0.0, 0.0]],
    )
    .unwrap_err();
    assert_eq!(
        err,
        GraphError::UnknownJointType {
            row: 0,
            code: "X".into()
        }
    );

    let err = MechanismBuilder::from_input(
        &rows(&[&["ground", "crank"], &["crank", "block"]]),
        &codes(&["R", "RP"]),
        &[vec![0.0, 0.0], vec![1.0, 2.0]],
    )
    .unwrap_err();
    assert_eq!(
        err,
        GraphError::MissingNumericData {
            row: 1,
            expected: 3,
            found: 2
        }
    );
    assert!(err.to_string().contains("Numerical data required"));
}

#[test]
fn dof_is_reported_for_any_mobility() {
    // five-bar: two degrees of freedom
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "a"]);
    b.add_joint(JointType::R, Vec2::new(0.0, 1.0), 0.0, &["a", "b"]);
    b.add_joint(JointType::R, Vec2::new(2.0, 2.0), 0.0, &["b", "c"]);
    b.add_joint(JointType::R, Vec2::new(4.0, 1.0), 0.0, &["c", "d"]);
    b.add_joint(JointType::R, Vec2::new(4.0, 0.0), 0.0, &["d", "ground"]);
    let graph = b.build().unwrap();
    assert_eq!(graph.degrees_of_freedom(), 2);
    assert_eq!(
        graph.require_single_dof(),
        Err(GraphError::DegreesOfFreedom { dof: 2 })
    );
}

#[test]
fn state_carries_body_points_and_slots() {
    let graph = slider_crank();
    let mut state = MechanismState::initial(&graph);
    let crank = graph.input_link();
    let tip = graph.joints_in_input_order()[1];

    // turn the crank a quarter turn about the ground pivot
    state.links[crank.ix()].angle += -FRAC_PI_2;
    let moved = state.body_point(&graph, crank, &graph.joint(tip).unwrap().initial);
    assert!((moved - Vec2::new(1.0, 0.0)).norm() < 1e-12);
    assert!((state.rotation(&graph, crank) + FRAC_PI_2).abs() < 1e-12);

    let p = graph.joints_in_input_order()[3];
    let (point, dir) = state.slot_line(&graph, p).unwrap();
    assert!(point.y.abs() < 1e-12);
    assert!(dir.abs() < 1e-12);

    state.joints[p.ix()].position.x += 0.5;
    state.update_slides(&graph);
    assert!((state.joints[p.ix()].slide - 0.5).abs() < 1e-12);

    assert_eq!(state.joints[p.ix()].last, graph.joints()[p.ix()].initial);
    assert_eq!(state.joint_rows(graph.joints_in_input_order()).len(), 4);
}
