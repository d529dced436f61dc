//! Integration tests for position, velocity and acceleration analysis.

use pm_core::Vec2;
use pm_core::geometry::distance;
use pm_graph::{JointType, MechanismBuilder, MechanismGraph, MechanismState};
use pm_solver::{
    AccelerationSolver, DifferenceScheme, Fill, NewtonMinimizer, PositionFinder, VelocitySolver,
    instant_center, numerical,
};
use std::f64::consts::{FRAC_PI_2, PI};

/// Crank-rocker with ground 4, crank 2, coupler 5, rocker 5.
fn crank_rocker() -> MechanismGraph {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "crank"]);
    b.add_joint(JointType::R, Vec2::new(0.0, 2.0), 0.0, &["crank", "coupler"]);
    b.add_joint(JointType::R, Vec2::new(4.0, 5.0), 0.0, &["coupler", "rocker"]);
    b.add_joint(JointType::R, Vec2::new(4.0, 0.0), 0.0, &["rocker", "ground"]);
    b.build().unwrap()
}

/// Offset-free slider-crank: crank 1, coupler 3, slider on the x axis.
fn slider_crank() -> MechanismGraph {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "crank"]);
    b.add_joint(JointType::R, Vec2::new(0.0, 1.0), 0.0, &["crank", "coupler"]);
    b.add_joint(JointType::R, Vec2::new(8.0_f64.sqrt(), 0.0), 0.0, &["coupler", "slider"]);
    b.add_joint(JointType::P, Vec2::new(8.0_f64.sqrt(), 0.0), 0.0, &["slider", "ground"]);
    b.build().unwrap()
}

/// Crank pin riding in the slot of a rocker pivoted below the crank.
fn inverted_slider_crank() -> MechanismGraph {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "crank"]);
    b.add_joint(JointType::RP, Vec2::new(0.0, 1.0), FRAC_PI_2, &["crank", "rocker"]);
    b.add_joint(JointType::R, Vec2::new(0.0, -2.0), 0.0, &["rocker", "ground"]);
    b.build().unwrap()
}

/// A ternary link held by three binary links: no two-link dyad closes it.
fn triad() -> MechanismGraph {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "crank"]);
    b.add_joint(JointType::R, Vec2::new(0.0, 1.0), 0.0, &["crank", "b1"]);
    b.add_joint(JointType::R, Vec2::new(2.0, 3.0), 0.0, &["b1", "tri"]);
    b.add_joint(JointType::R, Vec2::new(4.0, 3.0), 0.0, &["tri", "b2"]);
    b.add_joint(JointType::R, Vec2::new(5.0, 0.0), 0.0, &["b2", "ground"]);
    b.add_joint(JointType::R, Vec2::new(3.0, 4.5), 0.0, &["tri", "b3"]);
    b.add_joint(JointType::R, Vec2::new(7.0, 3.0), 0.0, &["b3", "ground"]);
    b.build().unwrap()
}

fn joint_at(graph: &MechanismGraph, state: &MechanismState, row: usize) -> Vec2 {
    state.joints[graph.joints_in_input_order()[row].ix()].position
}

fn assert_rigid(graph: &MechanismGraph, state: &MechanismState) {
    for link in graph.links() {
        let fixed: Vec<_> = graph.fixed_joints(link.id).collect();
        for (i, &a) in fixed.iter().enumerate() {
            for &b in &fixed[i + 1..] {
                let design = link.length_between(a, b).unwrap();
                let now = distance(&state.joint(a).position, &state.joint(b).position);
                assert!(
                    (now - design).abs() < 1e-9,
                    "link {} drifted: {now} vs {design}",
                    link.name
                );
            }
        }
    }
}

#[test]
fn crank_rocker_closes_over_a_full_turn() {
    let graph = crank_rocker();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let velocity = VelocitySolver::new(&graph);
    let acceleration = AccelerationSolver::new(&graph);
    let mut state = MechanismState::initial(&graph);

    assert!(finder.is_dyadic(&state).unwrap());
    let step = 10.0_f64.to_radians();
    for _ in 0..36 {
        finder.solve(&mut state, step, step).unwrap();
        assert!(!finder.used_optimizer());
        velocity.solve(&mut state, 1.0).unwrap();
        acceleration.solve(&mut state, 1.0).unwrap();
        assert_rigid(&graph, &state);
    }

    // back where we started, on the same branch
    assert!((state.input - 2.0 * PI).abs() < 1e-9);
    assert!((joint_at(&graph, &state, 2) - Vec2::new(4.0, 5.0)).norm() < 1e-8);
    let crank = &state.links[graph.input_link().ix()];
    assert!((crank.angle - (FRAC_PI_2 + 2.0 * PI)).abs() < 1e-9);
}

#[test]
fn analytic_velocity_matches_central_difference() {
    let graph = crank_rocker();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let velocity = VelocitySolver::new(&graph);
    let acceleration = AccelerationSolver::new(&graph);

    let mut state = MechanismState::initial(&graph);
    finder.solve(&mut state, 0.4, 0.4).unwrap();
    velocity.solve(&mut state, 1.0).unwrap();
    acceleration.solve(&mut state, 1.0).unwrap();

    let h = 1e-5;
    let mut plus = state.clone();
    let mut minus = state.clone();
    finder.solve(&mut plus, h, h).unwrap();
    finder.solve(&mut minus, -h, -h).unwrap();
    velocity.solve(&mut plus, 1.0).unwrap();
    velocity.solve(&mut minus, 1.0).unwrap();

    for i in 0..state.joints.len() {
        let fd_v = (plus.joints[i].position - minus.joints[i].position) / (2.0 * h);
        assert!((fd_v - state.joints[i].velocity).norm() < 1e-6);
        let fd_a = (plus.joints[i].velocity - minus.joints[i].velocity) / (2.0 * h);
        assert!((fd_a - state.joints[i].acceleration).norm() < 1e-5);
    }
    for i in 0..state.links.len() {
        let fd_w = (plus.links[i].angle - minus.links[i].angle) / (2.0 * h);
        assert!((fd_w - state.links[i].velocity).abs() < 1e-6);
    }
}

#[test]
fn instant_centres_of_crank_and_translating_coupler() {
    let graph = crank_rocker();
    let mut state = MechanismState::initial(&graph);
    VelocitySolver::new(&graph).solve(&mut state, 1.0).unwrap();

    let crank = graph.input_link();
    let ic = instant_center(&state, crank).unwrap();
    assert!(ic.norm() < 1e-12);

    // crank and rocker are parallel here: the coupler translates
    let coupler = graph.link_by_name("coupler").unwrap().id;
    assert!(instant_center(&state, coupler).is_none());
}

#[test]
fn slider_follows_closed_form() {
    let graph = slider_crank();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let velocity = VelocitySolver::new(&graph);
    let mut state = MechanismState::initial(&graph);

    velocity.solve(&mut state, 1.0).unwrap();
    let p = graph.joints_in_input_order()[3];
    assert!((state.joint(p).velocity - Vec2::new(-1.0, 0.0)).norm() < 1e-12);
    assert!((state.joint(p).slide_rate + 1.0).abs() < 1e-12);

    let step = 0.1;
    for k in 1..=20 {
        finder.solve(&mut state, step, step).unwrap();
        velocity.solve(&mut state, 1.0).unwrap();
        let phi = FRAC_PI_2 + step * k as f64;
        let expected = phi.cos() + (9.0 - phi.sin().powi(2)).sqrt();
        let slider = state.joint(p).position;
        assert!((slider.x - expected).abs() < 1e-9);
        assert!(slider.y.abs() < 1e-12);
        assert!((state.joint(p).slide - (expected - 8.0_f64.sqrt())).abs() < 1e-9);
    }
}

#[test]
fn pin_in_slot_uses_tangency() {
    let graph = inverted_slider_crank();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let mut state = MechanismState::initial(&graph);
    assert!(finder.is_dyadic(&state).unwrap());

    let pin = graph.joints_in_input_order()[1];
    for k in 1..=8 {
        finder.solve(&mut state, 0.25, 0.25).unwrap();
        let theta = 0.25 * k as f64;
        let a = Vec2::new(-theta.sin(), theta.cos());
        assert!((state.joint(pin).position - a).norm() < 1e-12);
        let (_, dir) = state.slot_line(&graph, pin).unwrap();
        let expected = (a.y + 2.0).atan2(a.x);
        assert!((dir - expected).abs() < 1e-9);
    }
}

#[test]
fn gear_pair_counter_rotates() {
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "pinion"]);
    b.add_joint(JointType::G, Vec2::new(1.0, 0.0), 0.0, &["pinion", "wheel"]);
    b.add_joint(JointType::R, Vec2::new(3.0, 0.0), 0.0, &["wheel", "ground"]);
    let graph = b.build().unwrap();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let mut state = MechanismState::initial(&graph);

    finder.solve(&mut state, 0.3, 0.3).unwrap();
    VelocitySolver::new(&graph).solve(&mut state, 2.0).unwrap();
    let wheel = graph.link_by_name("wheel").unwrap().id;
    assert!((state.link(wheel).angle + 0.15).abs() < 1e-12);
    assert!((state.link(wheel).velocity + 1.0).abs() < 1e-12);
    let mesh = graph.joints_in_input_order()[1];
    assert!((state.joint(mesh).position - Vec2::new(1.0, 0.0)).norm() < 1e-12);
    assert!(state.joint(mesh).velocity.norm() < 1e-12);
}

#[test]
fn triad_needs_the_iterative_stage() {
    let graph = triad();
    assert_eq!(graph.degrees_of_freedom(), 1);
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let velocity = VelocitySolver::new(&graph);
    let mut state = MechanismState::initial(&graph);
    assert!(!finder.is_dyadic(&state).unwrap());

    // Backward from the drawn configuration the branch survives to about
    // -0.10 rad; forward it ends near +0.026 rad.
    velocity.solve(&mut state, 1.0).unwrap();
    for _ in 0..4 {
        let before = state.clone();
        finder.solve(&mut state, -0.02, -0.02).unwrap();
        assert!(finder.used_optimizer());
        assert_rigid(&graph, &state);
        for (now, was) in state.joints.iter().zip(&before.joints) {
            assert_eq!(now.last, was.position);
            assert!((now.position - was.position).norm() < 0.5);
        }
        velocity.solve(&mut state, 1.0).unwrap();
    }
}

#[test]
fn triad_refuses_to_cross_its_lock_point() {
    let graph = triad();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let velocity = VelocitySolver::new(&graph);
    let mut state = MechanismState::initial(&graph);
    velocity.solve(&mut state, 1.0).unwrap();

    finder.solve(&mut state, 0.02, 0.02).unwrap();
    assert_rigid(&graph, &state);
    velocity.solve(&mut state, 1.0).ok();

    let before = state.clone();
    assert!(finder.solve(&mut state, 0.02, 0.02).is_err());
    assert_eq!(state, before);
}

#[test]
fn numerical_estimate_matches_analytic() {
    let graph = slider_crank();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let velocity = VelocitySolver::new(&graph);
    let acceleration = AccelerationSolver::new(&graph);

    let mut state = MechanismState::initial(&graph);
    finder.solve(&mut state, 0.7, 0.7).unwrap();
    let mut analytic = state.clone();
    velocity.solve(&mut analytic, 1.0).unwrap();
    acceleration.solve(&mut analytic, 1.0).unwrap();

    let scheme = numerical::estimate(&mut finder, &mut state, 1.0, 1e-4, Fill::BOTH);
    assert_eq!(scheme, Some(DifferenceScheme::Central));
    for (n, a) in state.joints.iter().zip(&analytic.joints) {
        assert!((n.velocity - a.velocity).norm() < 1e-6);
        assert!((n.acceleration - a.acceleration).norm() < 1e-4);
    }
}

#[test]
fn slider_locks_past_reach() {
    // the coupler is too short for the crank to push the slider over the top
    let mut b = MechanismBuilder::new();
    b.add_joint(JointType::R, Vec2::new(0.0, 0.0), 0.0, &["ground", "crank"]);
    b.add_joint(JointType::R, Vec2::new(2.0, 0.0), 0.0, &["crank", "coupler"]);
    b.add_joint(JointType::R, Vec2::new(3.0, 1.0), 0.0, &["coupler", "slider"]);
    b.add_joint(JointType::P, Vec2::new(3.0, 1.0), 0.0, &["slider", "ground"]);
    let graph = b.build().unwrap();
    let minimizer = NewtonMinimizer::default();
    let mut finder = PositionFinder::new(&graph, &minimizer);
    let mut state = MechanismState::initial(&graph);
    let before = state.clone();

    // turning the crank to point straight down puts the pin 3 below a line
    // the coupler (length sqrt 2) cannot reach
    let err = finder.solve(&mut state, -FRAC_PI_2, 1.0);
    assert!(err.is_err());
    assert_eq!(state, before);
}
