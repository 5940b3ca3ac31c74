//! Physics Integration Tests
//!
//! Tests for:
//! - End-to-end resting contact of a falling box on a static floor
//! - Pose push happening once per step per moved transform
//! - Write-back of solved dynamic poses without re-pushing them
//! - Bodies moved between owners syncing from the new owner
//! - Disabled and detached bodies staying out of the step

use glam::Vec2;
use grove::components::{Collider, Rigidbody};
use grove::scene::{Node, NodeHandle, SceneTree};
use grove::systems::{BasicBackend, PhysicsSystem, StubBackend};

const FIXED_STEP: f32 = 1.0 / 60.0;

fn body_node(
    tree: &mut SceneTree,
    name: &'static str,
    position: Vec2,
    body: Rigidbody,
    half_extents: Vec2,
) -> NodeHandle {
    let node = tree.create_node(Node::new(name));
    tree.node(node).set_position_vec(position);
    tree.attach_component(node, body).unwrap();
    tree.attach_component(node, Collider::rect(half_extents))
        .unwrap();
    tree.add_child(tree.root(), node).unwrap();
    node
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn physics_box_comes_to_rest_on_floor() {
    let mut tree = SceneTree::new();
    let floor = body_node(
        &mut tree,
        "floor",
        Vec2::ZERO,
        Rigidbody::fixed(),
        Vec2::new(5.0, 0.5),
    );
    let crate_box = body_node(
        &mut tree,
        "box",
        Vec2::new(0.0, 5.0),
        Rigidbody::dynamic(),
        Vec2::new(0.5, 0.5),
    );

    let mut physics = PhysicsSystem::new(BasicBackend, Vec2::new(0.0, -9.81));
    for _ in 0..120 {
        physics.step(FIXED_STEP, &mut tree).unwrap();
    }

    let world = tree.world_transform(crate_box).unwrap();
    // Floor top is at 0.5, the box half-height is 0.5
    assert!((world.position.y - 1.0).abs() < 1e-3, "box at {}", world.position.y);
    assert!(world.position.x.abs() < 1e-6);

    let floor_world = tree.world_transform(floor).unwrap();
    assert_eq!(floor_world.position, Vec2::ZERO);
    assert_eq!(physics.step_count(), 120);
}

#[test]
fn physics_box_falls_freely_without_floor() {
    let mut tree = SceneTree::new();
    let node = body_node(
        &mut tree,
        "box",
        Vec2::ZERO,
        Rigidbody::dynamic(),
        Vec2::splat(0.5),
    );

    let mut physics = PhysicsSystem::new(BasicBackend, Vec2::new(0.0, -10.0));
    for _ in 0..60 {
        physics.step(FIXED_STEP, &mut tree).unwrap();
    }

    let body = tree.component::<Rigidbody>(node).unwrap();
    assert!((body.velocity.y + 10.0).abs() < 1e-3);
    // Semi-implicit Euler overshoots the analytic -5.0 slightly
    let y = tree.world_transform(node).unwrap().position.y;
    assert!(y < -4.9 && y > -5.2, "box at {y}");
}

// ============================================================================
// Sync contract
// ============================================================================

#[test]
fn physics_pushes_once_per_step_per_moved_transform() {
    let mut tree = SceneTree::new();
    let moved = body_node(
        &mut tree,
        "moved",
        Vec2::ZERO,
        Rigidbody::kinematic(),
        Vec2::ONE,
    );
    let idle = body_node(
        &mut tree,
        "idle",
        Vec2::new(10.0, 0.0),
        Rigidbody::kinematic(),
        Vec2::ONE,
    );

    let mut physics = PhysicsSystem::new(StubBackend, Vec2::ZERO);
    let steps: u64 = 10;
    for i in 0..steps {
        tree.node(moved).set_position(i as f32 + 1.0, 0.0);
        physics.step(FIXED_STEP, &mut tree).unwrap();
    }

    let moved_body = tree.component::<Rigidbody>(moved).unwrap();
    assert_eq!(moved_body.push_count(), steps);
    assert_eq!(moved_body.position(), Vec2::new(10.0, 0.0));
    assert_eq!(tree.component::<Rigidbody>(idle).unwrap().push_count(), 1);
}

#[test]
fn physics_write_back_is_not_pushed_again() {
    let mut tree = SceneTree::new();
    let node = body_node(
        &mut tree,
        "dynamic",
        Vec2::new(0.0, 3.0),
        Rigidbody::dynamic(),
        Vec2::splat(0.5),
    );

    let mut physics = PhysicsSystem::new(BasicBackend, Vec2::new(0.0, -9.81));
    for _ in 0..5 {
        physics.step(FIXED_STEP, &mut tree).unwrap();
    }

    let body = tree.component::<Rigidbody>(node).unwrap();
    assert_eq!(body.push_count(), 1);
    assert_eq!(body.pull_count(), 5);
    assert!(tree.world_transform(node).unwrap().position.y < 3.0);
}

#[test]
fn physics_teleport_is_pushed_to_body() {
    let mut tree = SceneTree::new();
    let node = body_node(
        &mut tree,
        "dynamic",
        Vec2::ZERO,
        Rigidbody::dynamic(),
        Vec2::splat(0.5),
    );

    let mut physics = PhysicsSystem::new(StubBackend, Vec2::ZERO);
    physics.step(FIXED_STEP, &mut tree).unwrap();
    tree.node(node).set_position(4.0, 4.0);
    physics.step(FIXED_STEP, &mut tree).unwrap();

    let body = tree.component::<Rigidbody>(node).unwrap();
    assert_eq!(body.push_count(), 2);
    assert_eq!(body.position(), Vec2::new(4.0, 4.0));
}

#[test]
fn physics_transferred_body_syncs_from_new_owner() {
    let mut tree = SceneTree::new();
    let first = body_node(
        &mut tree,
        "first",
        Vec2::new(0.0, 10.0),
        Rigidbody::dynamic(),
        Vec2::splat(0.5),
    );
    let second = tree.create_node(Node::new("second"));
    tree.node(second).set_position(5.0, 0.0);
    tree.add_child(tree.root(), second).unwrap();
    // Both fresh owners sit at the same world version
    assert_eq!(
        tree.world_version(first).unwrap(),
        tree.world_version(second).unwrap()
    );

    let mut physics = PhysicsSystem::new(StubBackend, Vec2::ZERO);
    physics.step(FIXED_STEP, &mut tree).unwrap();

    let body = tree.detach_component::<Rigidbody>(first).unwrap();
    assert_eq!(body.owner(), None);
    tree.attach_component(second, body).unwrap();
    assert_eq!(
        tree.component::<Rigidbody>(second).unwrap().owner(),
        Some(second)
    );

    physics.step(FIXED_STEP, &mut tree).unwrap();

    let body = tree.component::<Rigidbody>(second).unwrap();
    assert_eq!(body.position(), Vec2::new(5.0, 0.0));
    assert_eq!(body.push_count(), 2);
    assert_eq!(
        tree.world_transform(second).unwrap().position,
        Vec2::new(5.0, 0.0)
    );
    assert_eq!(
        tree.world_transform(first).unwrap().position,
        Vec2::new(0.0, 10.0)
    );
}

// ============================================================================
// Participation
// ============================================================================

#[test]
fn physics_skips_disabled_and_detached_bodies() {
    let mut tree = SceneTree::new();
    let disabled = body_node(
        &mut tree,
        "disabled",
        Vec2::new(0.0, 3.0),
        Rigidbody::dynamic(),
        Vec2::splat(0.5),
    );
    tree.set_enabled(disabled, false).unwrap();

    let detached = tree.create_node(Node::new("detached"));
    tree.attach_component(detached, Rigidbody::dynamic()).unwrap();

    let mut physics = PhysicsSystem::new(BasicBackend, Vec2::new(0.0, -9.81));
    for _ in 0..10 {
        physics.step(FIXED_STEP, &mut tree).unwrap();
    }

    assert_eq!(tree.component::<Rigidbody>(disabled).unwrap().push_count(), 0);
    assert_eq!(tree.component::<Rigidbody>(detached).unwrap().push_count(), 0);
    assert_eq!(
        tree.world_transform(disabled).unwrap().position,
        Vec2::new(0.0, 3.0)
    );
}
