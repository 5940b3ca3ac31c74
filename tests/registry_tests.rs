//! Tree Registry Integration Tests
//!
//! Tests for:
//! - Camera registration on tree entry / exit and component attach / detach
//! - Current camera selection (at most one, no promotion)
//! - View-projection caching keyed on the owner's world version
//! - Cameras moved between owners
//! - Pixel-perfect snapping
//! - Keyboard focus grab / release / implicit release

use glam::{Vec2, Vec4};
use grove::errors::GroveError;
use grove::scene::{Camera2D, Control, Node, NodeHandle, PixelPerfect, SceneTree};

fn camera_node(tree: &mut SceneTree, name: &'static str) -> NodeHandle {
    let node = tree.create_node(Node::new(name));
    tree.attach_component(node, Camera2D::default()).unwrap();
    tree.add_child(tree.root(), node).unwrap();
    node
}

fn control_node(tree: &mut SceneTree, control: Control) -> NodeHandle {
    let node = tree.create_node(Node::new("control"));
    tree.attach_component(node, control).unwrap();
    tree.add_child(tree.root(), node).unwrap();
    node
}

// ============================================================================
// Camera registration
// ============================================================================

#[test]
fn camera_registers_on_enter_and_unregisters_on_exit() {
    let mut tree = SceneTree::new();
    let node = tree.create_node(Node::new("cam"));
    tree.attach_component(node, Camera2D::default()).unwrap();
    assert!(tree.registered_cameras().is_empty());

    tree.add_child(tree.root(), node).unwrap();
    assert_eq!(tree.registered_cameras(), &[node]);
    assert_eq!(tree.current_camera(), None);

    tree.detach(node).unwrap();
    assert!(tree.registered_cameras().is_empty());
}

#[test]
fn camera_component_attach_registers_in_tree_node() {
    let mut tree = SceneTree::new();
    let node = tree.create_node(Node::new("cam"));
    tree.add_child(tree.root(), node).unwrap();

    tree.attach_component(node, Camera2D::default()).unwrap();
    assert_eq!(tree.registered_cameras(), &[node]);

    tree.set_current_camera(node).unwrap();
    let camera = tree.detach_component::<Camera2D>(node).unwrap();
    assert!(tree.registered_cameras().is_empty());
    assert_eq!(tree.current_camera(), None);
    assert_eq!(camera.owner(), None);
}

// ============================================================================
// Current camera
// ============================================================================

#[test]
fn current_camera_switches_between_registered() {
    let mut tree = SceneTree::new();
    let a = camera_node(&mut tree, "a");
    let b = camera_node(&mut tree, "b");

    tree.set_current_camera(a).unwrap();
    assert!(tree.component::<Camera2D>(a).unwrap().is_current());

    tree.set_current_camera(b).unwrap();
    assert_eq!(tree.current_camera(), Some(b));
    assert!(!tree.component::<Camera2D>(a).unwrap().is_current());
    assert!(tree.component::<Camera2D>(b).unwrap().is_current());
}

#[test]
fn current_camera_exit_leaves_none_current() {
    let mut tree = SceneTree::new();
    let a = camera_node(&mut tree, "a");
    let b = camera_node(&mut tree, "b");
    tree.set_current_camera(a).unwrap();

    tree.detach(a).unwrap();
    assert_eq!(tree.current_camera(), None);
    assert_eq!(tree.registered_cameras(), &[b]);
    assert!(!tree.component::<Camera2D>(a).unwrap().is_current());
    assert!(tree.current_view_projection().unwrap().is_none());
}

#[test]
fn current_camera_requires_registration() {
    let mut tree = SceneTree::new();
    let plain = tree.create_node(Node::new("plain"));
    tree.add_child(tree.root(), plain).unwrap();
    assert!(matches!(
        tree.set_current_camera(plain),
        Err(GroveError::ComponentMissing { .. })
    ));

    let orphan = tree.create_node(Node::new("orphan"));
    tree.attach_component(orphan, Camera2D::default()).unwrap();
    assert!(matches!(
        tree.set_current_camera(orphan),
        Err(GroveError::CameraNotRegistered(_))
    ));
}

#[test]
fn current_camera_removed_with_node() {
    let mut tree = SceneTree::new();
    let a = camera_node(&mut tree, "a");
    tree.set_current_camera(a).unwrap();
    tree.remove_node(a).unwrap();
    assert_eq!(tree.current_camera(), None);
    assert!(tree.registered_cameras().is_empty());
}

// ============================================================================
// View-projection
// ============================================================================

#[test]
fn view_projection_rebuilds_only_on_move() {
    let mut tree = SceneTree::new();
    let cam = camera_node(&mut tree, "cam");
    tree.set_current_camera(cam).unwrap();

    let first = tree.current_view_projection().unwrap().unwrap();
    tree.current_view_projection().unwrap();
    assert_eq!(tree.component::<Camera2D>(cam).unwrap().rebuild_count(), 1);

    tree.node(cam).set_position(3.0, 0.0);
    let moved = tree.current_view_projection().unwrap().unwrap();
    assert_eq!(tree.component::<Camera2D>(cam).unwrap().rebuild_count(), 2);
    assert_ne!(first, moved);

    // The camera origin maps to clip-space center
    let clip = moved * Vec4::new(3.0, 0.0, 0.0, 1.0);
    assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
}

#[test]
fn camera_moved_to_new_owner_rebuilds_view_projection() {
    let mut tree = SceneTree::new();
    let first = camera_node(&mut tree, "first");
    let second = tree.create_node(Node::new("second"));
    tree.node(second).set_position(50.0, 0.0);
    tree.add_child(tree.root(), second).unwrap();
    // Fresh owners share a world version
    assert_eq!(
        tree.world_version(first).unwrap(),
        tree.world_version(second).unwrap()
    );

    tree.set_current_camera(first).unwrap();
    let before = tree.current_view_projection().unwrap().unwrap();

    let camera = tree.detach_component::<Camera2D>(first).unwrap();
    assert_eq!(camera.owner(), None);
    tree.attach_component(second, camera).unwrap();
    assert_eq!(tree.registered_cameras(), &[second]);
    assert_eq!(
        tree.component::<Camera2D>(second).unwrap().owner(),
        Some(second)
    );
    tree.set_current_camera(second).unwrap();

    let after = tree.current_view_projection().unwrap().unwrap();
    assert_ne!(before, after);
    let clip = after * Vec4::new(50.0, 0.0, 0.0, 1.0);
    assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
}

#[test]
fn view_projection_rebuilds_on_settings_change() {
    let mut tree = SceneTree::new();
    let cam = camera_node(&mut tree, "cam");
    tree.set_current_camera(cam).unwrap();
    tree.current_view_projection().unwrap();

    tree.component_mut::<Camera2D>(cam).unwrap().set_zoom(2.0);
    tree.current_view_projection().unwrap();
    assert_eq!(tree.component::<Camera2D>(cam).unwrap().rebuild_count(), 2);
}

#[test]
fn pixel_perfect_camera_snaps_to_pixel_grid() {
    let mut tree = SceneTree::new();
    let node = tree.create_node(Node::new("pixel_cam"));
    tree.attach_component(
        node,
        Camera2D::pixel_perfect(PixelPerfect::new(180, 16.0), 16.0 / 9.0),
    )
    .unwrap();
    tree.add_child(tree.root(), node).unwrap();
    tree.set_current_camera(node).unwrap();
    assert!((tree.component::<Camera2D>(node).unwrap().half_height() - 5.625).abs() < 1e-6);

    // 0.51 px lands on 1/16 after rounding: 0.51 * 16 = 8.16 -> 8 -> 0.5
    tree.node(node).set_position(0.51, 0.0).set_rotation(0.3);
    let vp = tree.current_view_projection().unwrap().unwrap();
    let clip = vp * Vec4::new(0.5, 0.0, 0.0, 1.0);
    assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);

    // Locked rotation keeps the up axis vertical
    let up = vp * Vec4::new(0.5, 1.0, 0.0, 1.0);
    assert!(up.x.abs() < 1e-5);
    assert!(up.y > 0.0);
}

// ============================================================================
// Focus
// ============================================================================

#[test]
fn focus_grab_moves_between_controls() {
    let mut tree = SceneTree::new();
    let a = control_node(&mut tree, Control::new(Vec2::splat(10.0)));
    let b = control_node(&mut tree, Control::new(Vec2::splat(10.0)));

    tree.grab_focus(a).unwrap();
    assert!(tree.has_focus(a));
    tree.grab_focus(b).unwrap();
    assert_eq!(tree.focused_control(), Some(b));
    assert!(!tree.component::<Control>(a).unwrap().has_focus());
    assert!(tree.component::<Control>(b).unwrap().has_focus());
}

#[test]
fn focus_release_only_by_holder() {
    let mut tree = SceneTree::new();
    let a = control_node(&mut tree, Control::default());
    let b = control_node(&mut tree, Control::default());
    tree.grab_focus(a).unwrap();

    assert!(!tree.release_focus(b));
    assert!(tree.has_focus(a));
    assert!(tree.release_focus(a));
    assert_eq!(tree.focused_control(), None);
}

#[test]
fn focus_rejects_passive_and_detached_controls() {
    let mut tree = SceneTree::new();
    let passive = control_node(&mut tree, Control::passive(Vec2::ONE));
    assert!(matches!(
        tree.grab_focus(passive),
        Err(GroveError::NotFocusable(_))
    ));

    let detached = tree.create_node(Node::new("detached"));
    tree.attach_component(detached, Control::default()).unwrap();
    assert!(matches!(
        tree.grab_focus(detached),
        Err(GroveError::NotFocusable(_))
    ));

    let plain = tree.create_node(Node::new("plain"));
    assert!(matches!(
        tree.grab_focus(plain),
        Err(GroveError::ComponentMissing { .. })
    ));
}

#[test]
fn focus_released_on_exit_and_component_detach() {
    let mut tree = SceneTree::new();
    let a = control_node(&mut tree, Control::default());
    tree.grab_focus(a).unwrap();
    tree.detach(a).unwrap();
    assert_eq!(tree.focused_control(), None);

    let b = control_node(&mut tree, Control::default());
    tree.grab_focus(b).unwrap();
    tree.detach_component::<Control>(b).unwrap();
    assert_eq!(tree.focused_control(), None);
}
