use std::sync::Arc;

use glam::{UVec2, Vec2};

use grove::assets::TextureRegistry;
use grove::components::{Collider, Rigidbody, Sprite, SpriteAnimator};
use grove::input::{ButtonState, InputEvent, Key};
use grove::prelude::*;
use grove::scene::PixelPerfect;

/// Kicks its body upwards whenever space goes down.
struct Kicker;

impl NodeBehavior for Kicker {
    fn hooks(&self) -> ProcessingFlags {
        ProcessingFlags::PROCESS
    }

    fn ready(&mut self, tree: &mut SceneTree, node: NodeHandle) -> Result<()> {
        log::info!("'{}' is ready", tree.node_checked(node)?.name);
        Ok(())
    }

    fn process(&mut self, tree: &mut SceneTree, node: NodeHandle, _delta: f32) -> Result<()> {
        if tree.input()?.get_key_down(Key::Space) {
            tree.component_mut::<Rigidbody>(node)?.velocity.y = 6.0;
            log::info!("Kick!");
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // === 1. Textures are metadata only ===
    let mut textures = TextureRegistry::new();
    let box_texture = textures.register("box_strip", UVec2::new(64, 16));

    let mut engine = Engine::with_default_systems(EngineSettings::default())?
        .with_assets(Arc::new(textures));
    let root = engine.tree.root();

    // === 2. Static floor ===
    let floor = engine.tree.create_node(Node::new("Floor"));
    engine.tree.attach_component(floor, Rigidbody::fixed())?;
    let mut floor_collider = Collider::rect(Vec2::new(8.0, 0.5));
    floor_collider.debug_draw = true;
    engine.tree.attach_component(floor, floor_collider)?;
    engine.tree.add_child(root, floor)?;

    // === 3. Animated falling box ===
    let crate_box = engine
        .tree
        .create_node(Node::with_behavior("Box", Kicker));
    engine.tree.node(crate_box).set_position(0.0, 6.0);
    engine.tree.attach_component(crate_box, Rigidbody::dynamic())?;
    engine
        .tree
        .attach_component(crate_box, Collider::rect(Vec2::splat(0.5)))?;
    engine
        .tree
        .attach_component(crate_box, Sprite::new(Some(box_texture), Vec2::ONE).with_layer(1))?;
    engine
        .tree
        .attach_component(crate_box, SpriteAnimator::from_strip(4, 0.1))?;
    engine.tree.add_to_group(crate_box, "props")?;
    engine.tree.add_child(root, crate_box)?;

    // === 4. Pixel-perfect camera ===
    let camera = engine.tree.create_node(Node::new("Camera"));
    engine.tree.attach_component(
        camera,
        Camera2D::pixel_perfect(PixelPerfect::new(180, 16.0), 16.0 / 9.0),
    )?;
    engine.tree.add_child(root, camera)?;
    engine.tree.set_current_camera(camera)?;

    // === 5. Drive three simulated seconds ===
    let publisher = engine.input_publisher();
    for frame in 0..180 {
        if frame == 90
            && let Some(publisher) = &publisher
        {
            publisher.publish(InputEvent::Key {
                key: Key::Space,
                state: ButtonState::Pressed,
            });
        }
        let state = engine.frame_with_delta(1.0 / 60.0)?;
        if frame % 30 == 0 {
            let y = engine.tree.world_transform(crate_box)?.position.y;
            log::info!(
                "frame {:>3}: box y = {y:.3}, fixed steps = {}",
                state.frame,
                state.fixed_steps
            );
        }
    }

    engine.stop()?;
    Ok(())
}
