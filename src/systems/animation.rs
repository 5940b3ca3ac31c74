use crate::components::{Sprite, SpriteAnimator};
use crate::errors::Result;
use crate::scene::SceneTree;
use crate::systems::{EngineSystem, order};
use crate::utils::Time;

/// Animation system.
///
/// Advances every active [`SpriteAnimator`] and writes frame changes into the
/// owner's [`Sprite`]. Uses the `std::mem::take` technique to avoid borrow
/// conflicts between the animator and sprite storages.
#[derive(Debug, Default)]
pub struct AnimationSystem;

impl AnimationSystem {
    /// Updates all animators by `dt` seconds.
    pub fn advance_all(tree: &mut SceneTree, dt: f32) {
        // Temporarily take all animators out to avoid borrow conflicts
        let mut animators = std::mem::take(&mut tree.components.animators);

        for (handle, animator) in &mut animators {
            if !tree.is_active(handle) {
                continue;
            }
            if let Some(uv) = animator.advance(dt)
                && let Some(sprite) = tree.components.sprites.get_mut(handle)
            {
                sprite.set_uv(uv);
            }
        }

        // Return animators after update
        tree.components.animators = animators;
    }
}

impl EngineSystem for AnimationSystem {
    fn name(&self) -> &str {
        "animation"
    }

    fn order(&self) -> i32 {
        order::ANIMATION
    }

    fn update(&mut self, tree: &mut SceneTree, time: &Time) -> Result<()> {
        Self::advance_all(tree, time.dt_seconds());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    #[test]
    fn test_frame_change_updates_sprite_uv() {
        let mut tree = SceneTree::new();
        let node = tree.create_node(Node::new("anim"));
        tree.add_child(tree.root(), node).unwrap();
        tree.attach_component(node, Sprite::default()).unwrap();
        tree.attach_component(node, SpriteAnimator::from_strip(4, 0.1))
            .unwrap();

        AnimationSystem::advance_all(&mut tree, 0.15);

        let sprite = tree.component::<Sprite>(node).unwrap();
        assert!((sprite.uv().min.x - 0.25).abs() < 1e-6);
        assert!((sprite.uv().max.x - 0.5).abs() < 1e-6);
    }
}
