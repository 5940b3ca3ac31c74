//! Physics system and backends.
//!
//! Each fixed step the [`PhysicsSystem`]:
//! 1. pushes the world pose of every active body whose owner's world version
//!    moved since the last sync,
//! 2. lets the [`PhysicsBackend`] solve the step,
//! 3. pulls solved dynamic poses back into the owning transforms and records
//!    the resulting world version as synced.

use glam::Vec2;

use crate::components::{Aabb, BodyKind, Collider, Rigidbody};
use crate::errors::Result;
use crate::scene::{NodeHandle, SceneTree};
use crate::systems::{EngineSystem, order};

/// Backend-side copy of a rigidbody for one step.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    pub node: NodeHandle,
    pub kind: BodyKind,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub mass: f32,
    pub gravity_scale: f32,
    /// Collider bounds relative to `position`.
    pub bounds: Option<Aabb>,
}

impl PhysicsBody {
    #[must_use]
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.bounds.map(|b| Aabb {
            min: b.min + self.position,
            max: b.max + self.position,
        })
    }
}

/// Solves one fixed step over the collected bodies.
pub trait PhysicsBackend {
    fn name(&self) -> &str;

    fn step(&mut self, bodies: &mut [PhysicsBody], gravity: Vec2, fixed_delta: f32) -> Result<()>;
}

/// Backend that leaves every body where it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubBackend;

impl PhysicsBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn step(&mut self, _bodies: &mut [PhysicsBody], _gravity: Vec2, _fixed_delta: f32) -> Result<()> {
        Ok(())
    }
}

/// Semi-implicit Euler integration with dynamic-vs-fixed AABB resolution.
///
/// Static and kinematic bodies act as immovable obstacles. Dynamic bodies do
/// not collide with each other.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicBackend;

impl PhysicsBackend for BasicBackend {
    fn name(&self) -> &str {
        "basic"
    }

    fn step(&mut self, bodies: &mut [PhysicsBody], gravity: Vec2, fixed_delta: f32) -> Result<()> {
        for body in bodies.iter_mut().filter(|b| b.kind == BodyKind::Dynamic) {
            body.velocity += gravity * body.gravity_scale * fixed_delta;
            body.position += body.velocity * fixed_delta;
        }

        let obstacles: Vec<Aabb> = bodies
            .iter()
            .filter(|b| b.kind != BodyKind::Dynamic)
            .filter_map(PhysicsBody::world_bounds)
            .collect();

        for body in bodies.iter_mut().filter(|b| b.kind == BodyKind::Dynamic) {
            for obstacle in &obstacles {
                let Some(bounds) = body.world_bounds() else {
                    break;
                };
                let Some(depth) = bounds.overlap(obstacle) else {
                    continue;
                };
                // Separate along the axis of least penetration
                let away = bounds.center() - obstacle.center();
                if depth.x < depth.y {
                    body.position.x += depth.x.copysign(away.x);
                    body.velocity.x = 0.0;
                } else {
                    body.position.y += depth.y.copysign(away.y);
                    body.velocity.y = 0.0;
                }
            }
        }
        Ok(())
    }
}

/// Synchronizes rigidbodies with a physics backend once per fixed step.
pub struct PhysicsSystem {
    backend: Box<dyn PhysicsBackend>,
    gravity: Vec2,
    bodies: Vec<PhysicsBody>,
    steps: u64,
}

impl PhysicsSystem {
    #[must_use]
    pub fn new(backend: impl PhysicsBackend + 'static, gravity: Vec2) -> Self {
        Self {
            backend: Box::new(backend),
            gravity,
            bodies: Vec::new(),
            steps: 0,
        }
    }

    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Fixed steps run so far.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Runs one fixed step over every enabled, in-tree rigidbody.
    pub fn step(&mut self, fixed_delta: f32, tree: &mut SceneTree) -> Result<()> {
        self.bodies.clear();

        for handle in tree.traverse_preorder(tree.root()) {
            if !tree.is_active(handle) || !tree.has_component::<Rigidbody>(handle) {
                continue;
            }
            let world = tree.world_transform(handle)?;
            let bounds = tree
                .try_component::<Collider>(handle)
                .map(|c| c.aabb_at(Vec2::ZERO, world.scale));

            let body = tree.component_mut::<Rigidbody>(handle)?;
            body.push_pose(world.position, world.rotation, world.version);
            self.bodies.push(PhysicsBody {
                node: handle,
                kind: body.kind,
                position: body.position,
                rotation: body.rotation,
                velocity: body.velocity,
                mass: body.mass,
                gravity_scale: body.gravity_scale,
                bounds,
            });
        }

        self.backend.step(&mut self.bodies, self.gravity, fixed_delta)?;

        for solved in self.bodies.iter().filter(|b| b.kind == BodyKind::Dynamic) {
            {
                let body = tree.component_mut::<Rigidbody>(solved.node)?;
                body.position = solved.position;
                body.rotation = solved.rotation;
                body.velocity = solved.velocity;
            }
            tree.set_world_position(solved.node, solved.position)?;
            let version = tree.world_version(solved.node)?;
            tree.component_mut::<Rigidbody>(solved.node)?
                .mark_pulled(version);
        }

        self.steps += 1;
        Ok(())
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(StubBackend, Vec2::new(0.0, -9.81))
    }
}

impl EngineSystem for PhysicsSystem {
    fn name(&self) -> &str {
        "physics"
    }

    fn order(&self) -> i32 {
        order::PHYSICS
    }

    fn initialize(&mut self, _tree: &mut SceneTree) -> Result<()> {
        log::info!("Physics backend: {}", self.backend.name());
        Ok(())
    }

    fn fixed_update(&mut self, tree: &mut SceneTree, fixed_delta: f32) -> Result<()> {
        self.step(fixed_delta, tree)
    }
}
