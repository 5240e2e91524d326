//! The physics engine seam.
//!
//! Everything the board needs from a rigid-body engine goes through
//! [`PhysicsWorld`]. Bodies are described with [`BodySpec`] using the
//! per-step units the board geometry was tuned in (velocity in units per
//! step, air friction as a per-step fraction, sleep threshold in steps);
//! each engine adapter converts to its own units.

use macroquad::color::Color;
use macroquad::math::Vec2;

/// Opaque handle to a body owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Full width and height, centred on the body position.
    Rect { width: f32, height: f32 },
}

/// Surface and damping properties. `None` leaves the engine default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    pub restitution: Option<f32>,
    pub friction: Option<f32>,
    /// Fraction of velocity lost to drag every step.
    pub air_friction: Option<f32>,
    /// Steps a body has to stay below the engine's motion threshold before it sleeps.
    pub sleep_threshold: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub is_static: bool,
    pub material: Material,
    pub fill: Color,
}

impl BodySpec {
    pub fn circle(position: Vec2, radius: f32) -> Self {
        Self::new(Shape::Circle { radius }, position)
    }

    pub fn rect(position: Vec2, width: f32, height: f32) -> Self {
        Self::new(Shape::Rect { width, height }, position)
    }

    fn new(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            is_static: false,
            material: Material::default(),
            fill: Color::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }
}

/// Snapshot of a body for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub fill: Color,
}

pub trait PhysicsWorld {
    /// Insert a body into the world. The world owns it from here on.
    fn add_body(&mut self, spec: BodySpec) -> BodyHandle;

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: f32);

    /// Static bodies stop moving but stay collidable.
    fn set_static(&mut self, body: BodyHandle, is_static: bool);

    fn is_static(&self, body: BodyHandle) -> bool;

    /// Whether the engine currently considers the body at rest.
    fn is_sleeping(&self, body: BodyHandle) -> bool;

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    fn body_count(&self) -> usize;

    fn bodies(&self) -> Box<dyn Iterator<Item = BodyView> + '_>;
}

#[derive(Debug, Clone)]
struct MemoryBody {
    spec: BodySpec,
    velocity: Vec2,
    angular_velocity: f32,
    sleeping: bool,
    static_changes: usize,
}

/// A world that stores bodies without simulating them.
///
/// Bodies never move and only fall asleep when told to with
/// [`MemoryWorld::put_to_sleep`]. Used for headless checks of board layout
/// and drop scheduling.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    bodies: Vec<MemoryBody>,
    elapsed: f32,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec(&self, body: BodyHandle) -> &BodySpec {
        &self.bodies[body.0].spec
    }

    pub fn velocity(&self, body: BodyHandle) -> Vec2 {
        self.bodies[body.0].velocity
    }

    pub fn angular_velocity(&self, body: BodyHandle) -> f32 {
        self.bodies[body.0].angular_velocity
    }

    /// How many times `set_static` was applied to the body.
    pub fn static_changes(&self, body: BodyHandle) -> usize {
        self.bodies[body.0].static_changes
    }

    pub fn put_to_sleep(&mut self, body: BodyHandle) {
        self.bodies[body.0].sleeping = true;
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        (0..self.bodies.len()).map(BodyHandle)
    }

    pub fn specs(&self) -> impl Iterator<Item = &BodySpec> + '_ {
        self.bodies.iter().map(|b| &b.spec)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl PhysicsWorld for MemoryWorld {
    fn add_body(&mut self, spec: BodySpec) -> BodyHandle {
        self.bodies.push(MemoryBody {
            spec,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            sleeping: false,
            static_changes: 0,
        });
        BodyHandle(self.bodies.len() - 1)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        self.bodies[body.0].velocity = velocity;
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: f32) {
        self.bodies[body.0].angular_velocity = velocity;
    }

    fn set_static(&mut self, body: BodyHandle, is_static: bool) {
        let b = &mut self.bodies[body.0];
        b.spec.is_static = is_static;
        b.static_changes += 1;
        if is_static {
            b.velocity = Vec2::ZERO;
            b.angular_velocity = 0.0;
        }
    }

    fn is_static(&self, body: BodyHandle) -> bool {
        self.bodies[body.0].spec.is_static
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.bodies[body.0].sleeping
    }

    fn step(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn bodies(&self) -> Box<dyn Iterator<Item = BodyView> + '_> {
        Box::new(self.bodies.iter().map(|b| BodyView {
            shape: b.spec.shape,
            position: b.spec.position,
            angle: b.spec.angle,
            fill: b.spec.fill,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::math::vec2;

    #[test]
    fn spec_builders_compose() {
        let spec = BodySpec::rect(vec2(10.0, 20.0), 5.0, 2.0)
            .fixed()
            .angle(0.5);
        assert!(spec.is_static);
        assert_eq!(spec.angle, 0.5);
        assert_eq!(
            spec.shape,
            Shape::Rect {
                width: 5.0,
                height: 2.0
            }
        );
    }

    #[test]
    fn memory_world_hands_out_sequential_handles() {
        let mut world = MemoryWorld::new();
        let a = world.add_body(BodySpec::circle(vec2(0.0, 0.0), 1.0));
        let b = world.add_body(BodySpec::circle(vec2(1.0, 0.0), 1.0));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.bodies().count(), 2);
    }

    #[test]
    fn freezing_clears_motion() {
        let mut world = MemoryWorld::new();
        let ball = world.add_body(BodySpec::circle(vec2(0.0, 0.0), 1.0));
        world.set_velocity(ball, vec2(0.03, 0.0));
        world.set_angular_velocity(ball, 0.01);
        world.set_static(ball, true);
        assert!(world.is_static(ball));
        assert_eq!(world.velocity(ball), Vec2::ZERO);
        assert_eq!(world.angular_velocity(ball), 0.0);
        assert_eq!(world.static_changes(ball), 1);
    }
}
