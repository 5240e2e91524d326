//! [`PhysicsWorld`] backed by Rapier2D (0.18).
//!
//! Body specs use per-step units tuned for a 60 Hz step; Rapier works per
//! second, so velocities, drag and sleep delays are converted on the way in.

use macroquad::color::Color;
use macroquad::math::{Vec2, vec2};
use rapier2d::prelude::*;

use crate::modules::world::{BodyHandle, BodySpec, BodyView, PhysicsWorld, Shape};

/// Step rate the per-step units in [`BodySpec`] refer to.
pub const STEPS_PER_SECOND: f32 = 60.0;

/// Linear speed (units/s) below which a ball may start falling asleep.
pub const SLEEP_LINEAR_THRESHOLD: f32 = 5.0;
/// Angular speed (rad/s) below which a ball may start falling asleep.
pub const SLEEP_ANGULAR_THRESHOLD: f32 = 0.5;

/// Per-second linear damping equivalent to losing `fraction` of the velocity every step.
pub fn damping_per_second(fraction: f32) -> f32 {
    let kept = (1.0 - fraction).clamp(1e-3, 1.0);
    -kept.ln() * STEPS_PER_SECOND
}

struct Entry {
    handle: RigidBodyHandle,
    shape: Shape,
    fill: Color,
}

pub struct RapierWorld {
    // Positive y points down, matching screen coordinates
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    // Joints and CCD are not used by the board but the pipeline requires them
    joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    entries: Vec<Entry>,
}

impl RapierWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity: vector![0.0, gravity],
            integration_params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            entries: Vec::new(),
        }
    }

    fn body(&self, body: BodyHandle) -> &RigidBody {
        &self.bodies[self.entries[body.0].handle]
    }

    fn body_mut(&mut self, body: BodyHandle) -> &mut RigidBody {
        &mut self.bodies[self.entries[body.0].handle]
    }

    #[cfg(test)]
    fn position(&self, body: BodyHandle) -> Vec2 {
        let t = self.body(body).translation();
        vec2(t.x, t.y)
    }

    #[cfg(test)]
    fn linear_velocity(&self, body: BodyHandle) -> Vec2 {
        let v = self.body(body).linvel();
        vec2(v.x, v.y)
    }
}

impl PhysicsWorld for RapierWorld {
    fn add_body(&mut self, spec: BodySpec) -> BodyHandle {
        let material = spec.material;

        // ---------------- Rigid body ----------------------------------------
        // Fixed bodies have infinite mass and never move; dynamic ones fall under gravity.
        // CCD keeps small fast balls from tunnelling through the 1-unit dividers
        let mut builder = if spec.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic().ccd_enabled(true)
        };
        // Centre position and rotation (radians) in board coordinates
        builder = builder
            .translation(vector![spec.position.x, spec.position.y])
            .rotation(spec.angle);
        // Air friction slows both sliding and spinning
        if let Some(drag) = material.air_friction {
            let damping = damping_per_second(drag);
            builder = builder.linear_damping(damping).angular_damping(damping);
        }
        let mut body = builder.build();
        // Sleeping: the body must stay below both thresholds this long before it sleeps
        if let Some(steps) = material.sleep_threshold {
            let activation = body.activation_mut();
            activation.time_until_sleep = steps as f32 / STEPS_PER_SECOND;
            activation.linear_threshold = SLEEP_LINEAR_THRESHOLD;
            activation.angular_threshold = SLEEP_ANGULAR_THRESHOLD;
        }

        // ---------------- Collider ------------------------------------------
        // Rapier cuboids take half-extents
        let mut collider = match spec.shape {
            Shape::Circle { radius } => ColliderBuilder::ball(radius),
            Shape::Rect { width, height } => ColliderBuilder::cuboid(width / 2.0, height / 2.0),
        };
        // A contact uses the bouncier restitution and the smaller friction of the pair.
        // Max and Min outrank the default Average rule, so a ball's coefficients
        // hold against every static body
        if let Some(restitution) = material.restitution {
            collider = collider
                .restitution(restitution)
                .restitution_combine_rule(CoefficientCombineRule::Max);
        }
        if let Some(friction) = material.friction {
            collider = collider
                .friction(friction)
                .friction_combine_rule(CoefficientCombineRule::Min);
        }

        // Insert the body, then attach its collider so it follows the body
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        self.entries.push(Entry {
            handle,
            shape: spec.shape,
            fill: spec.fill,
        });
        BodyHandle(self.entries.len() - 1)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        let v = velocity * STEPS_PER_SECOND;
        self.body_mut(body).set_linvel(vector![v.x, v.y], true);
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: f32) {
        self.body_mut(body)
            .set_angvel(velocity * STEPS_PER_SECOND, true);
    }

    fn set_static(&mut self, body: BodyHandle, is_static: bool) {
        let body_type = if is_static {
            RigidBodyType::Fixed
        } else {
            RigidBodyType::Dynamic
        };
        self.body_mut(body).set_body_type(body_type, true);
    }

    fn is_static(&self, body: BodyHandle) -> bool {
        self.body(body).is_fixed()
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        let body = self.body(body);
        body.is_dynamic() && body.is_sleeping()
    }

    fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;
        // Advance the simulation: integrate, detect and resolve collisions, update islands
        self.pipeline.step(
            &self.gravity,            // Downward pull on every dynamic body
            &self.integration_params, // Timestep and solver settings
            &mut self.island_manager, // Tracks which bodies are awake or asleep
            &mut self.broad_phase,    // Coarse overlap tests
            &mut self.narrow_phase,   // Exact contacts for the overlapping pairs
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,                     // No query pipeline; nothing raycasts
            &(),                      // No physics hooks
            &(),                      // No event handler; sleep is polled instead
        );
    }

    fn body_count(&self) -> usize {
        self.entries.len()
    }

    fn bodies(&self) -> Box<dyn Iterator<Item = BodyView> + '_> {
        Box::new(self.entries.iter().map(|entry| {
            let body = &self.bodies[entry.handle];
            let pos = body.translation();
            BodyView {
                shape: entry.shape,
                position: vec2(pos.x, pos.y),
                angle: body.rotation().angle(),
                fill: entry.fill,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::world::Material;

    const DT: f32 = 1.0 / STEPS_PER_SECOND;

    #[test]
    fn damping_matches_per_step_drag() {
        assert_eq!(damping_per_second(0.0), 0.0);
        // one second of 4.2% per-step drag
        let kept = (-damping_per_second(0.042)).exp();
        assert!((kept - 0.958f32.powf(60.0)).abs() < 1e-4);
    }

    #[test]
    fn dynamic_bodies_fall_and_static_ones_do_not() {
        let mut world = RapierWorld::new(1000.0);
        let wall = world.add_body(BodySpec::rect(vec2(150.0, 300.0), 50.0, 2.0).fixed());
        let ball = world.add_body(BodySpec::circle(vec2(150.0, 15.0), 2.0));
        for _ in 0..10 {
            world.step(DT);
        }
        assert!(world.position(ball).y > 15.0);
        assert_eq!(world.position(wall), vec2(150.0, 300.0));
        assert!(world.is_static(wall));
        assert!(!world.is_static(ball));
    }

    #[test]
    fn velocities_are_converted_to_per_second() {
        let mut world = RapierWorld::new(0.0);
        let ball = world.add_body(BodySpec::circle(vec2(0.0, 0.0), 2.0));
        world.set_velocity(ball, vec2(0.05, 0.0));
        assert!((world.linear_velocity(ball).x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn resting_ball_falls_asleep_and_freezes() {
        let mut world = RapierWorld::new(1000.0);
        world.add_body(BodySpec::rect(vec2(150.0, 100.0), 300.0, 20.0).fixed());
        let ball = world.add_body(
            BodySpec::circle(vec2(150.0, 85.0), 2.0).material(Material {
                restitution: Some(0.0),
                friction: Some(0.5),
                air_friction: Some(0.042),
                sleep_threshold: Some(25),
            }),
        );

        let mut slept = false;
        for _ in 0..600 {
            world.step(DT);
            if world.is_sleeping(ball) {
                slept = true;
                break;
            }
        }
        assert!(slept, "ball resting on the floor should fall asleep");

        world.set_static(ball, true);
        assert!(world.is_static(ball));
        assert!(!world.is_sleeping(ball));
    }

    #[test]
    fn ball_keeps_its_own_restitution_against_the_floor() {
        let mut world = RapierWorld::new(0.0);
        // default material: restitution 0, friction 0.5
        world.add_body(BodySpec::rect(vec2(0.0, 30.0), 100.0, 20.0).fixed());
        let ball = world.add_body(BodySpec::circle(vec2(0.0, 0.0), 2.0).material(Material {
            restitution: Some(0.5),
            friction: Some(0.00001),
            ..Material::default()
        }));
        // 120 units/s straight down
        world.set_velocity(ball, vec2(0.0, 2.0));

        for _ in 0..60 {
            world.step(DT);
        }

        let v = world.linear_velocity(ball);
        assert!(v.y < 0.0, "ball should rebound, got {v:?}");
        let ratio = -v.y / 120.0;
        // averaging with the floor would give 0.25
        assert!((0.4..=0.6).contains(&ratio), "rebound ratio {ratio}");
    }

    #[test]
    fn frozen_ball_still_blocks_falling_balls() {
        let mut world = RapierWorld::new(1000.0);
        let frozen = world.add_body(BodySpec::circle(vec2(150.0, 80.0), 2.0));
        world.set_static(frozen, true);

        let falling = world.add_body(BodySpec::circle(vec2(150.0, 40.0), 2.0).material(Material {
            restitution: Some(0.0),
            ..Material::default()
        }));
        for _ in 0..300 {
            world.step(DT);
        }

        assert_eq!(world.position(frozen), vec2(150.0, 80.0));
        let rest = world.position(falling);
        // centres are one diameter apart when resting on top
        assert!(rest.y < 80.0 - 3.5, "ball fell through to {rest:?}");
        assert!(rest.y > 70.0, "ball never landed: {rest:?}");
        assert!(world.linear_velocity(falling).length() < 5.0);
    }

    #[test]
    fn views_report_shapes_and_angles() {
        let mut world = RapierWorld::new(0.0);
        world.add_body(BodySpec::rect(vec2(40.0, 180.0), 140.0, 2.0).fixed().angle(0.5));
        let view = world.bodies().next().expect("view");
        assert_eq!(
            view.shape,
            Shape::Rect {
                width: 140.0,
                height: 2.0
            }
        );
        assert!((view.angle - 0.5).abs() < 1e-5);
        assert_eq!(view.position, vec2(40.0, 180.0));
    }
}
