use glam::Vec2;

use crate::{
    config::{MAX_ROTATION, MAX_ROTATION_SQUARED, MAX_TRANSLATION, MAX_TRANSLATION_SQUARED},
    core::{
        body::{BodyType, RigidBody},
        types::{Position, Velocity},
    },
};

/// Semi-implicit Euler integration over the island scratch state.
pub struct Integrator;

impl Integrator {
    /// Accumulates gravity, external forces, and damping into the scratch
    /// velocity. Damping uses the implicit Padé form `v / (1 + h·d)`,
    /// which stays stable for any damping coefficient.
    pub fn integrate_velocity(
        body: &RigidBody,
        velocity: &mut Velocity,
        gravity: Vec2,
        dt: f32,
    ) {
        if body.body_type != BodyType::Dynamic {
            return;
        }

        velocity.linear += dt
            * body.inv_mass
            * (body.gravity_scale * body.mass * gravity + body.force);
        velocity.angular += dt * body.inv_inertia * body.torque;

        velocity.linear *= 1.0 / (1.0 + dt * body.linear_damping);
        velocity.angular *= 1.0 / (1.0 + dt * body.angular_damping);
    }

    /// Advances the scratch position, clamping large velocities so a
    /// single step cannot translate farther than [`MAX_TRANSLATION`] or
    /// rotate farther than [`MAX_ROTATION`].
    pub fn integrate_position(position: &mut Position, velocity: &mut Velocity, dt: f32) {
        let translation = dt * velocity.linear;
        if translation.length_squared() > MAX_TRANSLATION_SQUARED {
            let ratio = MAX_TRANSLATION / translation.length();
            velocity.linear *= ratio;
        }

        let rotation = dt * velocity.angular;
        if rotation * rotation > MAX_ROTATION_SQUARED {
            let ratio = MAX_ROTATION / rotation.abs();
            velocity.angular *= ratio;
        }

        position.c += dt * velocity.linear;
        position.a += dt * velocity.angular;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::{BodyDef, BodyType};
    use approx::assert_relative_eq;

    #[test]
    fn free_body_integration_is_exact() {
        let mut position = Position {
            c: Vec2::new(1.0, 2.0),
            a: 0.25,
        };
        let mut velocity = Velocity {
            linear: Vec2::new(3.0, -1.0),
            angular: 0.5,
        };

        let dt = 1.0 / 60.0;
        Integrator::integrate_position(&mut position, &mut velocity, dt);

        assert_eq!(position.c, Vec2::new(1.0, 2.0) + dt * Vec2::new(3.0, -1.0));
        assert_eq!(position.a, 0.25 + dt * 0.5);
    }

    #[test]
    fn damping_is_stable_for_large_coefficients() {
        let mut def = BodyDef::default();
        def.body_type = BodyType::Dynamic;
        def.linear_damping = 1000.0;
        let mut body = RigidBody::from_def(&def);
        body.set_mass_properties(1.0, Vec2::ZERO, 1.0);

        let mut velocity = Velocity {
            linear: Vec2::new(10.0, 0.0),
            angular: 0.0,
        };
        Integrator::integrate_velocity(&body, &mut velocity, Vec2::ZERO, 1.0 / 60.0);

        // Implicit damping only ever shrinks the magnitude.
        assert!(velocity.linear.x > 0.0);
        assert!(velocity.linear.x < 10.0);
    }

    #[test]
    fn runaway_translation_is_clamped() {
        let mut position = Position::default();
        let mut velocity = Velocity {
            linear: Vec2::new(100000.0, 0.0),
            angular: 0.0,
        };

        Integrator::integrate_position(&mut position, &mut velocity, 1.0 / 60.0);
        assert_relative_eq!(position.c.x, MAX_TRANSLATION, epsilon = 1e-4);
    }
}
