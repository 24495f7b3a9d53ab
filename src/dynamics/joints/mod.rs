//! Joint constraints. Each variant owns its solver state and follows the
//! same contract: `init_velocity_constraints`, `solve_velocity_constraints`,
//! and `solve_position_constraints` (returning convergence).

pub mod distance;
pub mod friction;
pub mod gear;
pub mod motor;
pub mod mouse;
pub mod prismatic;
pub mod pulley;
pub mod revolute;
pub mod weld;
pub mod wheel;

use glam::Vec2;

use crate::{
    core::body::RigidBody,
    dynamics::SolverData,
    utils::allocator::{Arena, EntityId},
};

pub use distance::{DistanceJoint, DistanceJointDef};
pub use friction::{FrictionJoint, FrictionJointDef};
pub use gear::{GearJoint, GearJointDef};
pub use motor::{MotorJoint, MotorJointDef};
pub use mouse::{MouseJoint, MouseJointDef};
pub use prismatic::{PrismaticJoint, PrismaticJointDef};
pub use pulley::{PulleyJoint, PulleyJointDef};
pub use revolute::{RevoluteJoint, RevoluteJointDef};
pub use weld::{WeldJoint, WeldJointDef};
pub use wheel::{WheelJoint, WheelJointDef};

/// Converts an oscillation frequency and damping ratio into the stiffness
/// and damping coefficients used by the soft constraints.
pub fn linear_stiffness(
    frequency_hertz: f32,
    damping_ratio: f32,
    mass_a: f32,
    mass_b: f32,
) -> (f32, f32) {
    let mass = if mass_a > 0.0 && mass_b > 0.0 {
        mass_a * mass_b / (mass_a + mass_b)
    } else if mass_a > 0.0 {
        mass_a
    } else {
        mass_b
    };
    let omega = 2.0 * std::f32::consts::PI * frequency_hertz;
    (mass * omega * omega, 2.0 * mass * damping_ratio * omega)
}

/// Angular analogue of [`linear_stiffness`], based on rotational inertia.
pub fn angular_stiffness(
    frequency_hertz: f32,
    damping_ratio: f32,
    inertia_a: f32,
    inertia_b: f32,
) -> (f32, f32) {
    let inertia = if inertia_a > 0.0 && inertia_b > 0.0 {
        inertia_a * inertia_b / (inertia_a + inertia_b)
    } else if inertia_a > 0.0 {
        inertia_a
    } else {
        inertia_b
    };
    let omega = 2.0 * std::f32::consts::PI * frequency_hertz;
    (inertia * omega * omega, 2.0 * inertia * damping_ratio * omega)
}

/// Construction parameters for every joint variant.
#[derive(Debug, Clone)]
pub enum JointDef {
    Distance(DistanceJointDef),
    Revolute(RevoluteJointDef),
    Prismatic(PrismaticJointDef),
    Pulley(PulleyJointDef),
    Mouse(MouseJointDef),
    Gear(GearJointDef),
    Wheel(WheelJointDef),
    Weld(WeldJointDef),
    Friction(FrictionJointDef),
    Motor(MotorJointDef),
}

impl JointDef {
    pub fn body_a(&self) -> EntityId {
        match self {
            JointDef::Distance(d) => d.body_a,
            JointDef::Revolute(d) => d.body_a,
            JointDef::Prismatic(d) => d.body_a,
            JointDef::Pulley(d) => d.body_a,
            JointDef::Mouse(d) => d.body_a,
            JointDef::Gear(_) => EntityId::default(),
            JointDef::Wheel(d) => d.body_a,
            JointDef::Weld(d) => d.body_a,
            JointDef::Friction(d) => d.body_a,
            JointDef::Motor(d) => d.body_a,
        }
    }

    pub fn body_b(&self) -> EntityId {
        match self {
            JointDef::Distance(d) => d.body_b,
            JointDef::Revolute(d) => d.body_b,
            JointDef::Prismatic(d) => d.body_b,
            JointDef::Pulley(d) => d.body_b,
            JointDef::Mouse(d) => d.body_b,
            JointDef::Gear(_) => EntityId::default(),
            JointDef::Wheel(d) => d.body_b,
            JointDef::Weld(d) => d.body_b,
            JointDef::Friction(d) => d.body_b,
            JointDef::Motor(d) => d.body_b,
        }
    }

    pub fn collide_connected(&self) -> bool {
        match self {
            JointDef::Distance(d) => d.collide_connected,
            JointDef::Revolute(d) => d.collide_connected,
            JointDef::Prismatic(d) => d.collide_connected,
            JointDef::Pulley(d) => d.collide_connected,
            JointDef::Mouse(d) => d.collide_connected,
            JointDef::Gear(d) => d.collide_connected,
            JointDef::Wheel(d) => d.collide_connected,
            JointDef::Weld(d) => d.collide_connected,
            JointDef::Friction(d) => d.collide_connected,
            JointDef::Motor(d) => d.collide_connected,
        }
    }
}

/// A joint instance in the world. The enum dispatches the solver contract
/// to the variant's implementation.
#[derive(Debug, Clone)]
pub enum Joint {
    Distance(DistanceJoint),
    Revolute(RevoluteJoint),
    Prismatic(PrismaticJoint),
    Pulley(PulleyJoint),
    Mouse(MouseJoint),
    Gear(GearJoint),
    Wheel(WheelJoint),
    Weld(WeldJoint),
    Friction(FrictionJoint),
    Motor(MotorJoint),
}

impl Joint {
    pub fn body_a(&self) -> EntityId {
        match self {
            Joint::Distance(j) => j.body_a,
            Joint::Revolute(j) => j.body_a,
            Joint::Prismatic(j) => j.body_a,
            Joint::Pulley(j) => j.body_a,
            Joint::Mouse(j) => j.body_a,
            Joint::Gear(j) => j.body_a,
            Joint::Wheel(j) => j.body_a,
            Joint::Weld(j) => j.body_a,
            Joint::Friction(j) => j.body_a,
            Joint::Motor(j) => j.body_a,
        }
    }

    pub fn body_b(&self) -> EntityId {
        match self {
            Joint::Distance(j) => j.body_b,
            Joint::Revolute(j) => j.body_b,
            Joint::Prismatic(j) => j.body_b,
            Joint::Pulley(j) => j.body_b,
            Joint::Mouse(j) => j.body_b,
            Joint::Gear(j) => j.body_b,
            Joint::Wheel(j) => j.body_b,
            Joint::Weld(j) => j.body_b,
            Joint::Friction(j) => j.body_b,
            Joint::Motor(j) => j.body_b,
        }
    }

    pub fn collide_connected(&self) -> bool {
        match self {
            Joint::Distance(j) => j.collide_connected,
            Joint::Revolute(j) => j.collide_connected,
            Joint::Prismatic(j) => j.collide_connected,
            Joint::Pulley(j) => j.collide_connected,
            Joint::Mouse(j) => j.collide_connected,
            Joint::Gear(j) => j.collide_connected,
            Joint::Wheel(j) => j.collide_connected,
            Joint::Weld(j) => j.collide_connected,
            Joint::Friction(j) => j.collide_connected,
            Joint::Motor(j) => j.collide_connected,
        }
    }

    pub(crate) fn island_flag(&self) -> bool {
        match self {
            Joint::Distance(j) => j.island_flag,
            Joint::Revolute(j) => j.island_flag,
            Joint::Prismatic(j) => j.island_flag,
            Joint::Pulley(j) => j.island_flag,
            Joint::Mouse(j) => j.island_flag,
            Joint::Gear(j) => j.island_flag,
            Joint::Wheel(j) => j.island_flag,
            Joint::Weld(j) => j.island_flag,
            Joint::Friction(j) => j.island_flag,
            Joint::Motor(j) => j.island_flag,
        }
    }

    pub(crate) fn set_island_flag(&mut self, flag: bool) {
        match self {
            Joint::Distance(j) => j.island_flag = flag,
            Joint::Revolute(j) => j.island_flag = flag,
            Joint::Prismatic(j) => j.island_flag = flag,
            Joint::Pulley(j) => j.island_flag = flag,
            Joint::Mouse(j) => j.island_flag = flag,
            Joint::Gear(j) => j.island_flag = flag,
            Joint::Wheel(j) => j.island_flag = flag,
            Joint::Weld(j) => j.island_flag = flag,
            Joint::Friction(j) => j.island_flag = flag,
            Joint::Motor(j) => j.island_flag = flag,
        }
    }

    pub fn init_velocity_constraints(&mut self, bodies: &Arena<RigidBody>, data: &mut SolverData) {
        match self {
            Joint::Distance(j) => j.init_velocity_constraints(bodies, data),
            Joint::Revolute(j) => j.init_velocity_constraints(bodies, data),
            Joint::Prismatic(j) => j.init_velocity_constraints(bodies, data),
            Joint::Pulley(j) => j.init_velocity_constraints(bodies, data),
            Joint::Mouse(j) => j.init_velocity_constraints(bodies, data),
            Joint::Gear(j) => j.init_velocity_constraints(bodies, data),
            Joint::Wheel(j) => j.init_velocity_constraints(bodies, data),
            Joint::Weld(j) => j.init_velocity_constraints(bodies, data),
            Joint::Friction(j) => j.init_velocity_constraints(bodies, data),
            Joint::Motor(j) => j.init_velocity_constraints(bodies, data),
        }
    }

    pub fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        match self {
            Joint::Distance(j) => j.solve_velocity_constraints(data),
            Joint::Revolute(j) => j.solve_velocity_constraints(data),
            Joint::Prismatic(j) => j.solve_velocity_constraints(data),
            Joint::Pulley(j) => j.solve_velocity_constraints(data),
            Joint::Mouse(j) => j.solve_velocity_constraints(data),
            Joint::Gear(j) => j.solve_velocity_constraints(data),
            Joint::Wheel(j) => j.solve_velocity_constraints(data),
            Joint::Weld(j) => j.solve_velocity_constraints(data),
            Joint::Friction(j) => j.solve_velocity_constraints(data),
            Joint::Motor(j) => j.solve_velocity_constraints(data),
        }
    }

    pub fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        match self {
            Joint::Distance(j) => j.solve_position_constraints(data),
            Joint::Revolute(j) => j.solve_position_constraints(data),
            Joint::Prismatic(j) => j.solve_position_constraints(data),
            Joint::Pulley(j) => j.solve_position_constraints(data),
            Joint::Mouse(j) => j.solve_position_constraints(data),
            Joint::Gear(j) => j.solve_position_constraints(data),
            Joint::Wheel(j) => j.solve_position_constraints(data),
            Joint::Weld(j) => j.solve_position_constraints(data),
            Joint::Friction(j) => j.solve_position_constraints(data),
            Joint::Motor(j) => j.solve_position_constraints(data),
        }
    }

    /// Constraint force on body B at the anchor, in Newtons.
    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        match self {
            Joint::Distance(j) => j.reaction_force(inv_dt),
            Joint::Revolute(j) => j.reaction_force(inv_dt),
            Joint::Prismatic(j) => j.reaction_force(inv_dt),
            Joint::Pulley(j) => j.reaction_force(inv_dt),
            Joint::Mouse(j) => j.reaction_force(inv_dt),
            Joint::Gear(j) => j.reaction_force(inv_dt),
            Joint::Wheel(j) => j.reaction_force(inv_dt),
            Joint::Weld(j) => j.reaction_force(inv_dt),
            Joint::Friction(j) => j.reaction_force(inv_dt),
            Joint::Motor(j) => j.reaction_force(inv_dt),
        }
    }

    /// Constraint torque on body B, in Newton-meters.
    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        match self {
            Joint::Distance(j) => j.reaction_torque(inv_dt),
            Joint::Revolute(j) => j.reaction_torque(inv_dt),
            Joint::Prismatic(j) => j.reaction_torque(inv_dt),
            Joint::Pulley(j) => j.reaction_torque(inv_dt),
            Joint::Mouse(j) => j.reaction_torque(inv_dt),
            Joint::Gear(j) => j.reaction_torque(inv_dt),
            Joint::Wheel(j) => j.reaction_torque(inv_dt),
            Joint::Weld(j) => j.reaction_torque(inv_dt),
            Joint::Friction(j) => j.reaction_torque(inv_dt),
            Joint::Motor(j) => j.reaction_torque(inv_dt),
        }
    }
}
