//! Collision detection modules: shapes, broad-phase tree, GJK distance,
//! time of impact, narrow-phase manifolds, contacts, and queries.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod distance;
pub mod narrowphase;
pub mod queries;
pub mod shapes;
pub mod toi;

pub use broadphase::{BroadPhase, DynamicTree};
pub use contact::{
    Contact, ContactFilter, ContactImpulse, ContactListener, DefaultContactFilter,
    DestructionListener,
};
pub use distance::{distance, shape_cast, test_overlap, DistanceInput, DistanceOutput, SimplexCache};
pub use narrowphase::{
    point_states, ContactFeature, FeatureType, Manifold, ManifoldKind, ManifoldPoint, PointState,
    WorldManifold,
};
pub use queries::{Aabb, RayCastInput, RayCastOutput, RaycastHit, RaycastQuery};
pub use shapes::{Chain, Circle, DistanceProxy, Edge, Polygon, Shape};
pub use toi::{time_of_impact, ToiInput, ToiOutput, ToiState};
