//! Rigid-Body World: authoritative body state, fixed-step simulation, ray casts.
//!
//! # Invariants
//! - Bodies are the sole source of truth for position and orientation.
//! - Stepping never fails; extreme deltas may tunnel, which is accepted.
//! - Broadphase is exhaustive (all pairs). Fine for a few hundred spheres,
//!   quadratic beyond that.

mod arena;
pub mod body;
mod contact;
pub mod ray;
pub mod world;

pub use arena::{Arena, Handle};
pub use body::{Plane, RigidBody};
pub use ray::{Ray, ray_sphere};
pub use world::{BodyHandle, PhysicsWorld, PlaneHandle};
