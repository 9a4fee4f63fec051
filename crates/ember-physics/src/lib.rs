//! Sub-stepped 2D circle physics over the SoA registry.
//!
//! Each tick the [`PhysicsSystem`] drains PHYS commands, integrates awake
//! bodies, rebuilds the dynamic spatial layer and runs a fixed number of
//! resolve passes against both spatial layers. Bodies pick up a
//! [`PhysMaterial`] through `material_id`; bouncy contacts exchange an
//! impulse, everything else only separates.

pub mod collision;
pub mod material;
pub mod system;


pub use collision::{Contact, circle_contact, normal_impulse, should_collide};
pub use material::{MaterialTable, PHYS_MAX_MATERIALS, PhysMaterial, material_ids};
pub use system::{NEIGHBOUR_CAPACITY, PhysicsSettings, PhysicsStats, PhysicsSystem};
