//! # Map-of-Components ECS
//!
//! A deliberately small Entity Component System. Each entity owns a bag of
//! components (at most one per type), the registry keeps an index from
//! component type to the entities holding it, and a scheduler drives systems
//! through four life-cycle phases.
//!
//! There is no archetype or columnar storage here: every component is boxed
//! and keyed by type. What we get in return is O(1) attach/detach and
//! "who has K?" answered straight from the index.
//!
//! ## Module Overview
//!
//! - [`entity`] — Sequential, never-reused entity ids
//! - [`component`] — Component kinds and the per-entity component bag
//! - [`registry`] — Live entities, their components, and the kind index
//! - [`system`] — System trait, phases, and the scheduler

pub mod component;
pub mod entity;
pub mod registry;
pub mod system;

pub use component::{ComponentKind, Components};
pub use entity::Entity;
pub use registry::{EntityMut, Registry};
pub use system::{FnSystem, Phase, Phases, Scheduler, System};

#[cfg(feature = "diagnostics")]
pub use system::SystemTiming;
