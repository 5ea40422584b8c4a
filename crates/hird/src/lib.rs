//! # Hird — Minimal ECS Runtime Core
//!
//! A registry of entities, each an unordered bag of uniquely-typed
//! components, and a scheduler that drives systems through Setup, Tick,
//! Cleanup, and Teardown.
//!
//! The core does not own a game loop. A host creates a [`Registry`] and a
//! [`Scheduler`], then calls the phase entry points itself:
//!
//! ```ignore
//! use hird::prelude::*;
//!
//! let mut registry = Registry::new();
//! let mut scheduler = Scheduler::new();
//! scheduler.register(Movement::default());
//!
//! scheduler.setup(&mut registry);
//! for _ in 0..frames {
//!     scheduler.tick(&mut registry);
//!     scheduler.cleanup(&mut registry);
//! }
//! scheduler.teardown(&mut registry);
//! ```
//!
//! Start with `use hird::prelude::*`.

pub mod ecs;
pub mod prelude;

#[cfg(feature = "diagnostics")]
pub mod diag;

pub use ecs::{Entity, Registry, Scheduler, System};
