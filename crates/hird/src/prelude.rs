//! Convenience re-exports — `use hird::prelude::*` for the common items.

pub use crate::ecs::{
    ComponentKind, Components, Entity, EntityMut, FnSystem, Phase, Phases, Registry, Scheduler,
    System,
};

#[cfg(feature = "diagnostics")]
pub use crate::diag::DiagSnapshot;
