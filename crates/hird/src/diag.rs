//! Diagnostics snapshots — a serializable picture of a registry and a
//! scheduler.
//!
//! Enabled by the `diagnostics` feature flag. The core performs no I/O: a
//! host captures a [`DiagSnapshot`] whenever it likes (once per frame, on a
//! key press, ...) and ships the JSON from [`DiagSnapshot::to_json`] wherever
//! it wants.

use serde::Serialize;

use crate::ecs::{Phase, Registry, Scheduler};

// ── Wire types ───────────────────────────────────────────────────────────

/// Registry state at capture time.
#[derive(Serialize, Clone, Debug, Default)]
pub struct RegistrySnapshot {
    pub entity_count: usize,
    pub next_id: u32,
    /// Component kinds with at least one holder, largest bucket first.
    pub kinds: Vec<KindSnapshot>,
    /// Per-entity detail, only filled by [`RegistrySnapshot::capture_detailed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntitySnapshot>>,
}

#[derive(Serialize, Clone, Debug)]
pub struct KindSnapshot {
    pub name: String,
    pub entity_count: usize,
}

#[derive(Serialize, Clone, Debug)]
pub struct EntitySnapshot {
    pub id: u32,
    /// Short type names of the components held, sorted.
    pub components: Vec<String>,
}

/// Scheduler state at capture time.
#[derive(Serialize, Clone, Debug, Default)]
pub struct SchedulerSnapshot {
    pub system_count: usize,
    pub phases: Vec<PhaseSnapshot>,
}

#[derive(Serialize, Clone, Debug)]
pub struct PhaseSnapshot {
    pub phase: &'static str,
    /// Systems in run order.
    pub systems: Vec<String>,
    /// Timings from the most recent run of this phase.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timings: Vec<SystemTimingSnapshot>,
}

#[derive(Serialize, Clone, Debug)]
pub struct SystemTimingSnapshot {
    pub name: String,
    pub duration_us: f64,
}

/// Registry and scheduler together.
#[derive(Serialize, Clone, Debug, Default)]
pub struct DiagSnapshot {
    pub registry: RegistrySnapshot,
    pub scheduler: SchedulerSnapshot,
}

// ── Capture ──────────────────────────────────────────────────────────────

impl RegistrySnapshot {
    /// Counts only: entity total and per-kind bucket sizes.
    pub fn capture(registry: &Registry) -> Self {
        let mut kinds: Vec<KindSnapshot> = registry
            .indexed_kinds()
            .map(|(kind, entity_count)| KindSnapshot {
                name: kind.short_name().to_string(),
                entity_count,
            })
            .collect();
        // Largest first, then by name for stable output.
        kinds.sort_by(|a, b| {
            b.entity_count
                .cmp(&a.entity_count)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            entity_count: registry.len(),
            next_id: registry.next_id(),
            kinds,
            entities: None,
        }
    }

    /// Like [`capture`](Self::capture), plus the component list of every
    /// live entity in creation order.
    pub fn capture_detailed(registry: &Registry) -> Self {
        let mut snapshot = Self::capture(registry);
        let entities = registry
            .entities()
            .iter()
            .map(|&entity| {
                let mut components: Vec<String> = registry
                    .components(entity)
                    .map(|bag| bag.kinds().map(|k| k.short_name().to_string()).collect())
                    .unwrap_or_default();
                components.sort_unstable();
                EntitySnapshot {
                    id: entity.id(),
                    components,
                }
            })
            .collect();
        snapshot.entities = Some(entities);
        snapshot
    }
}

impl SchedulerSnapshot {
    pub fn capture(scheduler: &Scheduler) -> Self {
        let phases = Phase::ALL
            .into_iter()
            .map(|phase| PhaseSnapshot {
                phase: phase.name(),
                systems: scheduler
                    .system_names(phase)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                timings: scheduler
                    .timings(phase)
                    .iter()
                    .map(|t| SystemTimingSnapshot {
                        name: t.name.clone(),
                        duration_us: t.duration_us,
                    })
                    .collect(),
            })
            .collect();

        Self {
            system_count: scheduler.len(),
            phases,
        }
    }
}

impl DiagSnapshot {
    pub fn capture(registry: &Registry, scheduler: &Scheduler) -> Self {
        Self {
            registry: RegistrySnapshot::capture(registry),
            scheduler: SchedulerSnapshot::capture(scheduler),
        }
    }

    /// Serialize to a compact JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
