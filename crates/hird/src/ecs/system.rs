//! # System — Behavior Driven Through Four Phases
//!
//! A system is a unit of behavior that operates on a
//! [`Registry`](super::registry::Registry). Each system takes part in any
//! subset of four phases:
//!
//! | Phase      | Runs                                  |
//! |------------|---------------------------------------|
//! | `Setup`    | once, before the first tick           |
//! | `Tick`     | every update step                     |
//! | `Cleanup`  | every update step, after `Tick`       |
//! | `Teardown` | once, at shutdown                     |
//!
//! ## Capabilities, Resolved Once
//!
//! A system says which phases it wants through [`System::phases`]. The
//! [`Scheduler`] reads that set exactly once, in
//! [`register`](Scheduler::register), and files the system into one list per
//! phase. Running a phase is then a plain walk over that list; nothing is
//! type-checked or filtered per call.
//!
//! Three ways to write a system:
//!
//! - implement [`System`] on your own type (stateful systems),
//! - build an [`FnSystem`] from closures, one per phase,
//! - pass any `FnMut(&mut Registry)` closure, which becomes a tick system.
//!
//! ## Ordering
//!
//! Systems run in registration order within a phase. A system registered in
//! several phases keeps the same relative position in each list. The
//! scheduler does **not** sequence phases against each other: calling
//! `setup` once, then `tick`/`cleanup` pairs, then `teardown` is the host's
//! job.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::registry::Registry;

// ── Phase ────────────────────────────────────────────────────────────────

/// One of the four scheduler phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Tick,
    Cleanup,
    Teardown,
}

impl Phase {
    /// All phases, in life-cycle order.
    pub const ALL: [Phase; 4] = [Phase::Setup, Phase::Tick, Phase::Cleanup, Phase::Teardown];

    fn index(self) -> usize {
        match self {
            Phase::Setup => 0,
            Phase::Tick => 1,
            Phase::Cleanup => 2,
            Phase::Teardown => 3,
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Tick => "tick",
            Phase::Cleanup => "cleanup",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Phases ───────────────────────────────────────────────────────────────

/// A set of [`Phase`]s.
///
/// ```ignore
/// fn phases(&self) -> Phases {
///     Phases::SETUP | Phases::TICK
/// }
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Phases(u8);

impl Phases {
    pub const SETUP: Phases = Phases(1 << 0);
    pub const TICK: Phases = Phases(1 << 1);
    pub const CLEANUP: Phases = Phases(1 << 2);
    pub const TEARDOWN: Phases = Phases(1 << 3);

    pub const fn empty() -> Self {
        Phases(0)
    }

    pub const fn all() -> Self {
        Phases(0b1111)
    }

    pub fn contains(self, phase: Phase) -> bool {
        self.0 & phase.bit() != 0
    }

    pub fn insert(&mut self, phase: Phase) {
        self.0 |= phase.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Phases in this set, in life-cycle order.
    pub fn iter(self) -> impl Iterator<Item = Phase> {
        Phase::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<Phase> for Phases {
    fn from(phase: Phase) -> Self {
        Phases(phase.bit())
    }
}

impl BitOr for Phases {
    type Output = Phases;

    fn bitor(self, rhs: Phases) -> Phases {
        Phases(self.0 | rhs.0)
    }
}

impl BitOrAssign for Phases {
    fn bitor_assign(&mut self, rhs: Phases) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Phases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ── System ───────────────────────────────────────────────────────────────

/// A unit of behavior driven by a [`Scheduler`].
///
/// Declare the phases you take part in with [`phases`](System::phases) and
/// override the matching methods. Methods for undeclared phases are never
/// called.
///
/// # Example
///
/// ```ignore
/// struct Movement {
///     moved: usize,
/// }
///
/// impl System for Movement {
///     fn phases(&self) -> Phases {
///         Phases::TICK
///     }
///
///     fn tick(&mut self, registry: &mut Registry) {
///         for e in registry.entities_with::<Velocity>() {
///             // ...
///             self.moved += 1;
///         }
///     }
/// }
/// ```
pub trait System {
    /// The phases this system takes part in. Read once, at registration.
    fn phases(&self) -> Phases;

    fn setup(&mut self, _registry: &mut Registry) {}

    fn tick(&mut self, _registry: &mut Registry) {}

    fn cleanup(&mut self, _registry: &mut Registry) {}

    fn teardown(&mut self, _registry: &mut Registry) {}

    /// Short name for logs and diagnostics. Defaults to the type name without
    /// its module path.
    fn name(&self) -> String {
        short_system_name(std::any::type_name::<Self>())
    }
}

/// Blanket impl: any `FnMut(&mut Registry)` is a tick-only system.
impl<F: FnMut(&mut Registry)> System for F {
    fn phases(&self) -> Phases {
        Phases::TICK
    }

    fn tick(&mut self, registry: &mut Registry) {
        (self)(registry);
    }
}

fn run_phase(system: &mut dyn System, phase: Phase, registry: &mut Registry) {
    match phase {
        Phase::Setup => system.setup(registry),
        Phase::Tick => system.tick(registry),
        Phase::Cleanup => system.cleanup(registry),
        Phase::Teardown => system.teardown(registry),
    }
}

// ── FnSystem ─────────────────────────────────────────────────────────────

type Slot = Option<Box<dyn FnMut(&mut Registry)>>;

/// A system assembled from closures, one optional slot per phase. Its
/// [`phases`](System::phases) are exactly the slots that were filled.
///
/// # Example
///
/// ```ignore
/// scheduler.register(
///     FnSystem::new("spawner")
///         .on_setup(|reg| { reg.spawn().with(Health(10)); })
///         .on_teardown(|reg| reg.clear()),
/// );
/// ```
pub struct FnSystem {
    name: String,
    slots: [Slot; 4],
}

impl FnSystem {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slots: [None, None, None, None],
        }
    }

    pub fn on_setup(self, f: impl FnMut(&mut Registry) + 'static) -> Self {
        self.slot(Phase::Setup, f)
    }

    pub fn on_tick(self, f: impl FnMut(&mut Registry) + 'static) -> Self {
        self.slot(Phase::Tick, f)
    }

    pub fn on_cleanup(self, f: impl FnMut(&mut Registry) + 'static) -> Self {
        self.slot(Phase::Cleanup, f)
    }

    pub fn on_teardown(self, f: impl FnMut(&mut Registry) + 'static) -> Self {
        self.slot(Phase::Teardown, f)
    }

    fn slot(mut self, phase: Phase, f: impl FnMut(&mut Registry) + 'static) -> Self {
        self.slots[phase.index()] = Some(Box::new(f));
        self
    }

    fn call(&mut self, phase: Phase, registry: &mut Registry) {
        if let Some(f) = &mut self.slots[phase.index()] {
            f(registry);
        }
    }
}

impl System for FnSystem {
    fn phases(&self) -> Phases {
        let mut phases = Phases::empty();
        for phase in Phase::ALL {
            if self.slots[phase.index()].is_some() {
                phases.insert(phase);
            }
        }
        phases
    }

    fn setup(&mut self, registry: &mut Registry) {
        self.call(Phase::Setup, registry);
    }

    fn tick(&mut self, registry: &mut Registry) {
        self.call(Phase::Tick, registry);
    }

    fn cleanup(&mut self, registry: &mut Registry) {
        self.call(Phase::Cleanup, registry);
    }

    fn teardown(&mut self, registry: &mut Registry) {
        self.call(Phase::Teardown, registry);
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

// ── Scheduler ────────────────────────────────────────────────────────────

/// A registered system plus what was learned about it at registration.
struct RegisteredSystem {
    name: String,
    phases: Phases,
    system: Box<dyn System>,
}

/// Per-system timing recorded during the most recent run of a phase.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// Owns registered systems and drives them phase by phase.
///
/// ```ignore
/// let mut registry = Registry::new();
/// let mut scheduler = Scheduler::new();
/// scheduler.register(Movement::default()).register(Despawner);
///
/// scheduler.setup(&mut registry);
/// while running {
///     scheduler.tick(&mut registry);
///     scheduler.cleanup(&mut registry);
/// }
/// scheduler.teardown(&mut registry);
/// ```
pub struct Scheduler {
    /// Every registered system, in registration order.
    systems: Vec<RegisteredSystem>,
    /// Per phase: indices into `systems`, ascending.
    phase_lists: [Vec<usize>; 4],
    /// Per phase: timings from the most recent run.
    #[cfg(feature = "diagnostics")]
    timings: [Vec<SystemTiming>; 4],
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            phase_lists: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            #[cfg(feature = "diagnostics")]
            timings: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Register a system. It is appended to the master list and to the list
    /// of every phase it declares. Returns `self` for chaining.
    ///
    /// The scheduler takes ownership, so one instance can only ever be
    /// registered once. Two instances of the same type are two systems and
    /// both run.
    pub fn register<S: System + 'static>(&mut self, system: S) -> &mut Self {
        self.register_boxed(Box::new(system))
    }

    /// Construct `S::default()` and register it.
    pub fn register_default<S: System + Default + 'static>(&mut self) -> &mut Self {
        self.register(S::default())
    }

    /// Register an already-boxed system.
    pub fn register_boxed(&mut self, system: Box<dyn System>) -> &mut Self {
        let idx = self.systems.len();
        let phases = system.phases();
        let name = system.name();

        for phase in phases.iter() {
            self.phase_lists[phase.index()].push(idx);
        }
        if phases.is_empty() {
            log::warn!("system `{}` declares no phases and will never run", name);
        } else {
            log::debug!("registered system `{}` for {:?}", name, phases);
        }

        self.systems.push(RegisteredSystem {
            name,
            phases,
            system,
        });
        self
    }

    /// Run every Setup system, in registration order.
    pub fn setup(&mut self, registry: &mut Registry) {
        self.run(Phase::Setup, registry);
    }

    /// Run every Tick system, in registration order.
    pub fn tick(&mut self, registry: &mut Registry) {
        self.run(Phase::Tick, registry);
    }

    /// Run every Cleanup system, in registration order.
    pub fn cleanup(&mut self, registry: &mut Registry) {
        self.run(Phase::Cleanup, registry);
    }

    /// Run every Teardown system, in registration order.
    pub fn teardown(&mut self, registry: &mut Registry) {
        self.run(Phase::Teardown, registry);
    }

    /// Run every system registered for `phase`, in registration order. A
    /// phase with no systems is a no-op.
    pub fn run(&mut self, phase: Phase, registry: &mut Registry) {
        let list = &self.phase_lists[phase.index()];
        log::trace!("running {} {} systems", list.len(), phase);

        #[cfg(feature = "diagnostics")]
        {
            let timings = &mut self.timings[phase.index()];
            timings.clear();
            for &idx in list {
                let entry = &mut self.systems[idx];
                let start = std::time::Instant::now();
                run_phase(entry.system.as_mut(), phase, registry);
                let elapsed = start.elapsed();
                timings.push(SystemTiming {
                    name: entry.name.clone(),
                    duration_us: elapsed.as_secs_f64() * 1_000_000.0,
                });
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for &idx in list {
                run_phase(self.systems[idx].system.as_mut(), phase, registry);
            }
        }
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Number of systems registered for `phase`.
    pub fn phase_len(&self, phase: Phase) -> usize {
        self.phase_lists[phase.index()].len()
    }

    /// Names of the systems registered for `phase`, in run order.
    pub fn system_names(&self, phase: Phase) -> Vec<&str> {
        self.phase_lists[phase.index()]
            .iter()
            .map(|&idx| self.systems[idx].name.as_str())
            .collect()
    }

    /// Timings from the most recent run of `phase`.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self, phase: Phase) -> &[SystemTiming] {
        &self.timings[phase.index()]
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for entry in &self.systems {
            list.entry(&format_args!("{} {:?}", entry.name, entry.phases));
        }
        list.finish()
    }
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// last segment (e.g. `game::Movement` → `Movement`, `{{closure}}` →
/// `<closure>`).
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
