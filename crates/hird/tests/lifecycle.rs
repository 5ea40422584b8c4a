//! End-to-end scenarios: a host driving a registry through a scheduler.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use hird::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(Vec2);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(Vec2);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health {
    current: i32,
    max: i32,
}

/// Adds velocity to position for every entity holding both.
struct Movement {
    processed: Rc<Cell<usize>>,
}

impl System for Movement {
    fn phases(&self) -> Phases {
        Phases::TICK
    }

    fn tick(&mut self, registry: &mut Registry) {
        let movers = registry.entities_with_all(&[
            ComponentKind::of::<Position>(),
            ComponentKind::of::<Velocity>(),
        ]);
        for &e in &movers {
            let Some(&Velocity(v)) = registry.get::<Velocity>(e) else {
                continue;
            };
            if let Some(Position(p)) = registry.get_mut::<Position>(e) {
                *p += v;
            }
        }
        self.processed.set(movers.len());
    }
}

/// Regenerates one point of health per tick, up to max.
struct Regen;

impl System for Regen {
    fn phases(&self) -> Phases {
        Phases::TICK
    }

    fn tick(&mut self, registry: &mut Registry) {
        for e in registry.entities_with::<Health>() {
            if let Some(health) = registry.get_mut::<Health>(e) {
                health.current = (health.current + 1).min(health.max);
            }
        }
    }
}

/// Destroys every entity whose health dropped to zero.
struct Reaper {
    reaped: Rc<RefCell<Vec<Entity>>>,
}

impl System for Reaper {
    fn phases(&self) -> Phases {
        Phases::CLEANUP
    }

    fn cleanup(&mut self, registry: &mut Registry) {
        for e in registry.entities_with::<Health>() {
            let dead = registry.get::<Health>(e).is_some_and(|h| h.current <= 0);
            if dead && registry.destroy_entity(e) {
                self.reaped.borrow_mut().push(e);
            }
        }
    }
}

fn movement() -> (Movement, Rc<Cell<usize>>) {
    let processed = Rc::new(Cell::new(0));
    (
        Movement {
            processed: processed.clone(),
        },
        processed,
    )
}

#[test]
fn only_entity_with_both_components_moves() {
    let mut registry = Registry::new();
    let e1 = registry.create_entity();
    let e2 = registry.create_entity();
    let e3 = registry.create_entity();
    registry.attach(e1, Position(Vec2::new(0.0, 0.0)));
    registry.attach(e2, Position(Vec2::new(1.0, 1.0)));
    registry.attach(e2, Velocity(Vec2::new(2.0, 3.0)));
    registry.attach(e3, Velocity(Vec2::new(9.0, 9.0)));

    let (system, processed) = movement();
    let mut scheduler = Scheduler::new();
    scheduler.register(system);
    scheduler.tick(&mut registry);

    assert_eq!(processed.get(), 1);
    assert_eq!(registry.get::<Position>(e1), Some(&Position(Vec2::ZERO)));
    assert_eq!(registry.get::<Position>(e2), Some(&Position(Vec2::new(3.0, 4.0))));
    assert!(registry.get::<Position>(e3).is_none());
}

#[test]
fn destroy_middle_entity_keeps_survivors_intact() {
    let mut registry = Registry::new();
    let e1 = registry.spawn().with(Health { current: 1, max: 1 }).id();
    let e2 = registry.spawn().with(Health { current: 2, max: 2 }).id();
    let e3 = registry.spawn().with(Health { current: 3, max: 3 }).id();

    assert!(registry.destroy_entity(e2));

    assert_eq!(registry.entities().len(), 2);
    assert_eq!(registry.entities(), &[e1, e3]);
    assert_eq!(e1.id(), 1);
    assert_eq!(e3.id(), 3);
    assert_eq!(registry.get::<Health>(e1).map(|h| h.current), Some(1));
    assert_eq!(registry.get::<Health>(e3).map(|h| h.current), Some(3));
    assert_eq!(registry.entities_with::<Health>(), vec![e1, e3]);
}

#[test]
fn destroyed_entity_bag_outlives_registry_tracking() {
    let mut registry = Registry::new();
    let e = registry
        .spawn()
        .with(Position(Vec2::ONE))
        .with(Velocity(Vec2::X))
        .id();

    let bag = registry.take_entity(e).expect("entity was live");
    assert!(bag.contains::<Position>());
    assert_eq!(bag.get::<Velocity>(), Some(&Velocity(Vec2::X)));

    assert!(registry.entities_with::<Position>().is_empty());
    assert!(registry.entities_with::<Velocity>().is_empty());
    assert!(!registry.destroy_entity(e));
    assert!(registry.check_index());
}

#[test]
fn full_lifecycle_with_several_systems() {
    let mut registry = Registry::new();
    let setup_seen = Rc::new(Cell::new(0usize));
    let cleanup_calls = Rc::new(Cell::new(0usize));
    let teardown_calls = Rc::new(Cell::new(0usize));
    let (mover, processed) = movement();

    let player = registry
        .spawn()
        .with(Position(Vec2::new(0.0, 0.0)))
        .with(Velocity(Vec2::new(1.0, 0.0)))
        .with(Health { current: 100, max: 100 })
        .id();
    let enemy = registry
        .spawn()
        .with(Position(Vec2::new(10.0, 10.0)))
        .with(Velocity(Vec2::new(-1.0, 0.0)))
        .with(Health { current: 50, max: 50 })
        .id();
    let rock = registry.spawn().with(Position(Vec2::new(5.0, 5.0))).id();

    let mut scheduler = Scheduler::new();
    let seen = setup_seen.clone();
    let cleanups = cleanup_calls.clone();
    let teardowns = teardown_calls.clone();
    scheduler
        .register(FnSystem::new("init").on_setup(move |reg| seen.set(reg.len())))
        .register(mover)
        .register(
            FnSystem::new("counter")
                .on_cleanup(move |_| cleanups.set(cleanups.get() + 1))
                .on_teardown(move |_| teardowns.set(teardowns.get() + 1)),
        );

    scheduler.setup(&mut registry);
    scheduler.tick(&mut registry);
    scheduler.cleanup(&mut registry);

    assert_eq!(setup_seen.get(), 3);
    assert_eq!(processed.get(), 2);
    assert_eq!(registry.get::<Position>(player).map(|p| p.0.x), Some(1.0));
    assert_eq!(registry.get::<Position>(enemy).map(|p| p.0.x), Some(9.0));
    assert_eq!(registry.get::<Position>(rock).map(|p| p.0.x), Some(5.0));
    assert_eq!(cleanup_calls.get(), 1);
    assert_eq!(teardown_calls.get(), 0);

    scheduler.teardown(&mut registry);
    assert_eq!(teardown_calls.get(), 1);
}

#[test]
fn component_changes_take_effect_next_tick() {
    let mut registry = Registry::new();
    let e = registry.spawn().with(Position(Vec2::ZERO)).id();

    let (mover, processed) = movement();
    let mut scheduler = Scheduler::new();
    scheduler.register(mover);

    scheduler.tick(&mut registry);
    assert_eq!(processed.get(), 0);

    registry.attach(e, Velocity(Vec2::new(3.0, 4.0)));
    scheduler.tick(&mut registry);
    assert_eq!(processed.get(), 1);
    assert_eq!(registry.get::<Position>(e), Some(&Position(Vec2::new(3.0, 4.0))));

    assert!(registry.detach::<Velocity>(e));
    scheduler.tick(&mut registry);
    assert_eq!(processed.get(), 0);
}

#[test]
fn destroyed_entities_drop_out_of_processing() {
    let mut registry = Registry::new();
    let e1 = registry
        .spawn()
        .with(Position(Vec2::ZERO))
        .with(Velocity(Vec2::ONE))
        .id();
    registry
        .spawn()
        .with(Position(Vec2::splat(5.0)))
        .with(Velocity(Vec2::splat(2.0)));

    let (mover, processed) = movement();
    let mut scheduler = Scheduler::new();
    scheduler.register(mover);

    scheduler.tick(&mut registry);
    assert_eq!(processed.get(), 2);

    registry.destroy_entity(e1);
    scheduler.tick(&mut registry);
    assert_eq!(processed.get(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn cleanup_system_destroys_while_iterating_snapshot() {
    let mut registry = Registry::new();
    let alive = registry.spawn().with(Health { current: 5, max: 10 }).id();
    let doomed_a = registry.spawn().with(Health { current: 0, max: 10 }).id();
    let doomed_b = registry.spawn().with(Health { current: -3, max: 10 }).id();

    let reaped = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = Scheduler::new();
    scheduler.register(Regen).register(Reaper {
        reaped: reaped.clone(),
    });

    scheduler.tick(&mut registry);
    scheduler.cleanup(&mut registry);

    // doomed_a regenerated to 1 and survived; doomed_b is still at -2.
    assert_eq!(*reaped.borrow(), vec![doomed_b]);
    assert_eq!(registry.entities(), &[alive, doomed_a]);
    assert_eq!(registry.get::<Health>(alive).map(|h| h.current), Some(6));
    assert!(registry.check_index());
}

#[test]
fn registration_order_across_setup_and_tick() {
    let calls = Rc::new(RefCell::new(Vec::<String>::new()));
    let mut scheduler = Scheduler::new();
    for label in ["A", "B"] {
        let on_setup = calls.clone();
        let on_tick = calls.clone();
        scheduler.register(
            FnSystem::new(label)
                .on_setup(move |_| on_setup.borrow_mut().push(format!("{}.Setup", label)))
                .on_tick(move |_| on_tick.borrow_mut().push(format!("{}.Tick", label))),
        );
    }

    let mut registry = Registry::new();
    scheduler.setup(&mut registry);
    scheduler.tick(&mut registry);
    assert_eq!(*calls.borrow(), vec!["A.Setup", "B.Setup", "A.Tick", "B.Tick"]);
}

#[test]
fn index_stays_consistent_through_a_session() {
    let mut registry = Registry::new();
    let mut scheduler = Scheduler::new();
    scheduler
        .register(FnSystem::new("spawn").on_setup(|reg| {
            for i in 0..10 {
                let e = reg.spawn().with(Position(Vec2::splat(i as f32))).id();
                if i % 2 == 0 {
                    reg.attach(e, Velocity(Vec2::X));
                }
            }
        }))
        .register(|reg: &mut Registry| {
            // Freeze every mover that passed x = 5.
            for e in reg.entities_with::<Velocity>() {
                if reg.get::<Position>(e).is_some_and(|p| p.0.x > 5.0) {
                    reg.detach::<Velocity>(e);
                }
            }
        })
        .register(FnSystem::new("trim").on_cleanup(|reg| {
            if let Some(&first) = reg.entities().first() {
                reg.destroy_entity(first);
            }
        }));

    scheduler.setup(&mut registry);
    for _ in 0..4 {
        scheduler.tick(&mut registry);
        scheduler.cleanup(&mut registry);
        assert!(registry.check_index());
        for &e in registry.entities() {
            assert_eq!(
                registry.has::<Velocity>(e),
                registry.entities_with::<Velocity>().contains(&e)
            );
        }
    }
    assert_eq!(registry.len(), 6);
    assert_eq!(registry.next_id(), 11);
}
