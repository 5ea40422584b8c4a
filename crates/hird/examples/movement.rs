//! A tiny host loop: bodies drift, lose fuel, and are removed when empty.
//!
//! Run with `RUST_LOG=hird=trace cargo run --example movement` to watch the
//! registry and scheduler at work.

use glam::Vec2;
use hird::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Position(Vec2);

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec2);

#[derive(Debug, Clone, Copy)]
struct Fuel(u32);

/// Spawns the initial bodies and reports what is left at shutdown.
#[derive(Default)]
struct Spawner;

impl System for Spawner {
    fn phases(&self) -> Phases {
        Phases::SETUP | Phases::TEARDOWN
    }

    fn setup(&mut self, registry: &mut Registry) {
        for i in 0..5u32 {
            let mut body = registry.spawn().with(Position(Vec2::new(i as f32, 0.0)));
            if i % 2 == 0 {
                body.attach(Velocity(Vec2::new(0.5, 1.0)));
                body.attach(Fuel(i + 1));
            }
        }
        log::info!("spawned {} bodies", registry.len());
    }

    fn teardown(&mut self, registry: &mut Registry) {
        for &e in registry.entities() {
            if let Some(Position(p)) = registry.get::<Position>(e) {
                log::info!("{} ended at ({:.1}, {:.1})", e, p.x, p.y);
            }
        }
        registry.clear();
    }
}

/// Moves every body that has a velocity and burns one unit of fuel.
#[derive(Default)]
struct Thrust;

impl System for Thrust {
    fn phases(&self) -> Phases {
        Phases::TICK
    }

    fn tick(&mut self, registry: &mut Registry) {
        for e in registry.entities_with::<Velocity>() {
            let Some(&Velocity(v)) = registry.get::<Velocity>(e) else {
                continue;
            };
            if let Some(Position(p)) = registry.get_mut::<Position>(e) {
                *p += v;
            }
            if let Some(Fuel(fuel)) = registry.get_mut::<Fuel>(e) {
                *fuel = fuel.saturating_sub(1);
            }
        }
    }
}

fn main() {
    env_logger::init();

    let mut registry = Registry::new();
    let mut scheduler = Scheduler::new();
    scheduler
        .register_default::<Spawner>()
        .register_default::<Thrust>()
        .register(FnSystem::new("out_of_fuel").on_cleanup(|reg| {
            for e in reg.entities_with::<Fuel>() {
                if reg.get::<Fuel>(e).is_some_and(|f| f.0 == 0) {
                    reg.detach::<Velocity>(e);
                    reg.detach::<Fuel>(e);
                    log::info!("{} ran out of fuel", e);
                }
            }
        }));

    scheduler.setup(&mut registry);
    for frame in 0..6 {
        scheduler.tick(&mut registry);
        scheduler.cleanup(&mut registry);
        log::info!(
            "frame {}: {} moving, {} total",
            frame,
            registry.count_with::<Velocity>(),
            registry.len()
        );
    }

    #[cfg(feature = "diagnostics")]
    {
        match hird::diag::DiagSnapshot::capture(&registry, &scheduler).to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("failed to serialize diagnostics: {}", e),
        }
    }

    scheduler.teardown(&mut registry);
}
