//! # Component — Type-Erased Per-Entity Storage
//!
//! In an ECS, components are plain data: a `Position`, a `Velocity`, a
//! `Health`. The registry needs to store *any* component type without knowing
//! it at compile time. This module provides [`Components`], the bag of
//! components owned by one entity, and [`ComponentKind`], the runtime key a
//! component is stored under.
//!
//! ## Why `Box<dyn Any>`?
//!
//! An entity's set of component types changes at runtime, so there is no
//! single `T` to build a `Vec<T>` around. Each component is boxed and keyed by
//! its [`TypeId`]; reads go through `downcast_ref`/`downcast_mut`. This
//! trades cache locality for **zero unsafe code** and a storage layout that
//! is easy to audit.
//!
//! ## One Per Kind
//!
//! The map is keyed by kind, so an entity can never hold two components of
//! the same type. Inserting a second one replaces the first (last write
//! wins).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Runtime identity of a component type.
///
/// Two kinds are equal iff they were built from the same Rust type. The type
/// name is carried along for logs and diagnostics only.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentKind {
    /// The kind of component type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully-qualified type name, e.g. `my_game::Position`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name with the module path stripped, e.g. `Position`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKind {}

impl std::hash::Hash for ComponentKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.short_name())
    }
}

/// Strip the module path (and leave generic arguments alone), e.g.
/// `game::Health` → `Health`.
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// The component bag of a single entity: at most one component per
/// [`ComponentKind`].
///
/// While an entity is live, its `Components` is owned by the
/// [`Registry`](super::registry::Registry), and mutations go through the
/// registry so the kind index stays in sync. A bag handed back by
/// [`Registry::take_entity`](super::registry::Registry::take_entity) is
/// detached from any index and can be read or modified freely.
#[derive(Default)]
pub struct Components {
    map: HashMap<TypeId, Entry>,
}

struct Entry {
    kind: ComponentKind,
    value: Box<dyn Any>,
}

impl Components {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Store `component`, replacing any existing component of the same kind.
    /// Returns the stored component.
    pub fn insert<T: 'static>(&mut self, component: T) -> &mut T {
        self.insert_reporting(component).0
    }

    /// Like [`insert`](Self::insert), also reporting whether the kind was
    /// absent before (`true` = fresh add, `false` = replace).
    pub(crate) fn insert_reporting<T: 'static>(&mut self, component: T) -> (&mut T, bool) {
        let kind = ComponentKind::of::<T>();
        let fresh = self
            .map
            .insert(
                kind.type_id,
                Entry {
                    kind,
                    value: Box::new(component),
                },
            )
            .is_none();
        let stored = self
            .map
            .get_mut(&kind.type_id)
            .and_then(|entry| entry.value.downcast_mut::<T>())
            .unwrap_or_else(|| {
                panic!(
                    "Component type mismatch: `{}` not found right after insert",
                    kind.type_name
                )
            });
        (stored, fresh)
    }

    /// Get the component of type `T`, or `None` if absent.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).map(|entry| {
            entry.value.downcast_ref::<T>().unwrap_or_else(|| {
                panic!(
                    "Component type mismatch: expected `{}` in bag",
                    std::any::type_name::<T>()
                )
            })
        })
    }

    /// Get the component of type `T` mutably, or `None` if absent.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut(&TypeId::of::<T>()).map(|entry| {
            entry.value.downcast_mut::<T>().unwrap_or_else(|| {
                panic!(
                    "Component type mismatch: expected `{}` in bag",
                    std::any::type_name::<T>()
                )
            })
        })
    }

    /// Type-erased read, used by diagnostics.
    pub fn get_any(&self, kind: ComponentKind) -> Option<&dyn Any> {
        self.map.get(&kind.type_id).map(|entry| &*entry.value)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn contains_kind(&self, kind: ComponentKind) -> bool {
        self.map.contains_key(&kind.type_id)
    }

    /// Remove the component of type `T`. Returns whether one was present.
    pub fn remove<T: 'static>(&mut self) -> bool {
        self.map.remove(&TypeId::of::<T>()).is_some()
    }

    /// Remove the component of type `T` and hand it back.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        let entry = self.map.remove(&TypeId::of::<T>())?;
        let value = entry.value.downcast::<T>().unwrap_or_else(|_| {
            panic!(
                "Component type mismatch: expected `{}` in bag",
                std::any::type_name::<T>()
            )
        });
        Some(*value)
    }

    /// Kinds currently held, in no particular order.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.map.values().map(|entry| entry.kind)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.kinds().map(|k| k.short_name()).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    #[derive(Debug, PartialEq)]
    struct Health(u32);
    struct Marker;

    #[test]
    fn insert_and_get() {
        let mut bag = Components::new();
        bag.insert(Position { x: 1.0, y: 2.0 });
        bag.insert(Health(10));
        assert_eq!(bag.get::<Position>(), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(bag.get::<Health>(), Some(&Health(10)));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn insert_returns_stored_component() {
        let mut bag = Components::new();
        let hp = bag.insert(Health(5));
        hp.0 += 1;
        assert_eq!(bag.get::<Health>(), Some(&Health(6)));
    }

    #[test]
    fn insert_replaces_same_kind() {
        let mut bag = Components::new();
        let (_, fresh) = bag.insert_reporting(Health(1));
        assert!(fresh);
        let (_, fresh) = bag.insert_reporting(Health(2));
        assert!(!fresh);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get::<Health>(), Some(&Health(2)));
    }

    #[test]
    fn missing_kind_is_none() {
        let bag = Components::new();
        assert!(bag.get::<Health>().is_none());
        assert!(!bag.contains::<Health>());
    }

    #[test]
    fn remove_reports_presence() {
        let mut bag = Components::new();
        bag.insert(Marker);
        assert!(bag.remove::<Marker>());
        assert!(!bag.remove::<Marker>());
        assert!(bag.is_empty());
    }

    #[test]
    fn take_returns_value() {
        let mut bag = Components::new();
        bag.insert(Health(42));
        assert_eq!(bag.take::<Health>(), Some(Health(42)));
        assert_eq!(bag.take::<Health>(), None);
    }

    #[test]
    fn kinds_and_contains_kind() {
        let mut bag = Components::new();
        bag.insert(Marker);
        bag.insert(Health(1));
        let mut names: Vec<_> = bag.kinds().map(|k| k.short_name()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Health", "Marker"]);
        assert!(bag.contains_kind(ComponentKind::of::<Marker>()));
        assert!(!bag.contains_kind(ComponentKind::of::<Position>()));
    }

    #[test]
    fn get_any_downcasts() {
        let mut bag = Components::new();
        bag.insert(Health(3));
        let any = bag.get_any(ComponentKind::of::<Health>()).unwrap();
        assert_eq!(any.downcast_ref::<Health>(), Some(&Health(3)));
    }

    #[test]
    fn drop_called_on_remove() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut bag = Components::new();
        bag.insert(Tracked);
        bag.insert(Tracked); // replaces, drops the first
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1);
        bag.remove::<Tracked>();
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name("game::physics::Velocity"), "Velocity");
        assert_eq!(short_type_name("Health"), "Health");
        assert_eq!(
            short_type_name("core::option::Option<game::Health>"),
            "Option<game::Health>"
        );
        assert_eq!(ComponentKind::of::<Health>().short_name(), "Health");
    }
}
