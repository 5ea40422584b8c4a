//! # Registry — The Central Container
//!
//! The [`Registry`] owns every live entity, each entity's component bag, and a
//! derived index answering "which entities carry component kind K?".
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Registry                                             │
//! │                                                      │
//! │  EntityAllocator: sequential ids, never reused       │
//! │                                                      │
//! │  entities: Vec<Entity>                               │
//! │    live entities in creation order                   │
//! │                                                      │
//! │  components: HashMap<Entity, Components>             │
//! │    the source of truth: one bag per live entity      │
//! │                                                      │
//! │  index: HashMap<ComponentKind, HashSet<Entity>>      │
//! │    cache: kind → entities currently holding it       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Keeping the Index Honest
//!
//! For every live entity `e` and every kind `k`:
//!
//! ```text
//! e ∈ index[k]   ⟺   components[e] holds a k
//! ```
//!
//! All component mutation goes through the registry ([`Registry::attach`],
//! [`Registry::detach`], [`EntityMut`], ...), and each of those updates the
//! index inline. Entities never call back into the registry, so there is no
//! ownership cycle and no observer list to keep subscribed.
//!
//! - attach `k` to `e`: `index[k]` is created on first sight, `e` inserted.
//! - detach `k` from `e`: `e` removed from `index[k]`; empty buckets dropped.
//! - destroy `e`: `e` removed from the bucket of every kind it held.
//!
//! ## Snapshots vs Views
//!
//! [`Registry::entities`] hands out a borrowed slice. While you hold it, the
//! borrow checker won't let you create or destroy entities, so the view can't
//! be invalidated under you. [`Registry::entities_with`] returns an owned
//! `Vec`, so a system can freely mutate or destroy the entities it is walking.

use std::collections::{HashMap, HashSet};

use super::component::{ComponentKind, Components};
use super::entity::{Entity, EntityAllocator};

/// Owns live entities, their components, and the kind → entities index.
pub struct Registry {
    allocator: EntityAllocator,
    /// Live entities, in creation order. Ids only grow, so this is also
    /// sorted by id.
    entities: Vec<Entity>,
    /// Component bag of each live entity.
    components: HashMap<Entity, Components>,
    /// Kind → set of live entities holding that kind. Never holds empty sets.
    index: HashMap<ComponentKind, HashSet<Entity>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: Vec::new(),
            components: HashMap::new(),
            index: HashMap::new(),
        }
    }

    // ── Entity Management ────────────────────────────────────────────

    /// Create an entity with no components. The first entity of a registry
    /// has id `1`; every later one gets a strictly greater id.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.push(entity);
        self.components.insert(entity, Components::new());
        log::trace!("created entity {}", entity);
        entity
    }

    /// Create an entity and return an [`EntityMut`] for attaching components.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let player = registry
    ///     .spawn()
    ///     .with(Position::default())
    ///     .with(Health(100))
    ///     .id();
    /// ```
    pub fn spawn(&mut self) -> EntityMut<'_> {
        let entity = self.create_entity();
        EntityMut {
            registry: self,
            entity,
        }
    }

    /// Remove an entity from the registry and drop its components.
    ///
    /// Returns `true` if the entity was live here and has been removed,
    /// `false` (with no other effect) if this registry never created it or it
    /// was already destroyed.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.take_entity(entity).is_some()
    }

    /// Remove an entity from the registry, handing back its component bag.
    ///
    /// The entity is gone from [`entities`](Self::entities) and from every
    /// [`entities_with`](Self::entities_with) bucket, but the returned
    /// [`Components`] still holds everything it had. Returns `None` if the
    /// entity isn't live in this registry.
    pub fn take_entity(&mut self, entity: Entity) -> Option<Components> {
        let Some(bag) = self.components.remove(&entity) else {
            log::debug!("take_entity: {} is not live in this registry", entity);
            return None;
        };

        // `entities` is sorted by id, see the field docs.
        if let Ok(pos) = self.entities.binary_search(&entity) {
            self.entities.remove(pos);
        }
        for kind in bag.kinds() {
            self.unindex(kind, entity);
        }

        log::trace!("destroyed entity {} ({} components)", entity, bag.len());
        Some(bag)
    }

    /// Destroy every live entity. Ids are still never reused afterwards.
    pub fn clear(&mut self) {
        log::debug!("clearing {} entities", self.entities.len());
        self.entities.clear();
        self.components.clear();
        self.index.clear();
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Check whether `entity` is live in this registry.
    pub fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(&entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The id the next [`create_entity`](Self::create_entity) call returns.
    pub fn next_id(&self) -> u32 {
        self.allocator.peek_next()
    }

    /// Check whether `entity` was ever created by this registry, live or not.
    pub fn was_created(&self, entity: Entity) -> bool {
        self.allocator.was_allocated(entity)
    }

    /// Read-only access to a live entity's component bag.
    pub fn components(&self, entity: Entity) -> Option<&Components> {
        self.components.get(&entity)
    }

    /// Get an [`EntityMut`] for a live entity.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        if !self.contains(entity) {
            return None;
        }
        Some(EntityMut {
            registry: self,
            entity,
        })
    }

    // ── Index Queries ────────────────────────────────────────────────

    /// Snapshot of all entities holding a component of type `T`, in creation
    /// order. Later changes to the registry don't affect the returned `Vec`.
    pub fn entities_with<T: 'static>(&self) -> Vec<Entity> {
        self.entities_with_kind(ComponentKind::of::<T>())
    }

    /// Like [`entities_with`](Self::entities_with), keyed by a runtime kind.
    pub fn entities_with_kind(&self, kind: ComponentKind) -> Vec<Entity> {
        let mut result: Vec<Entity> = self
            .index
            .get(&kind)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default();
        result.sort_unstable();
        result
    }

    /// Snapshot of all entities holding *every* kind in `kinds`, in creation
    /// order.
    ///
    /// Walks the smallest bucket and probes the others. An empty `kinds`
    /// slice matches every live entity.
    pub fn entities_with_all(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        if kinds.is_empty() {
            return self.entities.clone();
        }

        let mut buckets = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match self.index.get(kind) {
                Some(bucket) => buckets.push(bucket),
                None => return Vec::new(),
            }
        }
        buckets.sort_by_key(|bucket| bucket.len());

        let Some((smallest, rest)) = buckets.split_first() else {
            return Vec::new();
        };
        let mut result: Vec<Entity> = smallest
            .iter()
            .copied()
            .filter(|e| rest.iter().all(|bucket| bucket.contains(e)))
            .collect();
        result.sort_unstable();
        result
    }

    /// Number of entities currently holding kind `T`.
    pub fn count_with<T: 'static>(&self) -> usize {
        self.index
            .get(&ComponentKind::of::<T>())
            .map_or(0, HashSet::len)
    }

    /// Kinds with at least one holder, paired with their holder count.
    pub fn indexed_kinds(&self) -> impl Iterator<Item = (ComponentKind, usize)> + '_ {
        self.index.iter().map(|(kind, bucket)| (*kind, bucket.len()))
    }

    /// Number of kinds currently held by at least one live entity.
    pub fn kind_count(&self) -> usize {
        self.index.len()
    }

    /// Recompute the index from the component bags and compare. Returns
    /// `true` if they agree. Linear in total component count; meant for tests
    /// and debugging.
    pub fn check_index(&self) -> bool {
        let mut expected: HashMap<ComponentKind, HashSet<Entity>> = HashMap::new();
        for (&entity, bag) in &self.components {
            for kind in bag.kinds() {
                expected.entry(kind).or_default().insert(entity);
            }
        }
        expected == self.index
    }

    // ── Per-Entity Component Access ──────────────────────────────────

    /// Attach a component to a live entity, replacing any component of the
    /// same type. Returns the stored component.
    ///
    /// Returns `None` (and stores nothing) if the entity isn't live here.
    pub fn attach<T: 'static>(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        let Some(bag) = self.components.get_mut(&entity) else {
            log::debug!(
                "attach `{}`: {} is not live in this registry",
                std::any::type_name::<T>(),
                entity
            );
            return None;
        };
        let (stored, fresh) = bag.insert_reporting(component);
        if fresh {
            self.index
                .entry(ComponentKind::of::<T>())
                .or_default()
                .insert(entity);
        }
        Some(stored)
    }

    /// Attach `T::default()` to a live entity.
    pub fn attach_default<T: Default + 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.attach(entity, T::default())
    }

    /// Get a shared reference to a component on a live entity.
    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.components.get(&entity)?.get::<T>()
    }

    /// Get a mutable reference to a component on a live entity.
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(&entity)?.get_mut::<T>()
    }

    /// Check whether a live entity holds a component of type `T`.
    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.components
            .get(&entity)
            .is_some_and(|bag| bag.contains::<T>())
    }

    /// Detach the component of type `T` from a live entity.
    ///
    /// Returns `true` if it was present and has been removed.
    pub fn detach<T: 'static>(&mut self, entity: Entity) -> bool {
        let removed = self
            .components
            .get_mut(&entity)
            .is_some_and(|bag| bag.remove::<T>());
        if removed {
            self.unindex(ComponentKind::of::<T>(), entity);
        }
        removed
    }

    /// Detach the component of type `T` from a live entity and return it.
    pub fn take<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        let value = self.components.get_mut(&entity)?.take::<T>()?;
        self.unindex(ComponentKind::of::<T>(), entity);
        Some(value)
    }

    fn unindex(&mut self, kind: ComponentKind, entity: Entity) {
        if let Some(bucket) = self.index.get_mut(&kind) {
            bucket.remove(&entity);
            if bucket.is_empty() {
                self.index.remove(&kind);
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ── EntityMut ────────────────────────────────────────────────────────────

/// Mutable handle to one live entity.
///
/// Returned by [`Registry::spawn`] and [`Registry::entity_mut`]. Everything
/// goes through the registry, so the kind index stays in sync.
///
/// # Example
///
/// ```ignore
/// let e = registry.spawn().with(Position::default()).id();
/// if let Some(mut entity) = registry.entity_mut(e) {
///     entity.attach(Velocity::new(1.0, 0.0));
///     entity.detach::<Frozen>();
/// }
/// ```
pub struct EntityMut<'r> {
    registry: &'r mut Registry,
    entity: Entity,
}

impl<'r> EntityMut<'r> {
    /// The entity this handle points at.
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Attach a component (builder style).
    pub fn with<T: 'static>(mut self, component: T) -> Self {
        self.attach(component);
        self
    }

    /// Attach a component, replacing any of the same type. Returns the
    /// stored component.
    pub fn attach<T: 'static>(&mut self, component: T) -> &mut T {
        let entity = self.entity;
        self.registry
            .attach(entity, component)
            .unwrap_or_else(|| panic!("EntityMut points at {} which is not live", entity))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.registry.get::<T>(self.entity)
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.registry.get_mut::<T>(self.entity)
    }

    pub fn has<T: 'static>(&self) -> bool {
        self.registry.has::<T>(self.entity)
    }

    /// Detach the component of type `T`. Returns whether one was present.
    pub fn detach<T: 'static>(&mut self) -> bool {
        self.registry.detach::<T>(self.entity)
    }

    pub fn take<T: 'static>(&mut self) -> Option<T> {
        self.registry.take::<T>(self.entity)
    }

    /// Read-only access to the whole bag.
    pub fn components(&self) -> &Components {
        self.registry
            .components(self.entity)
            .unwrap_or_else(|| panic!("EntityMut points at {} which is not live", self.entity))
    }
}
