//! Shared collections of live instances.
//!
//! Every element type has at most one backing list. The list is created on
//! first use and then only mutated, never replaced, so every
//! [`LiveCollection`] handle observes membership changes immediately.
//!
//! A request for a role type (a trait object such as `dyn Enemy`) can reuse
//! the list of a concrete type that publishes that role. The registry learns
//! these aliases from the roles of added items and from
//! [`Injector::alias`](crate::injector::Injector::alias). When several
//! concrete lists qualify, the most recently created one wins.

use crate::key::{InstanceId, TypeKey};
use crate::retired::Retired;
use crate::roles::Roles;
use core::marker::PhantomData;
use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Backing
// ─────────────────────────────────────────────────────────────────────────────

/// The shared, order-preserving list behind one element type.
pub(crate) struct Backing {
    key: TypeKey,
    /// Creation order, used to break ties between alias candidates.
    seq: u64,
    members: RwLock<IndexMap<InstanceId, Roles>>,
}

impl Backing {
    fn new(key: TypeKey, seq: u64) -> Self {
        Self {
            key,
            seq,
            members: RwLock::new(IndexMap::new()),
        }
    }

    pub(crate) fn key(&self) -> TypeKey {
        self.key
    }

    /// Appends `roles` unless its instance is already a member.
    fn insert(&self, roles: &Roles) -> bool {
        let mut members = self.members.write();
        if members.contains_key(&roles.instance()) {
            return false;
        }
        members.insert(roles.instance(), roles.clone());
        true
    }

    /// Removes `instance`, keeping the order of the remaining members.
    fn remove(&self, instance: InstanceId) -> Option<Roles> {
        self.members.write().shift_remove(&instance)
    }

    /// Empties the list in place, returning the former members.
    fn take_members(&self) -> IndexMap<InstanceId, Roles> {
        core::mem::take(&mut *self.members.write())
    }

    fn len(&self) -> usize {
        self.members.read().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LiveCollection
// ─────────────────────────────────────────────────────────────────────────────

/// A live, shared view of every active instance of `T`.
///
/// Cloning the handle is cheap; all clones (and every consumer slot bound to
/// the same element type) share one backing list.
///
/// Reads take a snapshot: the returned vectors do not change afterwards, but
/// the next read reflects any `add`/`remove` in between.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tether_registry::prelude::*;
///
/// struct Waypoint(u32);
/// impl Component for Waypoint {}
///
/// let injector = Injector::new();
/// let waypoints = injector.collection::<Waypoint>();
///
/// let first = Arc::new(Waypoint(1));
/// injector.add(&first);
///
/// assert_eq!(waypoints.len(), 1);
/// assert_eq!(waypoints.to_vec()[0].0, 1);
/// ```
pub struct LiveCollection<T: ?Sized + 'static> {
    backing: Arc<Backing>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + 'static> Clone for LiveCollection<T> {
    fn clone(&self) -> Self {
        Self {
            backing: Arc::clone(&self.backing),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> LiveCollection<T> {
    pub(crate) fn new(backing: Arc<Backing>) -> Self {
        Self {
            backing,
            _marker: PhantomData,
        }
    }

    pub(crate) fn is_backed_by(&self, backing: &Arc<Backing>) -> bool {
        Arc::ptr_eq(&self.backing, backing)
    }

    /// Returns a snapshot of the current members viewed as `T`, in insertion
    /// order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.backing
            .members
            .read()
            .values()
            .filter_map(Roles::project::<T>)
            .collect()
    }

    /// Returns the member at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.backing
            .members
            .read()
            .values()
            .filter_map(Roles::project::<T>)
            .nth(index)
    }

    /// Returns the oldest member, if any.
    #[must_use]
    pub fn first(&self) -> Option<Arc<T>> {
        self.get(0)
    }

    /// Returns true if `item` is currently a member viewable as `T`.
    #[must_use]
    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.backing
            .members
            .read()
            .get(&InstanceId::of(item))
            .is_some_and(|roles| roles.contains(TypeKey::of::<T>()))
    }

    /// Returns the number of members viewable as `T`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backing
            .members
            .read()
            .values()
            .filter(|roles| roles.contains(TypeKey::of::<T>()))
            .count()
    }

    /// Returns true if no member is viewable as `T`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element type of the backing list.
    ///
    /// Differs from `T` when a role request was served by a concrete list.
    #[must_use]
    pub fn element_key(&self) -> TypeKey {
        self.backing.key
    }

    /// Returns true if both handles share one backing list.
    #[must_use]
    pub fn shares_backing<U: ?Sized + 'static>(&self, other: &LiveCollection<U>) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }
}

impl<T: ?Sized + 'static> core::fmt::Debug for LiveCollection<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LiveCollection")
            .field("element", &self.backing.key.type_name())
            .field("members", &self.backing.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CollectionRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Element type → shared backing list, plus the role alias table.
#[derive(Default)]
pub(crate) struct CollectionRegistry {
    backings: HashMap<TypeKey, Arc<Backing>>,
    /// Role → concrete element types, learned from added items.
    learned: HashMap<TypeKey, IndexSet<TypeKey>>,
    /// Role → concrete element types, declared by the host. Survives `clear`.
    declared: HashMap<TypeKey, IndexSet<TypeKey>>,
    next_seq: u64,
}

impl CollectionRegistry {
    fn create(&mut self, key: TypeKey) -> Arc<Backing> {
        let backing = Arc::new(Backing::new(key, self.next_seq));
        self.next_seq += 1;
        self.backings.insert(key, Arc::clone(&backing));
        tracing::trace!(element = key.type_name(), "created shared collection");
        backing
    }

    /// Returns the backing list for exactly `key`, creating it if needed.
    pub(crate) fn get_or_create(&mut self, key: TypeKey) -> Arc<Backing> {
        match self.backings.get(&key) {
            Some(backing) => Arc::clone(backing),
            None => self.create(key),
        }
    }

    /// Resolves the list a request for `key` binds to: exact match, then the
    /// most recently created aliased list, then the list of the most recently
    /// declared alias target, then a fresh list keyed by `key`.
    pub(crate) fn resolve(&mut self, key: TypeKey) -> Arc<Backing> {
        if let Some(backing) = self.backings.get(&key) {
            return Arc::clone(backing);
        }

        let aliased = self
            .learned
            .get(&key)
            .into_iter()
            .chain(self.declared.get(&key))
            .flatten()
            .filter_map(|concrete| self.backings.get(concrete))
            .max_by_key(|backing| backing.seq)
            .cloned();

        match aliased {
            Some(backing) => {
                tracing::trace!(
                    role = key.type_name(),
                    element = backing.key.type_name(),
                    "role collection served by concrete list"
                );
                backing
            }
            None => match self.declared.get(&key).and_then(|set| set.last()) {
                Some(&concrete) => self.get_or_create(concrete),
                None => self.create(key),
            },
        }
    }

    /// Declares that the list of `concrete` may serve requests for `role`.
    pub(crate) fn declare_alias(&mut self, role: TypeKey, concrete: TypeKey) {
        self.declared.entry(role).or_default().insert(concrete);
    }

    /// Adds `roles` to the list of its concrete type. Returns false if it was
    /// already a member.
    pub(crate) fn add(&mut self, roles: &Roles) -> bool {
        let concrete = roles.concrete();
        for key in roles.keys().filter(|key| *key != concrete) {
            self.learned.entry(key).or_default().insert(concrete);
        }
        self.get_or_create(concrete).insert(roles)
    }

    /// Removes the instance described by `roles` from every list keyed by
    /// one of its roles. Returns false if it was not a member of any.
    ///
    /// Removed members go to `retired`.
    pub(crate) fn remove(&mut self, roles: &Roles, retired: &mut Retired) -> bool {
        let mut removed = false;
        for key in roles.keys() {
            if let Some(member) = self
                .backings
                .get(&key)
                .and_then(|backing| backing.remove(roles.instance()))
            {
                retired.push(member);
                removed = true;
            }
        }
        removed
    }

    /// Empties every list in place and forgets it. Former members go to
    /// `retired`.
    pub(crate) fn clear(&mut self, retired: &mut Retired) {
        for backing in self.backings.values() {
            retired.push(backing.take_members());
        }
        self.backings.clear();
        self.learned.clear();
    }

    /// Returns the number of lists and the total number of members.
    pub(crate) fn counts(&self) -> (usize, usize) {
        let items = self.backings.values().map(|backing| backing.len()).sum();
        (self.backings.len(), items)
    }

    /// Replaces the members of every tracked list with the items of `items`
    /// that publish the list's key, preserving their order. Former members go
    /// to `retired`.
    #[cfg(feature = "tooling")]
    pub(crate) fn rebuild(&mut self, items: &[Roles], retired: &mut Retired) -> usize {
        let mut restored = 0;
        for backing in self.backings.values() {
            retired.push(backing.take_members());
            for roles in items.iter().filter(|roles| roles.contains(backing.key)) {
                if backing.insert(roles) {
                    restored += 1;
                }
            }
        }
        restored
    }
}
