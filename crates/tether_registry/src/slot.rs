//! Dependency slots and their descriptors.
//!
//! A consumer declares slots as fields:
//!
//! - [`Inject<R>`] holds the currently registered singleton for role `R`.
//! - [`Collect<T>`] holds a [`LiveCollection<T>`] shared with every other
//!   consumer of the same element type.
//!
//! [`Slots`] turns field accessors into type-erased [`SlotDescriptor`]s that
//! the injector caches per consumer type.

use crate::collection::{Backing, LiveCollection};
use crate::component::{Component, Consumer};
use crate::error::InjectError;
use crate::key::TypeKey;
use crate::retired::Retired;
use core::any::{Any, TypeId};
use core::marker::PhantomData;
use parking_lot::RwLock;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Inject
// ─────────────────────────────────────────────────────────────────────────────

/// A singleton dependency slot.
///
/// Empty until a component publishing role `R` is registered; cleared again
/// when that component is unregistered. Readers must tolerate an empty slot.
pub struct Inject<R: ?Sized + 'static> {
    value: RwLock<Option<Arc<R>>>,
}

impl<R: ?Sized + Send + Sync + 'static> Inject<R> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// Returns the bound instance, if any.
    #[must_use]
    pub fn get(&self) -> Option<Arc<R>> {
        self.value.read().clone()
    }

    /// Returns true if an instance is bound.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value.read().is_some()
    }

    /// Returns true if the slot currently holds exactly `instance`.
    #[must_use]
    pub fn holds(&self, instance: &Arc<R>) -> bool {
        self.value
            .read()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, instance))
    }

    /// Binds `instance`, returning the previous value.
    fn set(&self, instance: Arc<R>) -> Option<Arc<R>> {
        self.value.write().replace(instance)
    }

    /// Empties the slot, returning the previous value.
    fn clear(&self) -> Option<Arc<R>> {
        self.value.write().take()
    }
}

impl<R: ?Sized + Send + Sync + 'static> Default for Inject<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized + 'static> core::fmt::Debug for Inject<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Inject")
            .field("role", &core::any::type_name::<R>())
            .field("set", &self.value.read().is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collect
// ─────────────────────────────────────────────────────────────────────────────

/// A collection dependency slot.
///
/// Bound once by `inject`; afterwards it observes membership changes of the
/// shared list without re-injection.
pub struct Collect<T: ?Sized + 'static> {
    live: RwLock<Option<LiveCollection<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> Collect<T> {
    /// Creates an unbound slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: RwLock::new(None),
        }
    }

    /// Returns the bound collection handle, if any.
    #[must_use]
    pub fn get(&self) -> Option<LiveCollection<T>> {
        self.live.read().clone()
    }

    /// Returns true if the slot has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.live.read().is_some()
    }

    /// Returns a snapshot of the members, or an empty vector if unbound.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.live
            .read()
            .as_ref()
            .map(LiveCollection::to_vec)
            .unwrap_or_default()
    }

    /// Returns the number of members, or zero if unbound.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.read().as_ref().map_or(0, LiveCollection::len)
    }

    /// Returns true if unbound or bound to an empty collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binds the slot to `backing`. Returns false if already bound to it.
    fn bind(&self, backing: &Arc<Backing>, retired: &mut Retired) -> bool {
        let mut live = self.live.write();
        if live
            .as_ref()
            .is_some_and(|current| current.is_backed_by(backing))
        {
            return false;
        }
        if let Some(previous) = live.replace(LiveCollection::new(Arc::clone(backing))) {
            retired.push(previous);
        }
        true
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Collect<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> core::fmt::Debug for Collect<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collect")
            .field("element", &core::any::type_name::<T>())
            .field("bound", &self.live.read().is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Type-erased accessors
// ─────────────────────────────────────────────────────────────────────────────

/// Sets or clears one singleton slot on a type-erased consumer.
pub(crate) trait SingletonAccess: Send + Sync {
    /// `value` holds an `Arc<R>` for the slot's role `R`. The displaced
    /// value goes to `retired`.
    fn assign(
        &self,
        consumer: &dyn Component,
        value: &(dyn Any + Send + Sync),
        retired: &mut Retired,
    ) -> bool;
    fn clear(&self, consumer: &dyn Component, retired: &mut Retired) -> bool;
    fn is_set(&self, consumer: &dyn Component) -> bool;
}

/// Binds one collection slot on a type-erased consumer.
pub(crate) trait CollectionAccess: Send + Sync {
    fn bind(&self, consumer: &dyn Component, backing: &Arc<Backing>, retired: &mut Retired)
    -> bool;
}

struct SingletonField<C: 'static, R: ?Sized + 'static> {
    field: fn(&C) -> &Inject<R>,
}

impl<C: Consumer, R: ?Sized + Send + Sync + 'static> SingletonAccess for SingletonField<C, R> {
    fn assign(
        &self,
        consumer: &dyn Component,
        value: &(dyn Any + Send + Sync),
        retired: &mut Retired,
    ) -> bool {
        let (Some(consumer), Some(value)) =
            (consumer.downcast_ref::<C>(), value.downcast_ref::<Arc<R>>())
        else {
            return false;
        };
        if let Some(previous) = (self.field)(consumer).set(Arc::clone(value)) {
            retired.push(previous);
        }
        true
    }

    fn clear(&self, consumer: &dyn Component, retired: &mut Retired) -> bool {
        let Some(consumer) = consumer.downcast_ref::<C>() else {
            return false;
        };
        if let Some(previous) = (self.field)(consumer).clear() {
            retired.push(previous);
        }
        true
    }

    fn is_set(&self, consumer: &dyn Component) -> bool {
        consumer
            .downcast_ref::<C>()
            .is_some_and(|consumer| (self.field)(consumer).is_set())
    }
}

struct CollectionField<C: 'static, T: ?Sized + 'static> {
    field: fn(&C) -> &Collect<T>,
}

impl<C: Consumer, T: ?Sized + Send + Sync + 'static> CollectionAccess for CollectionField<C, T> {
    fn bind(
        &self,
        consumer: &dyn Component,
        backing: &Arc<Backing>,
        retired: &mut Retired,
    ) -> bool {
        consumer
            .downcast_ref::<C>()
            .is_some_and(|consumer| (self.field)(consumer).bind(backing, retired))
    }
}

/// How a slot is filled.
#[derive(Clone)]
pub(crate) enum Access {
    Singleton(Arc<dyn SingletonAccess>),
    Collection {
        element: TypeKey,
        access: Arc<dyn CollectionAccess>,
    },
}

/// Opaque accessor produced by [`SlotField::describe`].
#[derive(Clone)]
pub struct SlotAccess(pub(crate) Access);

// ─────────────────────────────────────────────────────────────────────────────
// SlotField
// ─────────────────────────────────────────────────────────────────────────────

/// Field types that can be declared as dependency slots.
///
/// Implemented by [`Inject`] and [`Collect`]; not meant to be implemented
/// outside this crate.
pub trait SlotField: Send + Sync + 'static {
    /// Returns the slot's declared type and its type-erased accessor.
    #[doc(hidden)]
    fn describe<C: Consumer>(field: fn(&C) -> &Self) -> (TypeKey, SlotAccess);
}

impl<R: ?Sized + Send + Sync + 'static> SlotField for Inject<R> {
    fn describe<C: Consumer>(field: fn(&C) -> &Self) -> (TypeKey, SlotAccess) {
        let access = Access::Singleton(Arc::new(SingletonField { field }));
        (TypeKey::of::<R>(), SlotAccess(access))
    }
}

impl<T: ?Sized + Send + Sync + 'static> SlotField for Collect<T> {
    fn describe<C: Consumer>(field: fn(&C) -> &Self) -> (TypeKey, SlotAccess) {
        let access = Access::Collection {
            element: TypeKey::of::<T>(),
            access: Arc::new(CollectionField { field }),
        };
        (TypeKey::of::<Self>(), SlotAccess(access))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SlotDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a slot: its owning consumer type and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    owner: TypeId,
    index: usize,
}

/// What a slot wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A singleton for the slot's role key.
    Singleton,
    /// A shared collection of the given element type.
    Collection {
        /// The requested element type.
        element: TypeKey,
    },
}

/// A cached, type-erased description of one consumer slot.
#[derive(Clone)]
pub struct SlotDescriptor {
    id: SlotId,
    name: &'static str,
    key: TypeKey,
    access: SlotAccess,
}

impl SlotDescriptor {
    /// Returns the slot's identity.
    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Returns the declared slot name (usually the field name).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the key of the slot's declared type.
    ///
    /// For singleton slots this is the role key; for collection slots it is
    /// the key of the `Collect<T>` field type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns what the slot wants.
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        match &self.access.0 {
            Access::Singleton(_) => SlotKind::Singleton,
            Access::Collection { element, .. } => SlotKind::Collection { element: *element },
        }
    }

    pub(crate) fn access(&self) -> &Access {
        &self.access.0
    }
}

impl core::fmt::Debug for SlotDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotDescriptor")
            .field("name", &self.name)
            .field("key", &self.key.type_name())
            .field("kind", &self.kind())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Slots builder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects the slot declarations of consumer type `C`.
///
/// Passed to [`Consumer::declare_slots`]. Declaration order is preserved and
/// becomes the slot order used for injection.
pub struct Slots<C> {
    entries: Vec<SlotDescriptor>,
    _marker: PhantomData<fn(&C)>,
}

impl<C: Consumer> Slots<C> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares a slot backed by the field returned from `field`.
    pub fn slot<F: SlotField>(&mut self, name: &'static str, field: fn(&C) -> &F) -> &mut Self {
        let (key, access) = F::describe(field);
        let id = SlotId {
            owner: TypeId::of::<C>(),
            index: self.entries.len(),
        };
        self.entries.push(SlotDescriptor {
            id,
            name,
            key,
            access,
        });
        self
    }

    /// Declares a singleton slot for role `R`.
    pub fn singleton<R: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        field: fn(&C) -> &Inject<R>,
    ) -> &mut Self {
        self.slot(name, field)
    }

    /// Declares a collection slot for element type `T`.
    pub fn collection<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        field: fn(&C) -> &Collect<T>,
    ) -> &mut Self {
        self.slot(name, field)
    }

    /// Returns the number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no slot has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates the declarations and freezes them.
    pub(crate) fn finish(self) -> Result<Arc<[SlotDescriptor]>, InjectError> {
        let consumer = core::any::type_name::<C>();
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(InjectError::EmptySlotName { consumer });
            }
            if self.entries[..index].iter().any(|e| e.name == entry.name) {
                return Err(InjectError::DuplicateSlot {
                    consumer,
                    slot: entry.name,
                });
            }
        }
        Ok(self.entries.into())
    }
}
