//! The injector: one context object owning every registry.
//!
//! All four registries (slot cache, singletons, targets, collections) live
//! behind one mutex, so propagation during `register`/`unregister` is atomic
//! with respect to `inject`/`eject`. Component hooks and scene scans always
//! run after the lock is released, and so does the `Drop` of anything the
//! registries let go of.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_registry::prelude::*;
//!
//! trait Scoreboard: Send + Sync {
//!     fn best(&self) -> u32;
//! }
//!
//! struct Arcade;
//! impl Scoreboard for Arcade {
//!     fn best(&self) -> u32 { 9001 }
//! }
//! impl Component for Arcade {}
//!
//! #[derive(Default, Consumer)]
//! struct Banner {
//!     #[inject]
//!     scores: Inject<dyn Scoreboard>,
//! }
//! impl Component for Banner {}
//!
//! let injector = Injector::new();
//! let banner = Arc::new(Banner::default());
//! injector.inject(&banner).unwrap();
//! assert!(!banner.scores.is_set());
//!
//! let arcade = Arc::new(Arcade);
//! let roles = Roles::of(&arcade).with::<dyn Scoreboard>(arcade.clone());
//! injector.register(&roles);
//! assert_eq!(banner.scores.get().map(|s| s.best()), Some(9001));
//!
//! injector.unregister(&roles);
//! assert!(!banner.scores.is_set());
//! ```

use crate::cache::SlotCache;
use crate::collection::{CollectionRegistry, LiveCollection};
use crate::component::{Component, Consumer};
use crate::config::{InjectorConfig, Mode};
use crate::error::InjectError;
use crate::key::{InstanceId, TypeKey};
use crate::retired::Retired;
use crate::roles::Roles;
use crate::singleton::{Published, SingletonRegistry, Withdrawal};
use crate::slot::{Access, SlotDescriptor};
use crate::target::TargetRegistry;
use crate::teardown::{Dispose, Teardown};
use core::any::TypeId;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

#[cfg(feature = "tooling")]
use crate::tooling::Scene;
#[cfg(feature = "tooling")]
use std::sync::Weak;

/// The four registries, guarded as one unit.
#[derive(Default)]
pub(crate) struct Registries {
    pub(crate) cache: SlotCache,
    pub(crate) singletons: SingletonRegistry,
    pub(crate) targets: TargetRegistry,
    pub(crate) collections: CollectionRegistry,
}

/// Runtime dependency registry shared by every component of one host.
///
/// Usually held in an `Arc` and attached to the host's [`Teardown`] signal
/// with [`attach`](Self::attach).
pub struct Injector {
    pub(crate) registries: Mutex<Registries>,
    config: RwLock<InjectorConfig>,
    #[cfg(feature = "tooling")]
    pub(crate) scene: RwLock<Option<Weak<dyn Scene>>>,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    /// Creates an empty injector in stepping mode.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InjectorConfig::default())
    }

    /// Creates an empty injector with the given configuration.
    #[must_use]
    pub fn with_config(config: InjectorConfig) -> Self {
        Self {
            registries: Mutex::new(Registries::default()),
            config: RwLock::new(config),
            #[cfg(feature = "tooling")]
            scene: RwLock::new(None),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> InjectorConfig {
        *self.config.read()
    }

    /// Replaces the configuration.
    pub fn set_config(&self, config: InjectorConfig) {
        *self.config.write() = config;
    }

    /// Returns the current execution mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.config.read().mode
    }

    /// Switches the execution mode.
    pub fn set_mode(&self, mode: Mode) {
        self.config.write().mode = mode;
        tracing::debug!(?mode, "injector mode changed");
    }

    /// Subscribes this injector to `teardown` and resets it.
    ///
    /// Returns false, without resetting, if it was already subscribed.
    pub fn attach(self: &Arc<Self>, teardown: &Teardown) -> bool {
        if !teardown.subscribe(self) {
            return false;
        }
        self.clear();
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Slot discovery
    // ─────────────────────────────────────────────────────────────────────

    /// Discovers and caches the slots of `C`, returning how many it declares.
    ///
    /// Hosts call this at startup to surface malformed declarations early;
    /// otherwise they are reported by the first [`inject`](Self::inject).
    pub fn prepare<C: Consumer>(&self) -> Result<usize, InjectError> {
        Ok(self.slots::<C>()?.len())
    }

    /// Returns the cached slot descriptors of `C`, discovering them first if
    /// needed.
    pub fn slots<C: Consumer>(&self) -> Result<Arc<[SlotDescriptor]>, InjectError> {
        self.registries.lock().cache.slots_for::<C>()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Singletons
    // ─────────────────────────────────────────────────────────────────────

    /// Publishes an instance under every key in `roles` and updates every
    /// slot waiting for one of those keys.
    ///
    /// The most recent registration of a key wins.
    pub fn register(&self, roles: &Roles) {
        let mut retired = Retired::default();
        let mut guard = self.registries.lock();
        let registries = &mut *guard;

        let mut updated = 0;
        for entry in roles.entries() {
            registries.singletons.publish(
                entry.key,
                Published {
                    instance: roles.instance(),
                    component: Arc::clone(roles.component()),
                    value: Arc::clone(&entry.value),
                },
                &mut retired,
            );
            let assigned = registries
                .targets
                .assign(entry.key, &*entry.value, &mut retired);
            tracing::trace!(key = %entry.key, slots = assigned, "propagated singleton");
            updated += assigned;
        }
        drop(guard);

        tracing::debug!(
            component = roles.component().component_name(),
            keys = roles.entries().len(),
            slots = updated,
            "registered singleton"
        );
    }

    /// Withdraws an instance from every key in `roles`.
    ///
    /// Where it was the resolved instance, waiting slots move to the
    /// previously registered instance of that key, or are cleared if none
    /// remains. Unknown instances are ignored.
    pub fn unregister(&self, roles: &Roles) {
        let mut retired = Retired::default();
        let mut guard = self.registries.lock();
        let registries = &mut *guard;

        let mut updated = 0;
        for entry in roles.entries() {
            match registries
                .singletons
                .withdraw(entry.key, roles.instance(), &mut retired)
            {
                Withdrawal::Unknown | Withdrawal::Shadowed => {}
                Withdrawal::Fallback(next) => {
                    let assigned = registries
                        .targets
                        .assign(entry.key, &*next.value, &mut retired);
                    tracing::trace!(
                        key = %entry.key,
                        next = next.component.component_name(),
                        slots = assigned,
                        "singleton fell back to earlier registration"
                    );
                    updated += assigned;
                }
                Withdrawal::Emptied => {
                    let cleared = registries.targets.clear_slots(entry.key, &mut retired);
                    tracing::trace!(key = %entry.key, slots = cleared, "cleared waiting slots");
                    updated += cleared;
                }
            }
        }
        drop(guard);

        tracing::debug!(
            component = roles.component().component_name(),
            slots = updated,
            "unregistered singleton"
        );
    }

    /// Returns the resolved singleton for role `R`.
    #[must_use]
    pub fn resolve<R: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<R>> {
        self.registries
            .lock()
            .singletons
            .resolve(TypeKey::of::<R>())
            .and_then(|published| published.value.downcast_ref::<Arc<R>>())
            .cloned()
    }

    /// Returns the resolved singleton of every key with its status line,
    /// ordered by key name.
    #[must_use]
    pub fn singletons(&self) -> Vec<SingletonStatus> {
        let resolved: Vec<(TypeKey, Arc<dyn Component>)> = self
            .registries
            .lock()
            .singletons
            .resolved()
            .map(|(key, published)| (key, Arc::clone(&published.component)))
            .collect();

        let mut statuses: Vec<SingletonStatus> = resolved
            .into_iter()
            .map(|(key, component)| SingletonStatus {
                key,
                component: component.component_name(),
                status: component.status(),
            })
            .collect();
        statuses.sort_by(|a, b| a.key.type_name().cmp(b.key.type_name()));
        statuses
    }

    // ─────────────────────────────────────────────────────────────────────
    // Consumers
    // ─────────────────────────────────────────────────────────────────────

    /// Binds every slot of `consumer`.
    ///
    /// Singleton slots are filled from the current registrations and kept up
    /// to date until [`eject`](Self::eject). Collection slots are bound to the
    /// shared list of their element type. Calling it again for the same
    /// instance changes nothing.
    pub fn inject<C: Consumer>(&self, consumer: &Arc<C>) -> Result<(), InjectError> {
        let erased: Arc<dyn Component> = consumer.clone();
        let mut retired = Retired::default();
        #[cfg(feature = "tooling")]
        let mut unresolved = Vec::new();

        {
            let mut guard = self.registries.lock();
            let registries = &mut *guard;
            let slots = registries.cache.slots_for::<C>()?;

            for slot in slots.iter() {
                registries.targets.ensure(slot, &erased);
                match slot.access() {
                    Access::Singleton(access) => {
                        if let Some(published) = registries.singletons.resolve(slot.key()) {
                            access.assign(erased.as_ref(), &*published.value, &mut retired);
                        } else {
                            #[cfg(feature = "tooling")]
                            unresolved.push(slot.clone());
                        }
                    }
                    Access::Collection { element, access } => {
                        let backing = registries.collections.resolve(*element);
                        access.bind(erased.as_ref(), &backing, &mut retired);
                    }
                }
            }

            tracing::debug!(
                consumer = core::any::type_name::<C>(),
                slots = slots.len(),
                "injected consumer"
            );
        }
        drop(retired);

        #[cfg(feature = "tooling")]
        if !unresolved.is_empty() && self.config().is_inspecting() {
            self.fallback_scan(erased.as_ref(), &unresolved);
        }

        Ok(())
    }

    /// Stops updating the slots of `consumer`.
    ///
    /// Slot values are left as they are. Consumers never injected are
    /// ignored.
    pub fn eject<C: Consumer>(&self, consumer: &Arc<C>) {
        let mut guard = self.registries.lock();
        let registries = &mut *guard;
        let Some(slots) = registries.cache.cached(TypeId::of::<C>()) else {
            return;
        };
        let removed = registries.targets.eject(&slots, InstanceId::of(consumer));
        tracing::debug!(
            consumer = core::any::type_name::<C>(),
            targets = removed,
            "ejected consumer"
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Collections
    // ─────────────────────────────────────────────────────────────────────

    /// Adds `item` to the shared collection of its concrete type.
    ///
    /// Returns false if it was already a member.
    pub fn add<T: Component>(&self, item: &Arc<T>) -> bool {
        self.add_roles(&Roles::declared(item))
    }

    /// Adds the instance described by `roles` to the shared collection of its
    /// concrete type, learning its roles as collection aliases.
    pub fn add_roles(&self, roles: &Roles) -> bool {
        let added = self.registries.lock().collections.add(roles);
        if added {
            tracing::debug!(
                element = roles.concrete().type_name(),
                "added collection item"
            );
        }
        added
    }

    /// Removes `item` from every shared collection it is a member of.
    ///
    /// Returns false if it was not a member.
    pub fn remove<T: Component>(&self, item: &Arc<T>) -> bool {
        self.remove_roles(&Roles::declared(item))
    }

    /// Removes the instance described by `roles` from the collection of its
    /// concrete type and from the lists kept for each of its roles.
    pub fn remove_roles(&self, roles: &Roles) -> bool {
        let mut retired = Retired::default();
        let removed = self
            .registries
            .lock()
            .collections
            .remove(roles, &mut retired);
        drop(retired);
        if removed {
            tracing::debug!(
                element = roles.concrete().type_name(),
                "removed collection item"
            );
        }
        removed
    }

    /// Returns the live collection a `Collect<T>` slot would bind to.
    #[must_use]
    pub fn collection<T: ?Sized + Send + Sync + 'static>(&self) -> LiveCollection<T> {
        let backing = self
            .registries
            .lock()
            .collections
            .resolve(TypeKey::of::<T>());
        LiveCollection::new(backing)
    }

    /// Declares that the collection of `T` can serve requests for role `R`,
    /// even before any `T` has been added.
    ///
    /// Declared aliases survive [`clear`](Self::clear).
    pub fn alias<R: ?Sized + 'static, T: Component>(&self) {
        self.registries
            .lock()
            .collections
            .declare_alias(TypeKey::of::<R>(), TypeKey::of::<T>());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reset & diagnostics
    // ─────────────────────────────────────────────────────────────────────

    /// Resets every registry.
    ///
    /// Waiting singleton slots and shared collections are emptied in place
    /// before being forgotten, so outstanding handles observe the reset.
    pub fn clear(&self) {
        let mut retired = Retired::default();
        let mut guard = self.registries.lock();
        let registries = &mut *guard;

        let cleared = registries.targets.clear_all_slots(&mut retired);
        registries.targets.clear();
        retired.push(core::mem::take(&mut registries.singletons));
        registries.collections.clear(&mut retired);
        registries.cache.clear();
        drop(guard);

        tracing::info!(slots = cleared, released = retired.len(), "injector cleared");
    }

    /// Returns the current size of every registry.
    #[must_use]
    pub fn stats(&self) -> InjectorStats {
        let registries = self.registries.lock();
        let (collections, collection_items) = registries.collections.counts();
        InjectorStats {
            consumer_types: registries.cache.len(),
            singletons: registries.singletons.len(),
            targets: registries.targets.len(),
            collections,
            collection_items,
        }
    }
}

impl Dispose for Injector {
    fn dispose(&self) {
        self.clear();
    }
}

impl core::fmt::Debug for Injector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Injector")
            .field("config", &self.config())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Sizes of the injector's registries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectorStats {
    /// Consumer types with cached slot descriptors.
    pub consumer_types: usize,
    /// Keys with a resolved singleton.
    pub singletons: usize,
    /// (slot, consumer) pairs across all keys.
    pub targets: usize,
    /// Shared collections.
    pub collections: usize,
    /// Members across all shared collections.
    pub collection_items: usize,
}

impl core::fmt::Display for InjectorStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} consumer types, {} singletons, {} targets, {} collections ({} items)",
            self.consumer_types,
            self.singletons,
            self.targets,
            self.collections,
            self.collection_items
        )
    }
}

/// The resolved singleton of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonStatus {
    /// The capability key.
    pub key: TypeKey,
    /// Name of the resolved component.
    pub component: &'static str,
    /// The component's [`status`](Component::status) line.
    pub status: String,
}
