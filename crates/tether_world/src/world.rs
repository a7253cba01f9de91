//! The host world: plugins, settings, and the component lifecycle engine.
//!
//! The [`World`] decides when components become active or inactive and
//! drives the [`Injector`] accordingly:
//!
//! | Step | Activation | Deactivation |
//! |------|------------|--------------|
//! | 1 | `register` (singletons) | `on_disable` hook |
//! | 2 | `add` (collection items) | `remove` (collection items) |
//! | 3 | `on_enable` hook | `unregister` (singletons) |
//!
//! # Lifecycle
//!
//! 1. **Configuration** - `add_plugins()`, `insert_setting()`
//! 2. **Finish** - plugins are sorted, built, and readied
//! 3. **Live** - `activate()`, `deactivate()`, `replace()`
//! 4. **Unload** - live components are deactivated in reverse order, plugins
//!    are cleaned up in reverse order, and the teardown signal fires
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_registry::prelude::*;
//! use tether_world::world::World;
//!
//! trait Score: Send + Sync {
//!     fn points(&self) -> u32;
//! }
//!
//! struct ScoreKeeper;
//! impl Score for ScoreKeeper {
//!     fn points(&self) -> u32 { 12 }
//! }
//! impl Component for ScoreKeeper {
//!     fn is_singleton(&self) -> bool { true }
//!     fn roles(self: Arc<Self>, roles: Roles) -> Roles {
//!         roles.with::<dyn Score>(self)
//!     }
//! }
//!
//! #[derive(Default, Consumer)]
//! struct ScoreLabel {
//!     #[inject]
//!     score: Inject<dyn Score>,
//! }
//! impl Component for ScoreLabel {
//!     fn on_enable(self: Arc<Self>, injector: &Injector) -> Result<(), InjectError> {
//!         injector.inject(&self)
//!     }
//!     fn on_disable(self: Arc<Self>, injector: &Injector) {
//!         injector.eject(&self);
//!     }
//! }
//!
//! let mut world = World::new();
//! world.finish();
//!
//! let label = Arc::new(ScoreLabel::default());
//! world.activate(&label).unwrap();
//! world.activate(&Arc::new(ScoreKeeper)).unwrap();
//! assert_eq!(label.score.get().map(|s| s.points()), Some(12));
//!
//! world.unload();
//! assert_eq!(world.live_count(), 0);
//! ```

use crate::plugin::{Plugin, PluginId, Plugins};
use core::any::{Any, TypeId};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tether_registry::{Component, InjectError, Injector, InjectorConfig, InstanceId, Roles, Teardown};

#[cfg(feature = "tooling")]
use std::sync::Weak;
#[cfg(feature = "tooling")]
use tether_registry::Scene;

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Marker trait for typed configuration values stored on the world.
///
/// Plugins insert settings during `build()` and read them during `ready()`.
pub trait Setting: Send + Sync + 'static {}

impl Setting for InjectorConfig {}

/// Type-erased setting for dynamic storage.
type BoxedSetting = Box<dyn Any + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Live set
// ─────────────────────────────────────────────────────────────────────────────

/// One active component and the registry operations its activation ran.
#[derive(Clone)]
struct LiveEntry {
    roles: Roles,
    registered: bool,
    added: bool,
}

/// The active components, in activation order.
#[derive(Default)]
struct LiveSet {
    entries: RwLock<IndexMap<InstanceId, LiveEntry>>,
}

impl LiveSet {
    fn insert(&self, entry: LiveEntry) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.roles.instance()) {
            return false;
        }
        entries.insert(entry.roles.instance(), entry);
        true
    }

    fn take(&self, instance: InstanceId) -> Option<LiveEntry> {
        self.entries.write().shift_remove(&instance)
    }

    fn contains(&self, instance: InstanceId) -> bool {
        self.entries.read().contains_key(&instance)
    }

    fn ids(&self) -> Vec<InstanceId> {
        self.entries.read().keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(feature = "tooling")]
impl Scene for LiveSet {
    fn live(&self) -> Vec<Roles> {
        self.entries
            .read()
            .values()
            .map(|entry| entry.roles.clone())
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// World
// ─────────────────────────────────────────────────────────────────────────────

/// Progress of the world through its lifecycle.
///
/// `NotStarted` → `Building` → `Built` → `Unloaded`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    /// `finish()` is executing; plugins added now are built immediately.
    Building,
    Built,
    Unloaded,
}

/// Internal entry for a registered plugin.
struct PluginEntry {
    id: PluginId,
    plugin: Box<dyn Plugin>,
    /// Cached for panic messages.
    name: String,
}

/// Host of one component graph.
///
/// Owns the [`Injector`] every component is wired through and the
/// [`Teardown`] signal that resets it.
pub struct World {
    injector: Arc<Injector>,
    teardown: Teardown,
    settings: HashMap<TypeId, BoxedSetting>,
    live: Arc<LiveSet>,

    /// Plugins pending build (not yet sorted).
    pending_plugins: Vec<PluginEntry>,
    /// Plugins that have been built, in dependency order.
    built_plugins: Vec<PluginEntry>,
    /// Every plugin type added so far, for duplicate detection.
    plugin_ids: HashSet<PluginId>,
    build_state: BuildState,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with a fresh injector attached to the world's
    /// teardown signal.
    #[must_use]
    pub fn new() -> Self {
        let injector = Arc::new(Injector::new());
        let teardown = Teardown::new();
        injector.attach(&teardown);

        let live = Arc::new(LiveSet::default());
        #[cfg(feature = "tooling")]
        {
            let scene: Weak<LiveSet> = Arc::downgrade(&live);
            injector.set_scene(scene);
        }

        Self {
            injector,
            teardown,
            settings: HashMap::new(),
            live,
            pending_plugins: Vec::new(),
            built_plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    /// Returns the world's injector.
    #[must_use]
    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    /// Returns the world's teardown signal.
    ///
    /// Other subsystems may subscribe to it to reset with the world.
    #[must_use]
    pub fn teardown(&self) -> &Teardown {
        &self.teardown
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin or a plugin group.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_world(self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`.",
                name
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { id, plugin, name };
        if self.build_state == BuildState::Building {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns true if a plugin of type `P` has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    /// Returns true once [`finish`](Self::finish) has returned.
    #[must_use]
    pub fn is_built(&self) -> bool {
        matches!(self.build_state, BuildState::Built | BuildState::Unloaded)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a setting, returning the previous value of that type.
    pub fn insert_setting<S: Setting>(&mut self, setting: S) -> Option<S> {
        self.settings
            .insert(TypeId::of::<S>(), Box::new(setting))
            .and_then(|old| old.downcast::<S>().ok())
            .map(|old| *old)
    }

    /// Returns true if a setting of type `S` exists.
    #[must_use]
    pub fn contains_setting<S: Setting>(&self) -> bool {
        self.settings.contains_key(&TypeId::of::<S>())
    }

    /// Returns the setting of type `S`.
    #[must_use]
    pub fn setting<S: Setting>(&self) -> Option<&S> {
        self.settings
            .get(&TypeId::of::<S>())
            .and_then(|boxed| boxed.downcast_ref::<S>())
    }

    /// Returns the setting of type `S` mutably.
    #[must_use]
    pub fn setting_mut<S: Setting>(&mut self) -> Option<&mut S> {
        self.settings
            .get_mut(&TypeId::of::<S>())
            .and_then(|boxed| boxed.downcast_mut::<S>())
    }

    /// Removes and returns the setting of type `S`.
    pub fn remove_setting<S: Setting>(&mut self) -> Option<S> {
        self.settings
            .remove(&TypeId::of::<S>())
            .and_then(|old| old.downcast::<S>().ok())
            .map(|old| *old)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Component Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Makes `component` active.
    ///
    /// Registers it if it is a singleton, adds it to its shared collection if
    /// it is a collection item, then runs its `on_enable` hook. Returns
    /// `Ok(false)` if it was already active.
    ///
    /// If `on_enable` fails, the registrations are rolled back and the
    /// component is left inactive.
    pub fn activate<C: Component>(&self, component: &Arc<C>) -> Result<bool, InjectError> {
        let roles = Roles::declared(component);
        let entry = LiveEntry {
            registered: component.is_singleton(),
            added: component.is_collection_item(),
            roles,
        };
        if !self.live.insert(entry.clone()) {
            return Ok(false);
        }

        if entry.registered {
            self.injector.register(&entry.roles);
        }
        if entry.added {
            self.injector.add_roles(&entry.roles);
        }

        if let Err(err) = Arc::clone(component).on_enable(&self.injector) {
            tracing::warn!(
                component = component.component_name(),
                error = %err,
                "activation failed, rolling back"
            );
            self.withdraw(&entry);
            self.live.take(entry.roles.instance());
            return Err(err);
        }

        tracing::debug!(
            component = component.component_name(),
            singleton = entry.registered,
            collection_item = entry.added,
            "activated component"
        );
        Ok(true)
    }

    /// Makes `component` inactive.
    ///
    /// Runs its `on_disable` hook, then mirrors the registry operations its
    /// activation ran. Returns false if it was not active.
    pub fn deactivate<C: Component>(&self, component: &Arc<C>) -> bool {
        self.deactivate_instance(InstanceId::of(component))
    }

    fn deactivate_instance(&self, instance: InstanceId) -> bool {
        let Some(entry) = self.live.take(instance) else {
            return false;
        };

        let component = Arc::clone(entry.roles.component());
        let name = component.component_name();
        component.on_disable(&self.injector);
        self.withdraw(&entry);

        tracing::debug!(component = name, "deactivated component");
        true
    }

    fn withdraw(&self, entry: &LiveEntry) {
        if entry.added {
            self.injector.remove_roles(&entry.roles);
        }
        if entry.registered {
            self.injector.unregister(&entry.roles);
        }
    }

    /// Deactivates `old` completely, then activates `new`.
    pub fn replace<O: Component, N: Component>(
        &self,
        old: &Arc<O>,
        new: &Arc<N>,
    ) -> Result<bool, InjectError> {
        self.deactivate(old);
        self.activate(new)
    }

    /// Returns true if `component` is active.
    #[must_use]
    pub fn is_live<C: Component>(&self, component: &Arc<C>) -> bool {
        self.live.contains(InstanceId::of(component))
    }

    /// Returns the number of active components.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Deactivates every active component, newest first.
    pub fn deactivate_all(&self) -> usize {
        self.live
            .ids()
            .into_iter()
            .rev()
            .filter(|instance| self.deactivate_instance(*instance))
            .count()
    }

    /// Tells the injector the set of live components changed outside the
    /// activation calls. Only has an effect in inspection mode.
    #[cfg(feature = "tooling")]
    pub fn notify_changed(&self) -> usize {
        self.injector.world_changed()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Builds and readies every plugin in dependency order.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency was never added
    /// - If plugins depend on each other in a cycle
    /// - If called more than once
    pub fn finish(&mut self) {
        if self.build_state != BuildState::NotStarted {
            panic!("World::finish() was already called. Cannot build twice.");
        }

        let sorted = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        }

        self.for_each_built(false, |plugin, world| plugin.ready(world));

        self.build_state = BuildState::Built;
        tracing::info!(plugins = self.built_plugins.len(), "world ready");
    }

    /// Deactivates every live component, cleans up plugins in reverse order,
    /// and fires the teardown signal.
    ///
    /// Plugins are cleaned up at most once; later calls only deactivate and
    /// fire the signal.
    pub fn unload(&mut self) {
        let deactivated = self.deactivate_all();

        if self.build_state == BuildState::Built {
            self.for_each_built(true, |plugin, world| plugin.cleanup(world));
            self.build_state = BuildState::Unloaded;
        }

        let disposed = self.teardown.fire();
        tracing::info!(
            components = deactivated,
            subscribers = disposed,
            "world unloaded"
        );
    }

    /// Runs `f` on each built plugin with mutable world access.
    ///
    /// Plugins added from within `f` are built immediately and kept after the
    /// already built ones.
    fn for_each_built(&mut self, reverse: bool, mut f: impl FnMut(&dyn Plugin, &mut World)) {
        let plugins = core::mem::take(&mut self.built_plugins);
        if reverse {
            for entry in plugins.iter().rev() {
                f(entry.plugin.as_ref(), self);
            }
        } else {
            for entry in &plugins {
                f(entry.plugin.as_ref(), self);
            }
        }
        let added = core::mem::replace(&mut self.built_plugins, plugins);
        self.built_plugins.extend(added);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Dependency Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Topologically sorts the pending plugins (Kahn's algorithm).
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not found
    /// - If there is a circular dependency
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending_plugins);
        let n = pending.len();

        let index_of: HashMap<PluginId, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();

        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in pending.iter().enumerate() {
            for dep in entry.plugin.dependencies() {
                if let Some(&dep_idx) = index_of.get(&dep) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.id == dep) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before {}, or use a plugin group that includes it.",
                        entry.name,
                        dep.type_name(),
                        dep.type_name(),
                        entry.name
                    );
                }
            }
        }

        // Reverse so that independent plugins pop in insertion order.
        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).rev().collect();
        let mut sorted_indices: Vec<usize> = Vec::with_capacity(n);

        while let Some(idx) = queue.pop() {
            sorted_indices.push(idx);
            for &dependent in dependents[idx].iter().rev() {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if sorted_indices.len() != n {
            let in_cycle: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| pending[i].name.as_str())
                .collect();

            panic!(
                "Circular dependency detected among plugins: {:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin.",
                in_cycle
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        sorted_indices
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}

impl core::fmt::Debug for World {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("World")
            .field("build_state", &self.build_state)
            .field("plugins", &self.plugin_ids.len())
            .field("live", &self.live.len())
            .field("injector", &self.injector)
            .finish_non_exhaustive()
    }
}
