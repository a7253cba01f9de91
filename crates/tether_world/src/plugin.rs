//! Plugins configure a [`World`] before any component is activated.
//!
//! A plugin inserts settings, declares collection aliases, or installs
//! process-wide services such as a tracing subscriber. Plugins are built in
//! dependency order by [`World::finish`] and cleaned up in reverse order by
//! [`World::unload`].
//!
//! # Example
//!
//! ```
//! use tether_world::plugin::{Plugin, PluginId};
//! use tether_world::world::{Setting, World};
//!
//! struct Difficulty(u8);
//! impl Setting for Difficulty {}
//!
//! struct RulesPlugin;
//!
//! impl Plugin for RulesPlugin {
//!     fn build(&self, world: &mut World) {
//!         world.insert_setting(Difficulty(3));
//!     }
//! }
//!
//! struct SpawnerPlugin;
//!
//! impl Plugin for SpawnerPlugin {
//!     fn build(&self, _world: &mut World) {}
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<RulesPlugin>()]
//!     }
//! }
//!
//! let mut world = World::new();
//! world.add_plugins(SpawnerPlugin).add_plugins(RulesPlugin);
//! world.finish();
//! assert_eq!(world.setting::<Difficulty>().map(|d| d.0), Some(3));
//! ```

use crate::world::World;
use core::any::TypeId;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of world configuration.
///
/// Lifecycle, driven by the world:
///
/// 1. `build()` in dependency order, during [`World::finish`]
/// 2. `ready()` in dependency order, once every plugin is built
/// 3. `cleanup()` in reverse order, during [`World::unload`]
pub trait Plugin: Send + Sync + 'static {
    /// Configures the world. Called once.
    ///
    /// Insert settings and add sub-plugins here. Settings read by other
    /// plugins should be applied in `ready()`, after every plugin had a
    /// chance to override them.
    fn build(&self, world: &mut World);

    /// Called after every plugin has been built.
    fn ready(&self, _world: &mut World) {}

    /// Called when the world unloads, dependents before their dependencies.
    fn cleanup(&self, _world: &mut World) {}

    /// Returns the plugin's name for debugging and panic messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be built before this one.
    ///
    /// [`World::finish`] panics if one of them was never added.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if adding this plugin type twice is an error.
    ///
    /// Defaults to `true`.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Anything accepted by [`World::add_plugins`]: a single [`Plugin`] or a
/// [`PluginGroupBuilder`].
pub trait Plugins {
    /// Adds these plugins to the world.
    fn add_to_world(self, world: &mut World);
}

impl<P: Plugin> Plugins for P {
    fn add_to_world(self, world: &mut World) {
        world.add_plugin_boxed(PluginId::of::<P>(), Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_world(self, world: &mut World) {
        for boxed in self.plugins {
            world.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of plugins that can be customised before being added.
///
/// ```ignore
/// world.add_plugins(
///     DefaultPlugins
///         .build()
///         .disable::<TracingPlugin>()
///         .add(InjectorPlugin::inspecting()),
/// );
/// ```
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with the [`PluginId`] captured before boxing.
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

/// Ordered, editable list of plugins produced by a [`PluginGroup`].
#[derive(Default)]
pub struct PluginGroupBuilder {
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position_of<Target: Plugin>(&self) -> Option<usize> {
        let target = PluginId::of::<Target>();
        self.plugins.iter().position(|p| p.id == target)
    }

    fn insert_at<P: Plugin>(&mut self, index: usize, plugin: P) {
        self.plugins.insert(
            index,
            BoxedPlugin {
                id: PluginId::of::<P>(),
                plugin: Box::new(plugin),
            },
        );
    }

    /// Appends a plugin.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        let end = self.plugins.len();
        self.insert_at(end, plugin);
        self
    }

    /// Inserts a plugin before `Target`, or first if `Target` is absent.
    #[must_use]
    pub fn add_before<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let index = self.position_of::<Target>().unwrap_or(0);
        self.insert_at(index, plugin);
        self
    }

    /// Inserts a plugin after `Target`, or last if `Target` is absent.
    #[must_use]
    pub fn add_after<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let index = self
            .position_of::<Target>()
            .map_or(self.plugins.len(), |i| i + 1);
        self.insert_at(index, plugin);
        self
    }

    /// Removes every plugin of type `P`. No-op if absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != id);
        self
    }

    /// Returns true if the group contains a plugin of type `P`.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        self.position_of::<P>().is_some()
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
