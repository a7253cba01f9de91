//! Core infrastructure plugins for tether.
//!
//! This crate provides the plugins most tether worlds need:
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//! - [`InjectorPlugin`] - Injector mode and declared collection aliases
//! - [`DefaultPlugins`] - Bundle of both
//! - [`MinimalPlugins`] - Injector configuration only, no global subscriber
//!
//! # Example
//!
//! ```
//! use tether_core_plugins::DefaultPlugins;
//! use tether_world::plugin::PluginGroup;
//! use tether_world::world::World;
//!
//! let mut world = World::new();
//! world.add_plugins(DefaultPlugins.build());
//! world.finish();
//! ```
//!
//! # Individual Plugin Usage
//!
//! ```
//! use tether_core_plugins::{InjectorPlugin, TracingPlugin};
//! use tether_world::world::World;
//! use tracing::Level;
//!
//! let mut world = World::new();
//! world
//!     .add_plugins(InjectorPlugin::inspecting())
//!     .add_plugins(TracingPlugin::default().with_level(Level::DEBUG));
//! world.finish();
//! ```

mod injector_plugin;
mod tracing_plugin;

pub use injector_plugin::InjectorPlugin;
pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use tether_world::plugin::{PluginGroup, PluginGroupBuilder};

/// Default plugins for most tether worlds.
///
/// Includes:
/// - [`TracingPlugin`] - Logging and observability
/// - [`InjectorPlugin`] - Injector configuration (stepping mode)
///
/// # Customization
///
/// ```
/// use tether_core_plugins::{DefaultPlugins, InjectorPlugin, TracingPlugin};
/// use tether_world::plugin::PluginGroup;
/// use tether_world::world::World;
///
/// let mut world = World::new();
/// world.add_plugins(
///     DefaultPlugins
///         .build()
///         .disable::<TracingPlugin>()
///         .disable::<InjectorPlugin>()
///         .add(InjectorPlugin::inspecting()),
/// );
/// world.finish();
/// ```
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(TracingPlugin::default())
            .add(InjectorPlugin::default())
    }
}

/// Minimal plugins for headless or testing scenarios.
///
/// Includes only [`InjectorPlugin`]. No global subscriber is installed, so
/// tests stay free to install their own.
pub struct MinimalPlugins;

impl PluginGroup for MinimalPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(InjectorPlugin::default())
    }
}
