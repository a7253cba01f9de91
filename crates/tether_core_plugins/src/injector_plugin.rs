//! Injector configuration plugin.
//!
//! [`InjectorPlugin`] is the configuration surface of the world's
//! [`Injector`]: execution mode and declared collection aliases.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts the [`InjectorConfig`] setting.
//! - **`ready()`** applies the final setting to the injector and declares
//!   the aliases.
//! - **`cleanup()`** logs the registry sizes and resolved singletons.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_core_plugins::InjectorPlugin;
//! use tether_registry::prelude::*;
//! use tether_world::world::World;
//!
//! trait Pickup: Send + Sync {}
//!
//! struct Gem;
//! impl Pickup for Gem {}
//! impl Component for Gem {
//!     fn is_collection_item(&self) -> bool { true }
//!     fn roles(self: Arc<Self>, roles: Roles) -> Roles {
//!         roles.with::<dyn Pickup>(self)
//!     }
//! }
//!
//! let mut world = World::new();
//! world.add_plugins(InjectorPlugin::new().with_alias::<dyn Pickup, Gem>());
//! world.finish();
//!
//! let gems = world.injector().collection::<Gem>();
//! let pickups = world.injector().collection::<dyn Pickup>();
//! assert!(pickups.shares_backing(&gems));
//! ```

use tether_registry::{Component, Injector, InjectorConfig, Mode};
use tether_world::plugin::Plugin;
use tether_world::world::World;

/// A collection alias to declare on the injector.
#[derive(Clone, Copy)]
struct AliasDecl {
    role: &'static str,
    element: &'static str,
    declare: fn(&Injector),
}

fn declare_alias<R: ?Sized + 'static, T: Component>(injector: &Injector) {
    injector.alias::<R, T>();
}

/// Configures the world's injector.
///
/// # Settings Provided
///
/// | Setting | Description |
/// |---------|-------------|
/// | [`InjectorConfig`] | Execution mode applied to the injector at `ready()` |
#[derive(Clone, Default)]
pub struct InjectorPlugin {
    config: InjectorConfig,
    aliases: Vec<AliasDecl>,
}

impl InjectorPlugin {
    /// Creates a plugin with the default configuration (stepping mode).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a plugin that puts the injector in inspection mode.
    #[must_use]
    pub fn inspecting() -> Self {
        Self::new().with_mode(Mode::Inspecting)
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.config = self.config.with_mode(mode);
        self
    }

    /// Declares that the shared collection of `T` serves requests for role
    /// `R`.
    #[must_use]
    pub fn with_alias<R: ?Sized + 'static, T: Component>(mut self) -> Self {
        self.aliases.push(AliasDecl {
            role: core::any::type_name::<R>(),
            element: core::any::type_name::<T>(),
            declare: declare_alias::<R, T>,
        });
        self
    }
}

impl Plugin for InjectorPlugin {
    fn build(&self, world: &mut World) {
        world.insert_setting(self.config);
    }

    fn ready(&self, world: &mut World) {
        let config = world
            .setting::<InjectorConfig>()
            .copied()
            .unwrap_or(self.config);
        let injector = world.injector();
        injector.set_config(config);

        for alias in &self.aliases {
            (alias.declare)(injector);
            tracing::debug!(
                role = alias.role,
                element = alias.element,
                "declared collection alias"
            );
        }

        tracing::info!(
            mode = ?config.mode,
            aliases = self.aliases.len(),
            "InjectorPlugin initialized"
        );
    }

    fn cleanup(&self, world: &mut World) {
        let injector = world.injector();
        for singleton in injector.singletons() {
            tracing::debug!(
                key = %singleton.key,
                component = singleton.component,
                status = %singleton.status,
                "resolved singleton"
            );
        }
        tracing::info!(stats = %injector.stats(), "InjectorPlugin shutting down");
    }
}
