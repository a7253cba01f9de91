//! A runtime dependency registry for short-lived components.
//!
//! Components that are activated and deactivated many times over a run
//! (spawned enemies, scene objects, UI panels) declare what they need as
//! slots. The registry fills those slots from singletons and live
//! collections, and keeps them current as collaborators come and go.
//!
//! - [`tether_registry`] - the injector, slots, roles, and collections
//! - [`tether_world`] - the host world: plugins, settings, lifecycle
//! - [`tether_core_plugins`] - tracing and injector configuration plugins
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock(u64);
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 { self.0 }
//! }
//! impl Component for FixedClock {
//!     fn is_singleton(&self) -> bool { true }
//!     fn roles(self: Arc<Self>, roles: Roles) -> Roles {
//!         roles.with::<dyn Clock>(self)
//!     }
//! }
//!
//! #[derive(Default, Consumer)]
//! struct Timer {
//!     #[inject]
//!     clock: Inject<dyn Clock>,
//! }
//! impl Component for Timer {
//!     fn on_enable(self: Arc<Self>, injector: &Injector) -> Result<(), InjectError> {
//!         injector.inject(&self)
//!     }
//!     fn on_disable(self: Arc<Self>, injector: &Injector) {
//!         injector.eject(&self);
//!     }
//! }
//!
//! let mut world = World::new();
//! world.add_plugins(MinimalPlugins.build());
//! world.finish();
//!
//! let timer = Arc::new(Timer::default());
//! world.activate(&timer).unwrap();
//! assert!(timer.clock.get().is_none());
//!
//! let clock = Arc::new(FixedClock(42));
//! world.activate(&clock).unwrap();
//! assert_eq!(timer.clock.get().map(|c| c.now()), Some(42));
//!
//! world.deactivate(&clock);
//! assert!(timer.clock.get().is_none());
//! ```

pub use tether_core_plugins;
pub use tether_registry;
pub use tether_world;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_core_plugins::{
        DefaultPlugins, InjectorPlugin, MinimalPlugins, TracingFormat, TracingPlugin,
    };
    pub use tether_registry::prelude::*;
    pub use tether_world::prelude::*;
}
