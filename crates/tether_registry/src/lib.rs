//! Runtime dependency registry for short-lived components.
//!
//! `tether_registry` wires components that are activated and deactivated
//! repeatedly (scene loads, spawns, despawns) to the collaborators they
//! need, without a central orchestrator owning their lifetime:
//!
//! - [`component`] - `Component` and `Consumer` traits
//! - [`roles`] - role sets: the keys an instance is reachable under
//! - [`slot`] - `Inject<R>` and `Collect<T>` dependency slots
//! - [`collection`] - shared live collections
//! - [`injector`] - the registry context
//! - [`teardown`] - teardown signal that resets the registry
//!
//! # Architecture
//!
//! The [`Injector`] owns four registries:
//!
//! - **Slot cache**: consumer type → declared slots, computed once per type.
//! - **Singletons**: capability key → resolved instance (last registration
//!   wins).
//! - **Targets**: capability key → (slot, consumer) pairs to update when
//!   the key's singleton changes.
//! - **Collections**: element type → shared, order-preserving member list.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_registry::prelude::*;
//!
//! trait Enemy: Send + Sync {}
//!
//! struct Slime;
//! impl Enemy for Slime {}
//! impl Component for Slime {
//!     fn roles(self: Arc<Self>, roles: Roles) -> Roles {
//!         roles.with::<dyn Enemy>(self)
//!     }
//! }
//!
//! #[derive(Default, Consumer)]
//! struct Radar {
//!     #[inject]
//!     enemies: Collect<dyn Enemy>,
//! }
//! impl Component for Radar {}
//!
//! let injector = Injector::new();
//! let slime = Arc::new(Slime);
//! injector.add(&slime);
//!
//! let radar = Arc::new(Radar::default());
//! injector.inject(&radar).unwrap();
//! assert_eq!(radar.enemies.len(), 1);
//!
//! injector.remove(&slime);
//! assert!(radar.enemies.is_empty());
//! ```

// Self-reference so `#[derive(Consumer)]` output resolves inside this crate.
extern crate self as tether_registry;

mod cache;
mod retired;
mod singleton;
mod target;

/// Shared live collections.
pub mod collection;

/// Component and consumer traits.
pub mod component;

/// Injector configuration.
pub mod config;

/// Registry errors.
pub mod error;

/// The registry context.
pub mod injector;

/// Capability keys and instance identity.
pub mod key;

/// Role sets.
pub mod roles;

/// Dependency slots.
pub mod slot;

/// Teardown signal.
pub mod teardown;

/// Inspection-mode fallbacks.
#[cfg(feature = "tooling")]
pub mod tooling;

pub use collection::LiveCollection;
pub use component::{Component, Consumer};
pub use config::{InjectorConfig, Mode};
pub use error::InjectError;
pub use injector::{Injector, InjectorStats, SingletonStatus};
pub use key::{InstanceId, TypeKey};
pub use roles::Roles;
pub use slot::{Collect, Inject, SlotDescriptor, SlotField, SlotId, SlotKind, Slots};
pub use teardown::{Dispose, Teardown};
#[cfg(feature = "tooling")]
pub use tooling::Scene;

/// Re-export the `#[derive(Consumer)]` macro.
pub use tether_registry_macros::Consumer;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::collection::LiveCollection;
    pub use crate::component::{Component, Consumer};
    pub use crate::config::{InjectorConfig, Mode};
    pub use crate::error::InjectError;
    pub use crate::injector::{Injector, InjectorStats};
    pub use crate::key::{InstanceId, TypeKey};
    pub use crate::roles::Roles;
    pub use crate::slot::{Collect, Inject, Slots};
    pub use crate::teardown::{Dispose, Teardown};
    #[cfg(feature = "tooling")]
    pub use crate::tooling::Scene;
    pub use tether_registry_macros::Consumer;
}
