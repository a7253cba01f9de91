//! Host world for `tether`.
//!
//! `tether_world` plays the lifecycle engine that the registry reacts to:
//!
//! - [`plugin`] - Plugin trait and plugin groups
//! - [`world`] - The world: settings, component lifecycle, teardown
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_registry::prelude::*;
//! use tether_world::prelude::*;
//!
//! struct Coin;
//! impl Component for Coin {
//!     fn is_collection_item(&self) -> bool { true }
//! }
//!
//! let mut world = World::new();
//! world.finish();
//!
//! let coins = world.injector().collection::<Coin>();
//! let coin = Arc::new(Coin);
//! world.activate(&coin).unwrap();
//! assert_eq!(coins.len(), 1);
//!
//! world.deactivate(&coin);
//! assert!(coins.is_empty());
//! ```

/// Plugin trait and plugin groups.
pub mod plugin;

/// The host world.
pub mod world;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::plugin::{Plugin, PluginGroup, PluginGroupBuilder, PluginId, Plugins};
    pub use crate::world::{Setting, World};
}
