//! Component and consumer traits.
//!
//! A [`Component`] is any shared instance whose lifetime is driven by an
//! external lifecycle engine. The trait exposes three independent
//! capabilities, all opt-in:
//!
//! | Capability | Hook | Registry operation |
//! |------------|------|--------------------|
//! | Singleton role | [`Component::is_singleton`] + [`Component::roles`] | `register` / `unregister` |
//! | Collection item | [`Component::is_collection_item`] | `add` / `remove` |
//! | Consumer | [`Consumer`] + [`Component::on_enable`] | `inject` / `eject` |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_registry::prelude::*;
//!
//! trait AudioService: Send + Sync {
//!     fn volume(&self) -> f32;
//! }
//!
//! struct Mixer;
//!
//! impl AudioService for Mixer {
//!     fn volume(&self) -> f32 { 0.8 }
//! }
//!
//! impl Component for Mixer {
//!     fn is_singleton(&self) -> bool { true }
//!
//!     fn roles(self: Arc<Self>, roles: Roles) -> Roles {
//!         roles.with::<dyn AudioService>(self)
//!     }
//! }
//!
//! #[derive(Default, Consumer)]
//! struct Speaker {
//!     #[inject]
//!     audio: Inject<dyn AudioService>,
//! }
//!
//! impl Component for Speaker {
//!     fn on_enable(self: Arc<Self>, injector: &Injector) -> Result<(), InjectError> {
//!         injector.inject(&self)
//!     }
//!
//!     fn on_disable(self: Arc<Self>, injector: &Injector) {
//!         injector.eject(&self);
//!     }
//! }
//! ```

use crate::error::InjectError;
use crate::injector::Injector;
use crate::roles::Roles;
use crate::slot::Slots;
use downcast_rs::{DowncastSync, impl_downcast};
use std::sync::Arc;

/// A shared instance managed by a host lifecycle engine.
///
/// All hooks have no-op defaults, so a plain data component only needs an
/// empty `impl Component for T {}`.
pub trait Component: DowncastSync {
    /// Returns true if this component publishes itself as a singleton for
    /// its [`roles`](Self::roles) while it is active.
    fn is_singleton(&self) -> bool {
        false
    }

    /// Returns true if this component joins the shared collection of its
    /// concrete type while it is active.
    fn is_collection_item(&self) -> bool {
        false
    }

    /// Extends `roles` (which already holds the concrete type) with the role
    /// trait objects this component fulfils.
    ///
    /// The default publishes the concrete type only.
    fn roles(self: Arc<Self>, roles: Roles) -> Roles {
        roles
    }

    /// Called by the lifecycle engine after the component became active.
    ///
    /// Consumers call [`Injector::inject`] here.
    fn on_enable(self: Arc<Self>, _injector: &Injector) -> Result<(), InjectError> {
        Ok(())
    }

    /// Called by the lifecycle engine before the component becomes inactive.
    ///
    /// Consumers call [`Injector::eject`] here.
    fn on_disable(self: Arc<Self>, _injector: &Injector) {}

    /// Free-form status line shown in registry diagnostics.
    fn status(&self) -> String {
        String::new()
    }

    /// Returns the component's name for diagnostics.
    fn component_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl_downcast!(sync Component);

/// A component that declares dependency slots.
///
/// Usually derived with `#[derive(Consumer)]`, which registers every field
/// annotated with `#[inject]`. A manual implementation calls
/// [`Slots::slot`] (or the typed [`Slots::singleton`] /
/// [`Slots::collection`] helpers) once per slot, in a stable order.
///
/// ```
/// use tether_registry::prelude::*;
///
/// struct Radar;
/// impl Component for Radar {}
///
/// #[derive(Default)]
/// struct Hud {
///     radars: Collect<Radar>,
/// }
///
/// impl Component for Hud {}
///
/// impl Consumer for Hud {
///     fn declare_slots(slots: &mut Slots<Self>) {
///         slots.collection("radars", |hud| &hud.radars);
///     }
/// }
/// ```
pub trait Consumer: Component + Sized {
    /// Declares this type's dependency slots.
    ///
    /// Called once per concrete type; the result is cached by the injector.
    fn declare_slots(slots: &mut Slots<Self>);
}
