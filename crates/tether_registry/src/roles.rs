//! Role sets: the capability keys an instance is reachable under.

use crate::component::Component;
use crate::key::{InstanceId, TypeKey};
use core::any::Any;
use std::sync::Arc;

/// One published view of an instance.
#[derive(Clone)]
pub(crate) struct RoleEntry {
    pub(crate) key: TypeKey,
    /// Holds an `Arc<R>` where `R` is the type named by `key`.
    pub(crate) value: Arc<dyn Any + Send + Sync>,
}

/// The set of capability keys one instance publishes.
///
/// A `Roles` always contains the instance's concrete type. Role trait objects
/// are added with [`with`](Self::with); every entry must point at the same
/// allocation.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tether_registry::prelude::*;
///
/// trait Clock: Send + Sync {}
///
/// struct WallClock;
/// impl Clock for WallClock {}
/// impl Component for WallClock {}
///
/// let clock = Arc::new(WallClock);
/// let roles = Roles::of(&clock).with::<dyn Clock>(clock.clone());
///
/// assert!(roles.contains(TypeKey::of::<WallClock>()));
/// assert!(roles.contains(TypeKey::of::<dyn Clock>()));
/// assert!(roles.project::<dyn Clock>().is_some());
/// ```
#[derive(Clone)]
pub struct Roles {
    instance: InstanceId,
    concrete: TypeKey,
    component: Arc<dyn Component>,
    entries: Vec<RoleEntry>,
}

impl Roles {
    /// Creates a role set containing only the concrete type of `instance`.
    #[must_use]
    pub fn of<T: Component>(instance: &Arc<T>) -> Self {
        let component: Arc<dyn Component> = instance.clone();
        let mut roles = Self {
            instance: InstanceId::of(instance),
            concrete: TypeKey::of::<T>(),
            component,
            entries: Vec::new(),
        };
        roles.push(TypeKey::of::<T>(), Arc::clone(instance));
        roles
    }

    /// Creates the full role set of `instance`: its concrete type plus every
    /// role declared by [`Component::roles`].
    #[must_use]
    pub fn declared<T: Component>(instance: &Arc<T>) -> Self {
        Arc::clone(instance).roles(Self::of(instance))
    }

    /// Adds a role view of the same instance.
    ///
    /// Views of a different allocation are ignored with a warning, since a
    /// role set describes exactly one instance.
    #[must_use]
    pub fn with<R: ?Sized + Send + Sync + 'static>(mut self, role: Arc<R>) -> Self {
        if InstanceId::of(&role) != self.instance {
            tracing::warn!(
                role = core::any::type_name::<R>(),
                component = self.component.component_name(),
                "ignoring role view that points at a different instance"
            );
            return self;
        }
        self.push(TypeKey::of::<R>(), role);
        self
    }

    fn push<R: ?Sized + Send + Sync + 'static>(&mut self, key: TypeKey, value: Arc<R>) {
        if self.contains(key) {
            return;
        }
        self.entries.push(RoleEntry {
            key,
            value: Arc::new(value),
        });
    }

    /// Returns the identity of the described instance.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Returns the concrete type key of the described instance.
    #[must_use]
    pub fn concrete(&self) -> TypeKey {
        self.concrete
    }

    /// Returns the described instance as a component.
    #[must_use]
    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }

    /// Returns true if the instance is reachable under `key`.
    #[must_use]
    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Iterates over every key in insertion order (concrete type first).
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.entries.iter().map(|entry| entry.key)
    }

    /// Returns the instance viewed as `R`, if it publishes that role.
    #[must_use]
    pub fn project<R: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<R>> {
        self.entry(TypeKey::of::<R>())
            .and_then(|entry| entry.value.downcast_ref::<Arc<R>>())
            .cloned()
    }

    pub(crate) fn entry(&self, key: TypeKey) -> Option<&RoleEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub(crate) fn entries(&self) -> &[RoleEntry] {
        &self.entries
    }
}

impl core::fmt::Debug for Roles {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Roles")
            .field("instance", &self.instance)
            .field("keys", &self.keys().map(|key| key.type_name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Builds a [`Roles`] for an `&Arc<T>` and a list of role trait objects.
///
/// ```
/// use std::sync::Arc;
/// use tether_registry::prelude::*;
///
/// trait Input: Send + Sync {}
/// trait Output: Send + Sync {}
///
/// struct Device;
/// impl Input for Device {}
/// impl Output for Device {}
/// impl Component for Device {}
///
/// let device = Arc::new(Device);
/// let roles = tether_registry::roles!(&device, dyn Input, dyn Output);
/// assert_eq!(roles.keys().count(), 3);
/// ```
#[macro_export]
macro_rules! roles {
    ($instance:expr $(, $role:ty)* $(,)?) => {{
        let instance = $instance;
        $crate::Roles::of(instance)
            $(.with::<$role>(::std::sync::Arc::clone(instance) as ::std::sync::Arc<$role>))*
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }
    impl Component for English {
        fn roles(self: Arc<Self>, roles: Roles) -> Roles {
            roles.with::<dyn Greeter>(self)
        }
    }

    struct Plain;
    impl Component for Plain {}

    #[test]
    fn of_contains_concrete_only() {
        let plain = Arc::new(Plain);
        let roles = Roles::of(&plain);
        assert_eq!(roles.concrete(), TypeKey::of::<Plain>());
        assert_eq!(roles.keys().collect::<Vec<_>>(), vec![TypeKey::of::<Plain>()]);
        assert_eq!(roles.instance(), InstanceId::of(&plain));
    }

    #[test]
    fn declared_includes_component_roles() {
        let english = Arc::new(English);
        let roles = Roles::declared(&english);
        assert!(roles.contains(TypeKey::of::<English>()));
        assert!(roles.contains(TypeKey::of::<dyn Greeter>()));
        assert_eq!(roles.project::<dyn Greeter>().unwrap().greet(), "hello");
    }

    #[test]
    fn project_concrete_returns_same_instance() {
        let english = Arc::new(English);
        let roles = Roles::declared(&english);
        let projected = roles.project::<English>().unwrap();
        assert!(Arc::ptr_eq(&projected, &english));
    }

    #[test]
    fn duplicate_roles_are_ignored() {
        let english = Arc::new(English);
        let roles = Roles::declared(&english).with::<dyn Greeter>(english.clone());
        assert_eq!(roles.keys().count(), 2);
    }

    #[test]
    fn foreign_instance_is_rejected() {
        let english = Arc::new(English);
        let other: Arc<dyn Greeter> = Arc::new(English);
        let roles = Roles::of(&english).with::<dyn Greeter>(other);
        assert!(!roles.contains(TypeKey::of::<dyn Greeter>()));
    }

    #[test]
    fn roles_macro_builds_all_views() {
        let english = Arc::new(English);
        let roles = crate::roles!(&english, dyn Greeter);
        assert!(roles.project::<dyn Greeter>().is_some());
        assert!(roles.project::<Plain>().is_none());
    }
}
