//! Inspection-mode fallbacks.
//!
//! While the host is inspecting rather than stepping, components can exist
//! without their activation hooks having run. Two fallbacks cover that gap:
//!
//! - a singleton slot left empty by [`Injector::inject`] is filled from the
//!   first live component in the [`Scene`] that publishes the slot's role;
//! - [`Injector::world_changed`] rebuilds every shared collection from the
//!   scene's live collection items.
//!
//! Both are no-ops in [`Mode::Stepping`](crate::Mode::Stepping).

use crate::component::Component;
use crate::injector::Injector;
use crate::retired::Retired;
use crate::roles::Roles;
use crate::slot::{Access, SlotDescriptor};
use std::sync::Weak;

/// The host's view of its live components.
pub trait Scene: Send + Sync {
    /// Returns the role sets of every live component, in activation order.
    fn live(&self) -> Vec<Roles>;
}

impl Injector {
    /// Sets the scene scanned by inspection-mode fallbacks.
    pub fn set_scene(&self, scene: Weak<dyn Scene>) {
        *self.scene.write() = Some(scene);
    }

    fn live_components(&self) -> Option<Vec<Roles>> {
        let scene = self.scene.read().as_ref().and_then(Weak::upgrade)?;
        Some(scene.live())
    }

    /// Fills each of `slots` on `consumer` from the first live component
    /// publishing the slot's key. Returns the number of slots filled.
    pub(crate) fn fallback_scan(&self, consumer: &dyn Component, slots: &[SlotDescriptor]) -> usize {
        let Some(live) = self.live_components() else {
            return 0;
        };

        let mut retired = Retired::default();
        let mut filled = 0;
        for slot in slots {
            let Access::Singleton(access) = slot.access() else {
                continue;
            };
            if access.is_set(consumer) {
                continue;
            }
            let found = live.iter().find_map(|roles| roles.entry(slot.key()));
            if let Some(entry) = found
                && access.assign(consumer, &*entry.value, &mut retired)
            {
                tracing::debug!(
                    slot = slot.name(),
                    key = %slot.key(),
                    "filled slot from scene scan"
                );
                filled += 1;
            }
        }
        filled
    }

    /// Rebuilds every shared collection from the scene's live collection
    /// items. Returns the number of restored members.
    ///
    /// Each list is refilled with the items publishing its element key, so
    /// role-keyed lists are restored alongside concrete ones.
    ///
    /// Only runs in inspection mode; returns zero otherwise.
    pub fn world_changed(&self) -> usize {
        if !self.config().is_inspecting() {
            return 0;
        }
        let Some(live) = self.live_components() else {
            return 0;
        };

        let items: Vec<Roles> = live
            .into_iter()
            .filter(|roles| roles.component().is_collection_item())
            .collect();
        let mut retired = Retired::default();
        let restored = self
            .registries
            .lock()
            .collections
            .rebuild(&items, &mut retired);
        drop(retired);
        tracing::info!(items = restored, "rebuilt shared collections");
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Consumer;
    use crate::config::Mode;
    use crate::slot::{Inject, Slots};
    use parking_lot::Mutex;
    use std::sync::Arc;

    trait Weather: Send + Sync {}

    struct Rain;
    impl Weather for Rain {}
    impl Component for Rain {
        fn roles(self: Arc<Self>, roles: Roles) -> Roles {
            roles.with::<dyn Weather>(self)
        }
    }

    struct Leaf;
    impl Component for Leaf {
        fn is_collection_item(&self) -> bool {
            true
        }
    }

    trait Foliage: Send + Sync {}

    struct Fern;
    impl Foliage for Fern {}
    impl Component for Fern {
        fn is_collection_item(&self) -> bool {
            true
        }

        fn roles(self: Arc<Self>, roles: Roles) -> Roles {
            roles.with::<dyn Foliage>(self)
        }
    }

    #[derive(Default)]
    struct Window {
        weather: Inject<dyn Weather>,
    }

    impl Component for Window {}

    impl Consumer for Window {
        fn declare_slots(slots: &mut Slots<Self>) {
            slots.singleton("weather", |w| &w.weather);
        }
    }

    #[derive(Default)]
    struct Stage(Mutex<Vec<Roles>>);

    impl Scene for Stage {
        fn live(&self) -> Vec<Roles> {
            self.0.lock().clone()
        }
    }

    fn staged(injector: &Injector) -> Arc<Stage> {
        let stage = Arc::new(Stage::default());
        let weak = Arc::downgrade(&stage);
        injector.set_scene(weak);
        stage
    }

    #[test]
    fn scan_fills_unresolved_slot_when_inspecting() {
        let injector = Injector::new();
        injector.set_mode(Mode::Inspecting);
        let stage = staged(&injector);
        let rain = Arc::new(Rain);
        stage.0.lock().push(Roles::declared(&rain));

        let window = Arc::new(Window::default());
        injector.inject(&window).unwrap();
        assert!(window.weather.is_set());
    }

    #[test]
    fn scan_is_skipped_when_stepping() {
        let injector = Injector::new();
        let stage = staged(&injector);
        stage.0.lock().push(Roles::declared(&Arc::new(Rain)));

        let window = Arc::new(Window::default());
        injector.inject(&window).unwrap();
        assert!(!window.weather.is_set());
    }

    #[test]
    fn world_changed_rebuilds_tracked_collections() {
        let injector = Injector::new();
        let stage = staged(&injector);
        let leaves = injector.collection::<Leaf>();

        let a = Arc::new(Leaf);
        let b = Arc::new(Leaf);
        injector.add(&a);
        stage.0.lock().push(Roles::declared(&b));

        assert_eq!(injector.world_changed(), 0);
        assert!(leaves.contains(&a));

        injector.set_mode(Mode::Inspecting);
        assert_eq!(injector.world_changed(), 1);
        assert!(!leaves.contains(&a));
        assert!(leaves.contains(&b));
    }

    #[test]
    fn world_changed_restores_role_keyed_lists() {
        let injector = Injector::new();
        injector.set_mode(Mode::Inspecting);
        let stage = staged(&injector);
        let foliage = injector.collection::<dyn Foliage>();

        let fern = Arc::new(Fern);
        stage.0.lock().push(Roles::declared(&fern));
        stage.0.lock().push(Roles::declared(&Arc::new(Leaf)));

        assert_eq!(injector.world_changed(), 1);
        assert_eq!(foliage.len(), 1);
        let as_foliage: Arc<dyn Foliage> = fern.clone();
        assert!(foliage.contains(&as_foliage));

        assert!(injector.remove(&fern));
        assert!(foliage.is_empty());
    }
}
