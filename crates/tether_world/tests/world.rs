//! Tests for the world: plugin orchestration, settings, and the component
//! lifecycle engine driving the injector.

use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use tether_registry::prelude::*;
use tether_world::prelude::*;

// ─────────────────────────────────────────────────────────────────────────
// Test Settings & Plugins
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Gravity(i32);
impl Setting for Gravity {}

#[derive(Default)]
struct CleanupLog(Arc<Mutex<Vec<&'static str>>>);
impl Setting for CleanupLog {}

struct PluginA;
impl Plugin for PluginA {
    fn build(&self, world: &mut World) {
        world.insert_setting(Gravity(1));
    }
}

struct PluginB;
impl Plugin for PluginB {
    fn build(&self, world: &mut World) {
        if let Some(gravity) = world.setting_mut::<Gravity>() {
            gravity.0 += 10;
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<PluginA>()]
    }
}

struct PluginC;
impl Plugin for PluginC {
    fn build(&self, world: &mut World) {
        if let Some(gravity) = world.setting_mut::<Gravity>() {
            gravity.0 *= 2;
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<PluginB>()]
    }
}

struct ReadyPlugin;
impl Plugin for ReadyPlugin {
    fn build(&self, _world: &mut World) {}

    fn ready(&self, world: &mut World) {
        world.insert_setting(Gravity(-1));
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Test Components
// ─────────────────────────────────────────────────────────────────────────

trait Weather: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Forecast(&'static str);

impl Weather for Forecast {
    fn name(&self) -> &'static str {
        self.0
    }
}

impl Component for Forecast {
    fn is_singleton(&self) -> bool {
        true
    }

    fn roles(self: Arc<Self>, roles: Roles) -> Roles {
        roles.with::<dyn Weather>(self)
    }

    fn status(&self) -> String {
        format!("forecasting {}", self.0)
    }
}

struct Cloud;

impl Component for Cloud {
    fn is_collection_item(&self) -> bool {
        true
    }
}

#[derive(Default, Consumer)]
struct Window {
    #[inject]
    weather: Inject<dyn Weather>,
    #[inject]
    clouds: Collect<Cloud>,
    disabled: AtomicUsize,
}

impl Component for Window {
    fn on_enable(self: Arc<Self>, injector: &Injector) -> Result<(), InjectError> {
        injector.inject(&self)
    }

    fn on_disable(self: Arc<Self>, injector: &Injector) {
        self.disabled.fetch_add(1, Ordering::SeqCst);
        injector.eject(&self);
    }
}

#[derive(Default, Consumer)]
struct Broken {
    #[inject(name = "weather")]
    first: Inject<dyn Weather>,
    #[inject(name = "weather")]
    second: Inject<dyn Weather>,
}

impl Component for Broken {
    fn is_singleton(&self) -> bool {
        true
    }

    fn on_enable(self: Arc<Self>, injector: &Injector) -> Result<(), InjectError> {
        injector.inject(&self)
    }
}

fn weather_name(window: &Window) -> Option<&'static str> {
    window.weather.get().map(|w| w.name())
}

// ─────────────────────────────────────────────────────────────────────────
// Plugins
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn world_new_is_empty() {
    let world = World::new();
    assert!(!world.is_built());
    assert_eq!(world.live_count(), 0);
    assert!(!world.contains_setting::<Gravity>());
    assert_eq!(world.teardown().len(), 1);
}

#[test]
fn plugins_build_in_dependency_order() {
    let mut world = World::new();
    world
        .add_plugins(PluginC)
        .add_plugins(PluginB)
        .add_plugins(PluginA);
    world.finish();

    // (1 + 10) * 2
    assert_eq!(world.setting::<Gravity>(), Some(&Gravity(22)));
    assert!(world.is_built());
}

#[test]
fn plugin_ready_runs_after_build() {
    let mut world = World::new();
    world.add_plugins(ReadyPlugin).add_plugins(PluginA);
    world.finish();
    assert_eq!(world.setting::<Gravity>(), Some(&Gravity(-1)));
}

#[test]
fn has_plugin_returns_true_for_added() {
    let mut world = World::new();
    world.add_plugins(PluginA);
    assert!(world.has_plugin::<PluginA>());
    assert!(!world.has_plugin::<PluginB>());
}

#[test]
#[should_panic(expected = "already added")]
fn duplicate_unique_plugin_panics() {
    let mut world = World::new();
    world.add_plugins(PluginA);
    world.add_plugins(PluginA);
}

#[test]
#[should_panic(expected = "requires")]
fn missing_dependency_panics() {
    let mut world = World::new();
    world.add_plugins(PluginB);
    world.finish();
}

#[test]
#[should_panic(expected = "Circular dependency")]
fn circular_dependency_panics() {
    struct CycleA;
    impl Plugin for CycleA {
        fn build(&self, _world: &mut World) {}
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<CycleB>()]
        }
    }

    struct CycleB;
    impl Plugin for CycleB {
        fn build(&self, _world: &mut World) {}
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<CycleA>()]
        }
    }

    let mut world = World::new();
    world.add_plugins(CycleA).add_plugins(CycleB);
    world.finish();
}

#[test]
#[should_panic(expected = "already called")]
fn double_finish_panics() {
    let mut world = World::new();
    world.finish();
    world.finish();
}

#[test]
fn non_unique_plugin_can_be_added_multiple_times() {
    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Repeatable;
    impl Plugin for Repeatable {
        fn build(&self, _world: &mut World) {
            BUILDS.fetch_add(1, Ordering::SeqCst);
        }
        fn is_unique(&self) -> bool {
            false
        }
    }

    let mut world = World::new();
    world.add_plugins(Repeatable).add_plugins(Repeatable);
    world.finish();
    assert_eq!(BUILDS.load(Ordering::SeqCst), 2);
}

#[test]
fn sub_plugin_added_during_build() {
    struct Parent;
    impl Plugin for Parent {
        fn build(&self, world: &mut World) {
            world.add_plugins(PluginA);
        }
    }

    let mut world = World::new();
    world.add_plugins(Parent);
    world.finish();
    assert!(world.has_plugin::<PluginA>());
    assert_eq!(world.setting::<Gravity>(), Some(&Gravity(1)));
}

struct TestGroup;
impl PluginGroup for TestGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(PluginA).add(PluginB)
    }
}

#[test]
fn plugin_group_adds_all_plugins() {
    let mut world = World::new();
    world.add_plugins(TestGroup.build());
    world.finish();
    assert!(world.has_plugin::<PluginA>());
    assert!(world.has_plugin::<PluginB>());
    assert_eq!(world.setting::<Gravity>(), Some(&Gravity(11)));
}

#[test]
fn cleanup_runs_in_reverse_order_once() {
    struct First;
    impl Plugin for First {
        fn build(&self, world: &mut World) {
            world.insert_setting(CleanupLog::default());
        }
        fn cleanup(&self, world: &mut World) {
            if let Some(log) = world.setting::<CleanupLog>() {
                log.0.lock().push("first");
            }
        }
    }

    struct Second;
    impl Plugin for Second {
        fn build(&self, _world: &mut World) {}
        fn cleanup(&self, world: &mut World) {
            if let Some(log) = world.setting::<CleanupLog>() {
                log.0.lock().push("second");
            }
        }
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<First>()]
        }
    }

    let mut world = World::new();
    world.add_plugins(Second).add_plugins(First);
    world.finish();
    let log = Arc::clone(&world.setting::<CleanupLog>().unwrap().0);

    world.unload();
    world.unload();
    assert_eq!(*log.lock(), vec!["second", "first"]);
}

// ─────────────────────────────────────────────────────────────────────────
// Component lifecycle
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn consumer_activated_before_singleton_is_filled() {
    let world = World::new();
    let window = Arc::new(Window::default());
    world.activate(&window).unwrap();
    assert_eq!(weather_name(&window), None);

    world.activate(&Arc::new(Forecast("sunny"))).unwrap();
    assert_eq!(weather_name(&window), Some("sunny"));
}

#[test]
fn deactivating_singleton_clears_consumer() {
    let world = World::new();
    let forecast = Arc::new(Forecast("rain"));
    world.activate(&forecast).unwrap();

    let window = Arc::new(Window::default());
    world.activate(&window).unwrap();
    assert_eq!(weather_name(&window), Some("rain"));

    assert!(world.deactivate(&forecast));
    assert_eq!(weather_name(&window), None);
}

#[test]
fn deactivated_consumer_stops_receiving_updates() {
    let world = World::new();
    let window = Arc::new(Window::default());
    world.activate(&window).unwrap();
    assert!(world.deactivate(&window));
    assert_eq!(window.disabled.load(Ordering::SeqCst), 1);

    world.activate(&Arc::new(Forecast("fog"))).unwrap();
    assert_eq!(weather_name(&window), None);
}

#[test]
fn replace_swaps_singleton() {
    let world = World::new();
    let window = Arc::new(Window::default());
    world.activate(&window).unwrap();

    let old = Arc::new(Forecast("old"));
    let new = Arc::new(Forecast("new"));
    world.activate(&old).unwrap();
    assert_eq!(world.replace(&old, &new), Ok(true));

    assert_eq!(weather_name(&window), Some("new"));
    assert!(!world.is_live(&old));
    assert!(world.is_live(&new));
}

#[test]
fn collection_items_follow_activation() {
    let world = World::new();
    let window = Arc::new(Window::default());
    world.activate(&window).unwrap();

    let a = Arc::new(Cloud);
    let b = Arc::new(Cloud);
    world.activate(&a).unwrap();
    world.activate(&b).unwrap();
    world.activate(&a).unwrap();
    assert_eq!(window.clouds.len(), 2);

    world.deactivate(&a);
    let clouds = window.clouds.to_vec();
    assert_eq!(clouds.len(), 1);
    assert!(Arc::ptr_eq(&clouds[0], &b));
}

#[test]
fn failed_activation_is_rolled_back() {
    let world = World::new();
    let broken = Arc::new(Broken::default());

    let err = world.activate(&broken).unwrap_err();
    assert!(matches!(err, InjectError::DuplicateSlot { slot: "weather", .. }));
    assert!(!world.is_live(&broken));
    assert!(world.injector().resolve::<Broken>().is_none());
    assert!(!broken.first.is_set());
}

#[test]
fn unload_deactivates_and_resets() {
    let mut world = World::new();
    world.finish();

    let window = Arc::new(Window::default());
    world.activate(&window).unwrap();
    world.activate(&Arc::new(Forecast("snow"))).unwrap();
    world.activate(&Arc::new(Cloud)).unwrap();
    let clouds = window.clouds.get().unwrap();
    assert_eq!(clouds.len(), 1);

    world.unload();

    assert_eq!(world.live_count(), 0);
    assert_eq!(window.disabled.load(Ordering::SeqCst), 1);
    assert!(clouds.is_empty());
    assert_eq!(world.injector().stats(), InjectorStats::default());
}

#[test]
fn singleton_status_is_reported() {
    let world = World::new();
    world.activate(&Arc::new(Forecast("hail"))).unwrap();

    let statuses = world.injector().singletons();
    assert!(
        statuses
            .iter()
            .any(|s| s.key == TypeKey::of::<dyn Weather>() && s.status == "forecasting hail")
    );
}

#[test]
fn notify_changed_rebuilds_in_inspection_mode() {
    let world = World::new();
    world.injector().set_mode(Mode::Inspecting);
    let clouds = world.injector().collection::<Cloud>();

    let cloud = Arc::new(Cloud);
    world.activate(&cloud).unwrap();
    // Simulate an out-of-band edit that emptied the list.
    world.injector().remove(&cloud);
    assert!(clouds.is_empty());

    assert_eq!(world.notify_changed(), 1);
    assert!(clouds.contains(&cloud));
}
