//! Tests for the core plugins wired into a world.

use std::sync::Arc;
use tether_core_plugins::{InjectorPlugin, MinimalPlugins};
use tether_registry::prelude::*;
use tether_world::prelude::*;

trait Pickup: Send + Sync {
    fn value(&self) -> u32;
}

struct Gem(u32);

impl Pickup for Gem {
    fn value(&self) -> u32 {
        self.0
    }
}

impl Component for Gem {
    fn is_collection_item(&self) -> bool {
        true
    }

    fn roles(self: Arc<Self>, roles: Roles) -> Roles {
        roles.with::<dyn Pickup>(self)
    }
}

#[derive(Default, Consumer)]
struct Inventory {
    #[inject]
    pickups: Collect<dyn Pickup>,
}

impl Component for Inventory {
    fn on_enable(self: Arc<Self>, injector: &Injector) -> Result<(), InjectError> {
        injector.inject(&self)
    }

    fn on_disable(self: Arc<Self>, injector: &Injector) {
        injector.eject(&self);
    }
}

impl Inventory {
    fn total(&self) -> u32 {
        self.pickups.to_vec().iter().map(|p| p.value()).sum()
    }
}

#[test]
fn declared_alias_shares_the_element_collection() {
    let mut world = World::new();
    world.add_plugins(
        MinimalPlugins
            .build()
            .disable::<InjectorPlugin>()
            .add(InjectorPlugin::new().with_alias::<dyn Pickup, Gem>()),
    );
    world.finish();

    let inventory = Arc::new(Inventory::default());
    world.activate(&inventory).unwrap();

    let ruby = Arc::new(Gem(5));
    let emerald = Arc::new(Gem(7));
    world.activate(&ruby).unwrap();
    world.activate(&emerald).unwrap();

    let gems = world.injector().collection::<Gem>();
    assert!(inventory.pickups.get().unwrap().shares_backing(&gems));
    assert_eq!(gems.len(), 2);
    assert_eq!(inventory.total(), 12);

    world.deactivate(&ruby);
    assert_eq!(inventory.total(), 7);
}

#[test]
fn inspecting_mode_is_applied_before_components_activate() {
    let mut world = World::new();
    world.add_plugins(InjectorPlugin::inspecting());
    world.finish();

    assert_eq!(world.injector().mode(), Mode::Inspecting);
    assert_eq!(
        world.setting::<InjectorConfig>().map(|c| c.mode),
        Some(Mode::Inspecting)
    );
}

#[test]
fn unload_resets_the_injector() {
    let mut world = World::new();
    world.add_plugins(
        MinimalPlugins
            .build()
            .disable::<InjectorPlugin>()
            .add(InjectorPlugin::new().with_alias::<dyn Pickup, Gem>()),
    );
    world.finish();

    let inventory = Arc::new(Inventory::default());
    let gem = Arc::new(Gem(3));
    world.activate(&inventory).unwrap();
    world.activate(&gem).unwrap();
    assert_eq!(inventory.total(), 3);

    world.unload();

    assert_eq!(world.live_count(), 0);
    assert!(inventory.pickups.is_empty());
    let stats = world.injector().stats();
    assert_eq!(stats.singletons, 0);
    assert_eq!(stats.collection_items, 0);
}
