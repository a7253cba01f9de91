//! Capability key → consumers waiting for it.

use crate::component::Component;
use crate::key::{InstanceId, TypeKey};
use crate::retired::Retired;
use crate::slot::{Access, SlotDescriptor, SlotId};
use core::any::Any;
use hashbrown::HashMap;
use indexmap::IndexMap;
use std::sync::{Arc, Weak};

/// A (slot, consumer) pair. The consumer is held weakly.
pub(crate) struct Target {
    slot: SlotDescriptor,
    consumer: Weak<dyn Component>,
}

type TargetList = IndexMap<(SlotId, InstanceId), Target>;

/// Per key, the ordered (slot, consumer) pairs to update when the key's
/// singleton changes.
#[derive(Default)]
pub(crate) struct TargetRegistry {
    lists: HashMap<TypeKey, TargetList>,
}

impl TargetRegistry {
    /// Appends (slot, consumer) to the slot's list unless already present.
    pub(crate) fn ensure(&mut self, slot: &SlotDescriptor, consumer: &Arc<dyn Component>) -> bool {
        let pair = (slot.id(), InstanceId::of(consumer));
        let list = self.lists.entry(slot.key()).or_default();
        if list.contains_key(&pair) {
            return false;
        }
        list.insert(
            pair,
            Target {
                slot: slot.clone(),
                consumer: Arc::downgrade(consumer),
            },
        );
        true
    }

    /// Removes every pair of `consumer` for the given slots.
    pub(crate) fn eject(&mut self, slots: &[SlotDescriptor], consumer: InstanceId) -> usize {
        let mut removed = 0;
        for slot in slots {
            if let Some(list) = self.lists.get_mut(&slot.key())
                && list.shift_remove(&(slot.id(), consumer)).is_some()
            {
                removed += 1;
            }
        }
        removed
    }

    /// Sets every waiting singleton slot for `key` to `value` (an `Arc<R>`).
    ///
    /// Pairs whose consumer has been dropped are pruned. Displaced slot
    /// values go to `retired`.
    pub(crate) fn assign(
        &mut self,
        key: TypeKey,
        value: &(dyn Any + Send + Sync),
        retired: &mut Retired,
    ) -> usize {
        self.for_each_live(key, retired, |slot, consumer, retired| match slot.access() {
            Access::Singleton(access) => access.assign(consumer, value, retired),
            Access::Collection { .. } => false,
        })
    }

    /// Clears every waiting singleton slot for `key`.
    pub(crate) fn clear_slots(&mut self, key: TypeKey, retired: &mut Retired) -> usize {
        self.for_each_live(key, retired, |slot, consumer, retired| match slot.access() {
            Access::Singleton(access) => access.clear(consumer, retired),
            Access::Collection { .. } => false,
        })
    }

    /// Clears every waiting singleton slot of every key.
    pub(crate) fn clear_all_slots(&mut self, retired: &mut Retired) -> usize {
        let keys: Vec<TypeKey> = self.lists.keys().copied().collect();
        keys.into_iter()
            .map(|key| self.clear_slots(key, retired))
            .sum()
    }

    /// Runs `apply` on every live (slot, consumer) pair of `key`. Upgraded
    /// consumers are kept in `retired`.
    fn for_each_live(
        &mut self,
        key: TypeKey,
        retired: &mut Retired,
        mut apply: impl FnMut(&SlotDescriptor, &dyn Component, &mut Retired) -> bool,
    ) -> usize {
        let Some(list) = self.lists.get_mut(&key) else {
            return 0;
        };

        let mut touched = 0;
        list.retain(|_, target| match target.consumer.upgrade() {
            Some(consumer) => {
                if apply(&target.slot, &*consumer, retired) {
                    touched += 1;
                }
                retired.keep(consumer);
                true
            }
            None => {
                tracing::trace!(
                    slot = target.slot.name(),
                    "pruned target of a dropped consumer"
                );
                false
            }
        });
        touched
    }

    /// Returns the number of pairs across all keys.
    pub(crate) fn len(&self) -> usize {
        self.lists.values().map(IndexMap::len).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.lists.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Consumer;
    use crate::slot::{Inject, Slots};

    struct Light;
    impl Component for Light {}

    #[derive(Default)]
    struct Lamp {
        light: Inject<Light>,
    }

    impl Component for Lamp {}

    impl Consumer for Lamp {
        fn declare_slots(slots: &mut Slots<Self>) {
            slots.singleton("light", |lamp| &lamp.light);
        }
    }

    fn lamp_slots() -> Arc<[SlotDescriptor]> {
        let mut slots = Slots::<Lamp>::new();
        Lamp::declare_slots(&mut slots);
        slots.finish().unwrap()
    }

    #[test]
    fn ensure_is_idempotent() {
        let slots = lamp_slots();
        let lamp: Arc<dyn Component> = Arc::new(Lamp::default());
        let mut targets = TargetRegistry::default();

        assert!(targets.ensure(&slots[0], &lamp));
        assert!(!targets.ensure(&slots[0], &lamp));
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn assign_and_clear_reach_waiters() {
        let slots = lamp_slots();
        let lamp = Arc::new(Lamp::default());
        let erased: Arc<dyn Component> = lamp.clone();
        let mut targets = TargetRegistry::default();
        targets.ensure(&slots[0], &erased);

        let mut retired = Retired::default();
        let light = Arc::new(Light);
        assert_eq!(targets.assign(TypeKey::of::<Light>(), &light, &mut retired), 1);
        assert!(lamp.light.holds(&light));

        assert_eq!(targets.clear_slots(TypeKey::of::<Light>(), &mut retired), 1);
        assert!(!lamp.light.is_set());
    }

    #[test]
    fn eject_removes_pairs() {
        let slots = lamp_slots();
        let lamp: Arc<dyn Component> = Arc::new(Lamp::default());
        let mut targets = TargetRegistry::default();
        targets.ensure(&slots[0], &lamp);

        assert_eq!(targets.eject(&slots, InstanceId::of(&lamp)), 1);
        assert_eq!(targets.eject(&slots, InstanceId::of(&lamp)), 0);
        assert_eq!(targets.len(), 0);
    }

    #[test]
    fn dropped_consumers_are_pruned() {
        let slots = lamp_slots();
        let mut targets = TargetRegistry::default();
        {
            let lamp: Arc<dyn Component> = Arc::new(Lamp::default());
            targets.ensure(&slots[0], &lamp);
        }

        let mut retired = Retired::default();
        assert_eq!(
            targets.assign(TypeKey::of::<Light>(), &Arc::new(Light), &mut retired),
            0
        );
        assert_eq!(retired.len(), 0);
        assert_eq!(targets.len(), 0);
    }
}
