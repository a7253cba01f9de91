//! Per-type cache of slot descriptors.

use crate::component::Consumer;
use crate::error::InjectError;
use crate::slot::{SlotDescriptor, Slots};
use core::any::TypeId;
use hashbrown::HashMap;
use std::sync::Arc;

/// Consumer type → its declared slots, computed once per type.
#[derive(Default)]
pub(crate) struct SlotCache {
    by_type: HashMap<TypeId, Arc<[SlotDescriptor]>>,
}

impl SlotCache {
    /// Returns the slots of `C`, declaring and caching them on first use.
    ///
    /// A failed declaration is not cached, so every later call reports the
    /// same error.
    pub(crate) fn slots_for<C: Consumer>(&mut self) -> Result<Arc<[SlotDescriptor]>, InjectError> {
        let type_id = TypeId::of::<C>();
        if let Some(slots) = self.by_type.get(&type_id) {
            return Ok(Arc::clone(slots));
        }

        let mut slots = Slots::<C>::new();
        C::declare_slots(&mut slots);
        let slots = slots.finish()?;

        tracing::debug!(
            consumer = core::any::type_name::<C>(),
            slots = slots.len(),
            "cached slot descriptors"
        );
        self.by_type.insert(type_id, Arc::clone(&slots));
        Ok(slots)
    }

    /// Returns the cached slots of a type without declaring them.
    pub(crate) fn cached(&self, type_id: TypeId) -> Option<Arc<[SlotDescriptor]>> {
        self.by_type.get(&type_id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_type.len()
    }

    pub(crate) fn clear(&mut self) {
        self.by_type.clear();
    }
}
