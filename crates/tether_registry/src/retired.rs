//! Values displaced while the registry lock is held.

use crate::component::Component;
use core::any::Any;
use std::sync::Arc;

/// Instances removed from the registries or from slots, kept alive until the
/// caller has released the registry lock.
///
/// Dropping the last `Arc` of a component runs its `Drop`, which may call
/// back into the injector.
#[derive(Default)]
pub(crate) struct Retired {
    values: Vec<Box<dyn Any + Send + Sync>>,
    components: Vec<Arc<dyn Component>>,
}

impl Retired {
    /// Keeps `value` until this holder is dropped.
    pub(crate) fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    /// Keeps an upgraded consumer until this holder is dropped.
    pub(crate) fn keep(&mut self, component: Arc<dyn Component>) {
        self.components.push(component);
    }

    /// Returns the number of held values and components.
    pub(crate) fn len(&self) -> usize {
        self.values.len() + self.components.len()
    }
}
