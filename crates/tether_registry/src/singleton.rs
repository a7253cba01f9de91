//! Capability key → registered singleton instances.

use crate::component::Component;
use crate::key::{InstanceId, TypeKey};
use crate::retired::Retired;
use core::any::Any;
use hashbrown::HashMap;
use std::sync::Arc;

/// One instance published under one key.
#[derive(Clone)]
pub(crate) struct Published {
    pub(crate) instance: InstanceId,
    pub(crate) component: Arc<dyn Component>,
    /// Holds an `Arc<R>` for the key's type `R`.
    pub(crate) value: Arc<dyn Any + Send + Sync>,
}

/// What withdrawing an instance did to its key.
pub(crate) enum Withdrawal {
    /// The instance was not registered under the key.
    Unknown,
    /// The instance was registered but another one was resolved; nothing
    /// observable changed.
    Shadowed,
    /// The resolved instance was removed and an older one took over.
    Fallback(Published),
    /// The resolved instance was removed and no instance remains.
    Emptied,
}

/// Per key, every registered instance in registration order. The last one
/// is the resolved singleton.
#[derive(Default)]
pub(crate) struct SingletonRegistry {
    entries: HashMap<TypeKey, Vec<Published>>,
}

impl SingletonRegistry {
    /// Makes `published` the resolved instance for `key`.
    ///
    /// Registering an instance that is already present moves it to the top.
    pub(crate) fn publish(&mut self, key: TypeKey, published: Published, retired: &mut Retired) {
        let stack = self.entries.entry(key).or_default();
        if let Some(position) = stack
            .iter()
            .position(|entry| entry.instance == published.instance)
        {
            retired.push(stack.remove(position));
        }
        stack.push(published);
    }

    /// Removes `instance` from `key`. The removed entry goes to `retired`.
    pub(crate) fn withdraw(
        &mut self,
        key: TypeKey,
        instance: InstanceId,
        retired: &mut Retired,
    ) -> Withdrawal {
        let Some(stack) = self.entries.get_mut(&key) else {
            return Withdrawal::Unknown;
        };
        let Some(position) = stack.iter().position(|entry| entry.instance == instance) else {
            return Withdrawal::Unknown;
        };

        let was_resolved = position + 1 == stack.len();
        retired.push(stack.remove(position));

        if !was_resolved {
            return Withdrawal::Shadowed;
        }
        match stack.last() {
            Some(next) => Withdrawal::Fallback(next.clone()),
            None => {
                self.entries.remove(&key);
                Withdrawal::Emptied
            }
        }
    }

    /// Returns the resolved instance for `key`.
    pub(crate) fn resolve(&self, key: TypeKey) -> Option<&Published> {
        self.entries.get(&key).and_then(|stack| stack.last())
    }

    /// Iterates over every key and its resolved instance.
    pub(crate) fn resolved(&self) -> impl Iterator<Item = (TypeKey, &Published)> {
        self.entries
            .iter()
            .filter_map(|(key, stack)| stack.last().map(|entry| (*key, entry)))
    }

    /// Returns the number of keys with a resolved instance.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
