//! Stable identifiers for capability keys and instances.

use core::any::TypeId;
use std::sync::{Arc, Weak};

// ─────────────────────────────────────────────────────────────────────────────
// TypeKey
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier for a capability key, slot type, or collection element type.
///
/// Based on [`TypeId`], so every Rust type (including trait objects such as
/// `dyn AudioService`) has exactly one `TypeKey`. The type name is kept for
/// diagnostics only.
///
/// # Example
///
/// ```
/// use tether_registry::TypeKey;
///
/// trait AudioService: Send + Sync {}
///
/// let role = TypeKey::of::<dyn AudioService>();
/// assert!(role.type_name().contains("AudioService"));
/// assert_ne!(role, TypeKey::of::<u32>());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Creates a `TypeKey` for the given type.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl core::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.type_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InstanceId
// ─────────────────────────────────────────────────────────────────────────────

/// Reference identity of a shared instance.
///
/// Two `Arc`s have the same `InstanceId` exactly when they point at the same
/// allocation, regardless of whether one of them has been unsized to a trait
/// object. Identity is only meaningful while the allocation is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Returns the identity of the allocation behind `arc`.
    #[must_use]
    pub fn of<T: ?Sized>(arc: &Arc<T>) -> Self {
        Self(Arc::as_ptr(arc).cast::<()>().addr())
    }

    /// Returns the identity of the allocation behind `weak`.
    #[must_use]
    pub fn of_weak<T: ?Sized>(weak: &Weak<T>) -> Self {
        Self(Weak::as_ptr(weak).cast::<()>().addr())
    }
}
