//! Registry errors.

/// Errors surfaced while discovering a consumer's slots.
///
/// Registry operations themselves are total: missing singletons resolve to
/// `None` and deactivating untracked instances is a no-op. The only failure
/// mode is a malformed slot declaration, reported the first time the
/// consumer type is prepared or injected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    /// Two slots on the same consumer type share a name.
    #[error("slot `{slot}` is declared more than once on {consumer}")]
    DuplicateSlot {
        /// The consumer type.
        consumer: &'static str,
        /// The repeated slot name.
        slot: &'static str,
    },

    /// A slot was declared with an empty name.
    #[error("{consumer} declares a slot with an empty name")]
    EmptySlotName {
        /// The consumer type.
        consumer: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_consumer_and_slot() {
        let err = InjectError::DuplicateSlot {
            consumer: "game::Hud",
            slot: "radar",
        };
        assert_eq!(
            err.to_string(),
            "slot `radar` is declared more than once on game::Hud"
        );
    }
}
