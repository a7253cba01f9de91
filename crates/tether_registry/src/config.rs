//! Injector configuration.

/// Execution mode of the host.
///
/// Inspection-only fallbacks (the singleton scan and collection rebuilds)
/// run only in [`Mode::Inspecting`], and only when the `tooling` feature is
/// compiled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Normal execution stepping. Registration calls are authoritative.
    #[default]
    Stepping,
    /// Non-stepping inspection (editor-like). Components may appear or vanish
    /// outside the activation calls.
    Inspecting,
}

/// Configuration of an [`Injector`](crate::injector::Injector).
///
/// # Example
///
/// ```
/// use tether_registry::{InjectorConfig, Mode};
///
/// let config = InjectorConfig::default().with_mode(Mode::Inspecting);
/// assert!(config.is_inspecting());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectorConfig {
    /// The host's current execution mode.
    pub mode: Mode,
}

impl InjectorConfig {
    /// Creates the default configuration (stepping mode).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns true if inspection fallbacks may run.
    #[must_use]
    pub fn is_inspecting(&self) -> bool {
        cfg!(feature = "tooling") && self.mode == Mode::Inspecting
    }
}
